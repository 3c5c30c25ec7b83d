//! Binary audio asset: raw PCM frames, no codec decode (spec §1: "Audio file
//! decoding (mp3/ogg/wav) is excluded except insofar as it produces PCM data
//! that the audio serializer packages"). This module is that packaging step;
//! the WAV-PCM importer in [`crate::importer`] is what produces the PCM
//! bytes in the first place.

use crate::binary::{read_u16, read_u32, BinaryHeader, HeaderError, HEADER_SIZE};
use super::AssetTypeTag;

/// Packaged PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub pcm: Vec<u8>,
}

const VERSION: u32 = 1;
/// `sample_rate, channels, bits_per_sample, pad` — 4 `u32` (the latter two
/// packed as `u16`s to keep the extension word-aligned).
const EXTENSION_SIZE: usize = 4 * 4;

/// Encode `audio` to its binary container form.
pub fn binary_serialize(audio: &Audio) -> Vec<u8> {
    let data_block_size = (EXTENSION_SIZE + audio.pcm.len()) as u32;
    let header = BinaryHeader::new(AssetTypeTag::Audio, VERSION, data_block_size);
    let mut out = Vec::with_capacity(HEADER_SIZE + data_block_size as usize);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&audio.sample_rate.to_le_bytes());
    out.extend_from_slice(&audio.channels.to_le_bytes());
    out.extend_from_slice(&audio.bits_per_sample.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]); // pad
    out.extend_from_slice(&audio.pcm);
    out
}

/// Error decoding an [`Audio`] asset from its binary form.
#[derive(Debug, thiserror::Error)]
pub enum AudioDeserializeError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("binary audio is shorter than its extension header")]
    Truncated,
}

/// Decode a binary audio container.
pub fn binary_deserialize(bytes: &[u8]) -> Result<Audio, AudioDeserializeError> {
    let header = BinaryHeader::read(bytes, AssetTypeTag::Audio)?;
    let data = header.data(bytes);
    if data.len() < EXTENSION_SIZE {
        return Err(AudioDeserializeError::Truncated);
    }
    let mut pos = 0;
    let sample_rate = read_u32(data, &mut pos).map_err(|_| AudioDeserializeError::Truncated)?;
    let channels = read_u16(data, &mut pos).map_err(|_| AudioDeserializeError::Truncated)?;
    let bits_per_sample =
        read_u16(data, &mut pos).map_err(|_| AudioDeserializeError::Truncated)?;
    pos += 8; // pad
    let pcm = data[pos..].to_vec();
    Ok(Audio {
        sample_rate,
        channels,
        bits_per_sample,
        pcm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let audio = Audio {
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: 16,
            pcm: vec![0x11, 0x22, 0x33, 0x44],
        };
        let bytes = binary_serialize(&audio);
        let decoded = binary_deserialize(&bytes).unwrap();
        assert_eq!(decoded, audio);
    }
}
