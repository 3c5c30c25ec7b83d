//! Binary image asset (spec §4.4 "Image (binary)", §8 Scenario 2).

use crate::binary::{read_u32, BinaryHeader, HeaderError, HEADER_SIZE};
use super::AssetTypeTag;

/// Pixel layout. `channel_count` is derived from this on deserialize, never
/// stored explicitly (spec: "Deserialize derives `channel_count` from
/// `format`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ImageFormat {
    R8 = 1,
    Rg8 = 2,
    Rgb8 = 3,
    Rgba8 = 4,
}

impl ImageFormat {
    fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => ImageFormat::R8,
            2 => ImageFormat::Rg8,
            3 => ImageFormat::Rgb8,
            4 => ImageFormat::Rgba8,
            _ => return None,
        })
    }

    /// Bytes per pixel, also the channel count for these 8-bits-per-channel
    /// formats.
    pub fn channel_count(self) -> u32 {
        match self {
            ImageFormat::R8 => 1,
            ImageFormat::Rg8 => 2,
            ImageFormat::Rgb8 => 3,
            ImageFormat::Rgba8 => 4,
        }
    }
}

/// An in-memory image asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub pixels: Vec<u8>,
}

const VERSION: u32 = 1;
/// `format, width, height, mip_levels` (4 `u32`) + `pad[3]` (3 `u32`).
const EXTENSION_SIZE: usize = 4 * 4 + 3 * 4;

/// Encode `image` to its binary container form.
pub fn binary_serialize(image: &Image) -> Vec<u8> {
    let data_block_size = (EXTENSION_SIZE + image.pixels.len()) as u32;
    let header = BinaryHeader::new(AssetTypeTag::Image, VERSION, data_block_size);
    let mut out = Vec::with_capacity(HEADER_SIZE + data_block_size as usize);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&(image.format as u32).to_le_bytes());
    out.extend_from_slice(&image.width.to_le_bytes());
    out.extend_from_slice(&image.height.to_le_bytes());
    out.extend_from_slice(&image.mip_levels.to_le_bytes());
    out.extend_from_slice(&[0u8; 12]); // pad[3]
    out.extend_from_slice(&image.pixels);
    out
}

/// Error decoding an [`Image`] from its binary form.
#[derive(Debug, thiserror::Error)]
pub enum ImageDeserializeError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("unknown image format tag {0}")]
    UnknownFormat(u32),
    #[error("binary image is shorter than its extension header")]
    Truncated,
}

/// Decode a binary image container.
pub fn binary_deserialize(bytes: &[u8]) -> Result<Image, ImageDeserializeError> {
    let header = BinaryHeader::read(bytes, AssetTypeTag::Image)?;
    let data = header.data(bytes);
    if data.len() < EXTENSION_SIZE {
        return Err(ImageDeserializeError::Truncated);
    }
    let mut pos = 0;
    let format_raw = read_u32(data, &mut pos).map_err(|_| ImageDeserializeError::Truncated)?;
    let format =
        ImageFormat::from_u32(format_raw).ok_or(ImageDeserializeError::UnknownFormat(format_raw))?;
    let width = read_u32(data, &mut pos).map_err(|_| ImageDeserializeError::Truncated)?;
    let height = read_u32(data, &mut pos).map_err(|_| ImageDeserializeError::Truncated)?;
    let mip_levels = read_u32(data, &mut pos).map_err(|_| ImageDeserializeError::Truncated)?;
    pos += 12; // pad[3]
    let pixels = data[pos..].to_vec();
    Ok(Image {
        format,
        width,
        height,
        mip_levels,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_2_binary_round_trip() {
        let image = Image {
            format: ImageFormat::Rgba8,
            width: 4,
            height: 2,
            mip_levels: 1,
            pixels: vec![0xAB; 32],
        };
        let bytes = binary_serialize(&image);
        assert_eq!(bytes.len(), HEADER_SIZE + EXTENSION_SIZE + 32);

        let decoded = binary_deserialize(&bytes).unwrap();
        assert_eq!(decoded, image);
        assert_eq!(decoded.format.channel_count(), 4);
    }

    #[test]
    fn rejects_wrong_magic_or_type() {
        let image = Image {
            format: ImageFormat::R8,
            width: 1,
            height: 1,
            mip_levels: 1,
            pixels: vec![1],
        };
        let mut bytes = binary_serialize(&image);
        bytes[0] = 0; // corrupt magic
        assert!(binary_deserialize(&bytes).is_err());
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let image = Image {
            format: ImageFormat::R8,
            width: 1,
            height: 1,
            mip_levels: 1,
            pixels: vec![1],
        };
        let mut bytes = binary_serialize(&image);
        bytes.pop();
        assert!(binary_deserialize(&bytes).is_err());
    }
}
