//! The 16-byte binary asset container header (spec §3, §6).
//!
//! Every binary asset file starts with `{magic, type, version,
//! data_block_size}`, little-endian, followed by a per-type payload. The
//! header is validated on read: magic and type must match, and
//! `data_block_size + HEADER_SIZE` must equal the file size.

use std::convert::TryInto;

use crate::asset::AssetTypeTag;

/// Fixed magic value every binary asset file starts with.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Size in bytes of the fixed header.
pub const HEADER_SIZE: usize = 16;

/// The fixed 16-byte prefix of every binary asset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    /// Must equal [`MAGIC`].
    pub magic: u32,
    /// The asset's type tag.
    pub asset_type: AssetTypeTag,
    /// Per-type format version.
    pub version: u32,
    /// Number of bytes following the header.
    pub data_block_size: u32,
}

/// Error reading or validating a [`BinaryHeader`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum HeaderError {
    /// Fewer than [`HEADER_SIZE`] bytes were available.
    #[error("binary asset is truncated: expected at least {HEADER_SIZE} bytes, got {0}")]
    Truncated(usize),
    /// `magic` didn't match [`MAGIC`].
    #[error("bad magic: expected {MAGIC:#x}, got {0:#x}")]
    BadMagic(u32),
    /// The header's type tag didn't match the type the caller expected.
    #[error("type mismatch: expected {expected:?}, got tag {got}")]
    TypeMismatch {
        /// The type the caller expected.
        expected: AssetTypeTag,
        /// The raw tag value actually present.
        got: u32,
    },
    /// `data_block_size + HEADER_SIZE` didn't equal the total buffer length.
    #[error("size mismatch: header declares {declared} data bytes but {actual} bytes followed")]
    SizeMismatch {
        /// Bytes the header claims follow it.
        declared: u32,
        /// Bytes actually present after the header.
        actual: usize,
    },
}

impl BinaryHeader {
    /// Build a header for `asset_type`/`version`, given the payload that
    /// will follow it.
    pub fn new(asset_type: AssetTypeTag, version: u32, data_block_size: u32) -> Self {
        BinaryHeader {
            magic: MAGIC,
            asset_type,
            version,
            data_block_size,
        }
    }

    /// Serialize the header to its 16-byte little-endian form.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..8].copy_from_slice(&(self.asset_type as u32).to_le_bytes());
        out[8..12].copy_from_slice(&self.version.to_le_bytes());
        out[12..16].copy_from_slice(&self.data_block_size.to_le_bytes());
        out
    }

    /// Parse and validate the header prefix of `bytes`, checking that its
    /// declared type matches `expected` and that the declared
    /// `data_block_size` accounts for every remaining byte.
    pub fn read(bytes: &[u8], expected: AssetTypeTag) -> Result<Self, HeaderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::Truncated(bytes.len()));
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(HeaderError::BadMagic(magic));
        }
        let raw_type = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if raw_type != expected as u32 {
            return Err(HeaderError::TypeMismatch {
                expected,
                got: raw_type,
            });
        }
        let version = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let data_block_size = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let actual = bytes.len() - HEADER_SIZE;
        if data_block_size as usize != actual {
            return Err(HeaderError::SizeMismatch {
                declared: data_block_size,
                actual,
            });
        }
        Ok(BinaryHeader {
            magic,
            asset_type: expected,
            version,
            data_block_size,
        })
    }

    /// The data block following this header.
    pub fn data<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[HEADER_SIZE..]
    }
}

/// Write a `u32` length-prefixed byte string, the layout used throughout the
/// static mesh and bitmap font serializers (spec §4.4): a `u32` length
/// followed by that many raw bytes, no NUL terminator.
pub fn write_len_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Read a `u32` length-prefixed byte string written by [`write_len_str`].
/// A length of `0` is valid and means "absent" (empty string).
pub fn read_len_str(bytes: &[u8], pos: &mut usize) -> anyhow::Result<String> {
    let len = read_u32(bytes, pos)? as usize;
    anyhow::ensure!(
        bytes.len() >= *pos + len,
        "length-prefixed string overruns buffer"
    );
    let s = std::str::from_utf8(&bytes[*pos..*pos + len])?.to_owned();
    *pos += len;
    Ok(s)
}

/// Read a little-endian `u32` at `*pos`, advancing it by 4.
pub fn read_u32(bytes: &[u8], pos: &mut usize) -> anyhow::Result<u32> {
    anyhow::ensure!(bytes.len() >= *pos + 4, "buffer too short to read u32");
    let v = u32::from_le_bytes(bytes[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    Ok(v)
}

/// Read a little-endian `f32` at `*pos`, advancing it by 4.
pub fn read_f32(bytes: &[u8], pos: &mut usize) -> anyhow::Result<f32> {
    Ok(f32::from_bits(read_u32(bytes, pos)?))
}

/// Read a little-endian `u16` at `*pos`, advancing it by 2.
pub fn read_u16(bytes: &[u8], pos: &mut usize) -> anyhow::Result<u16> {
    anyhow::ensure!(bytes.len() >= *pos + 2, "buffer too short to read u16");
    let v = u16::from_le_bytes(bytes[*pos..*pos + 2].try_into().unwrap());
    *pos += 2;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = BinaryHeader::new(AssetTypeTag::Image, 1, 32);
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend(std::iter::repeat(0xABu8).take(32));
        let parsed = BinaryHeader::read(&bytes, AssetTypeTag::Image).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn size_mismatch_is_fatal() {
        let header = BinaryHeader::new(AssetTypeTag::Image, 1, 32);
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend(std::iter::repeat(0xABu8).take(16)); // short by 16 bytes
        assert!(matches!(
            BinaryHeader::read(&bytes, AssetTypeTag::Image),
            Err(HeaderError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn type_mismatch_is_fatal() {
        let header = BinaryHeader::new(AssetTypeTag::Image, 1, 0);
        let bytes = header.to_bytes();
        assert!(matches!(
            BinaryHeader::read(&bytes, AssetTypeTag::StaticMesh),
            Err(HeaderError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn len_str_roundtrip_including_empty() {
        let mut buf = Vec::new();
        write_len_str(&mut buf, "cube");
        write_len_str(&mut buf, "");
        let mut pos = 0;
        assert_eq!(read_len_str(&buf, &mut pos).unwrap(), "cube");
        assert_eq!(read_len_str(&buf, &mut pos).unwrap(), "");
        assert_eq!(pos, buf.len());
    }
}
