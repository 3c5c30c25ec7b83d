//! Binary bitmap font asset (spec §4.4 "Bitmap font (binary)").

use crate::binary::{read_f32, read_len_str, read_u32, write_len_str, BinaryHeader, HeaderError, HEADER_SIZE};
use super::AssetTypeTag;

/// One glyph's metrics within the atlas. Not enumerated field-by-field by
/// spec §4.4 beyond "glyphs raw"; laid out as the conventional bitmap-font
/// glyph record (atlas rect + advance + owning page).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub codepoint: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xoffset: f32,
    pub yoffset: f32,
    pub xadvance: f32,
    pub page: u32,
}

const GLYPH_SIZE: usize = 9 * 4;

fn write_glyph(out: &mut Vec<u8>, g: &Glyph) {
    out.extend_from_slice(&g.codepoint.to_le_bytes());
    out.extend_from_slice(&g.x.to_le_bytes());
    out.extend_from_slice(&g.y.to_le_bytes());
    out.extend_from_slice(&g.width.to_le_bytes());
    out.extend_from_slice(&g.height.to_le_bytes());
    out.extend_from_slice(&g.xoffset.to_le_bytes());
    out.extend_from_slice(&g.yoffset.to_le_bytes());
    out.extend_from_slice(&g.xadvance.to_le_bytes());
    out.extend_from_slice(&g.page.to_le_bytes());
}

fn read_glyph(bytes: &[u8], pos: &mut usize) -> anyhow::Result<Glyph> {
    Ok(Glyph {
        codepoint: read_u32(bytes, pos)?,
        x: read_u32(bytes, pos)?,
        y: read_u32(bytes, pos)?,
        width: read_u32(bytes, pos)?,
        height: read_u32(bytes, pos)?,
        xoffset: read_f32(bytes, pos)?,
        yoffset: read_f32(bytes, pos)?,
        xadvance: read_f32(bytes, pos)?,
        page: read_u32(bytes, pos)?,
    })
}

/// A kerning adjustment between a pair of codepoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kerning {
    pub first: u32,
    pub second: u32,
    pub amount: f32,
}

const KERNING_SIZE: usize = 3 * 4;

fn write_kerning(out: &mut Vec<u8>, k: &Kerning) {
    out.extend_from_slice(&k.first.to_le_bytes());
    out.extend_from_slice(&k.second.to_le_bytes());
    out.extend_from_slice(&k.amount.to_le_bytes());
}

fn read_kerning(bytes: &[u8], pos: &mut usize) -> anyhow::Result<Kerning> {
    Ok(Kerning {
        first: read_u32(bytes, pos)?,
        second: read_u32(bytes, pos)?,
        amount: read_f32(bytes, pos)?,
    })
}

/// A bitmap font asset: glyph atlas metrics, glyphs, kernings, and the
/// texture pages the glyphs' `page` index refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFont {
    pub font_size: u32,
    pub line_height: u32,
    pub baseline: u32,
    pub atlas_w: u32,
    pub atlas_h: u32,
    pub face_name: String,
    pub glyphs: Vec<Glyph>,
    pub kernings: Vec<Kerning>,
    /// Page names; deserialize assigns ids `0..page_count` positionally
    /// (spec: "Deserialize assigns page ids 0..page_count-1 positionally").
    pub pages: Vec<String>,
}

const VERSION: u32 = 1;
/// `font_size, line_height, baseline, atlas_w, atlas_h, glyph_count,
/// kerning_count, page_count, face_name_len` — 9 `u32`.
const EXTENSION_FIXED_SIZE: usize = 9 * 4;

/// Encode `font` to its binary container form.
pub fn binary_serialize(font: &BitmapFont) -> Vec<u8> {
    let pages_size: usize = font.pages.iter().map(|p| 4 + p.len()).sum();
    let data_block_size = (EXTENSION_FIXED_SIZE
        + font.face_name.len()
        + font.glyphs.len() * GLYPH_SIZE
        + font.kernings.len() * KERNING_SIZE
        + pages_size) as u32;

    let header = BinaryHeader::new(AssetTypeTag::BitmapFont, VERSION, data_block_size);
    let mut out = Vec::with_capacity(HEADER_SIZE + data_block_size as usize);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&font.font_size.to_le_bytes());
    out.extend_from_slice(&font.line_height.to_le_bytes());
    out.extend_from_slice(&font.baseline.to_le_bytes());
    out.extend_from_slice(&font.atlas_w.to_le_bytes());
    out.extend_from_slice(&font.atlas_h.to_le_bytes());
    out.extend_from_slice(&(font.glyphs.len() as u32).to_le_bytes());
    out.extend_from_slice(&(font.kernings.len() as u32).to_le_bytes());
    out.extend_from_slice(&(font.pages.len() as u32).to_le_bytes());
    out.extend_from_slice(&(font.face_name.len() as u32).to_le_bytes());
    out.extend_from_slice(font.face_name.as_bytes());
    for g in &font.glyphs {
        write_glyph(&mut out, g);
    }
    for k in &font.kernings {
        write_kerning(&mut out, k);
    }
    for p in &font.pages {
        write_len_str(&mut out, p);
    }
    out
}

/// Error decoding a [`BitmapFont`] from its binary form.
#[derive(Debug, thiserror::Error)]
pub enum BitmapFontDeserializeError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("bitmap font has no glyphs")]
    NoGlyphs,
    #[error("bitmap font has no pages")]
    NoPages,
    #[error("malformed bitmap font payload: {0}")]
    Malformed(#[from] anyhow::Error),
}

/// Decode a binary bitmap font container.
pub fn binary_deserialize(bytes: &[u8]) -> Result<BitmapFont, BitmapFontDeserializeError> {
    let header = BinaryHeader::read(bytes, AssetTypeTag::BitmapFont)?;
    let data = header.data(bytes);
    let mut pos = 0;
    let font_size = read_u32(data, &mut pos)?;
    let line_height = read_u32(data, &mut pos)?;
    let baseline = read_u32(data, &mut pos)?;
    let atlas_w = read_u32(data, &mut pos)?;
    let atlas_h = read_u32(data, &mut pos)?;
    let glyph_count = read_u32(data, &mut pos)? as usize;
    let kerning_count = read_u32(data, &mut pos)? as usize;
    let page_count = read_u32(data, &mut pos)? as usize;
    let face_name_len = read_u32(data, &mut pos)? as usize;

    anyhow::ensure!(data.len() >= pos + face_name_len, "face_name overruns buffer");
    let face_name = std::str::from_utf8(&data[pos..pos + face_name_len])?.to_owned();
    pos += face_name_len;

    let mut glyphs = Vec::with_capacity(glyph_count);
    for _ in 0..glyph_count {
        glyphs.push(read_glyph(data, &mut pos)?);
    }
    let mut kernings = Vec::with_capacity(kerning_count);
    for _ in 0..kerning_count {
        kernings.push(read_kerning(data, &mut pos)?);
    }
    let mut pages = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        pages.push(read_len_str(data, &mut pos)?);
    }

    if glyphs.is_empty() {
        return Err(BitmapFontDeserializeError::NoGlyphs);
    }
    if pages.is_empty() {
        return Err(BitmapFontDeserializeError::NoPages);
    }

    Ok(BitmapFont {
        font_size,
        line_height,
        baseline,
        atlas_w,
        atlas_h,
        face_name,
        glyphs,
        kernings,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BitmapFont {
        BitmapFont {
            font_size: 16,
            line_height: 18,
            baseline: 14,
            atlas_w: 256,
            atlas_h: 256,
            face_name: "Sans".into(),
            glyphs: vec![Glyph {
                codepoint: 'A' as u32,
                x: 0,
                y: 0,
                width: 10,
                height: 12,
                xoffset: 0.0,
                yoffset: 0.0,
                xadvance: 10.0,
                page: 0,
            }],
            kernings: vec![Kerning {
                first: 'A' as u32,
                second: 'V' as u32,
                amount: -1.5,
            }],
            pages: vec!["atlas0.png".into()],
        }
    }

    #[test]
    fn round_trips() {
        let font = sample();
        let bytes = binary_serialize(&font);
        let decoded = binary_deserialize(&bytes).unwrap();
        assert_eq!(decoded, font);
    }

    #[test]
    fn no_glyphs_is_a_fatal_error() {
        let mut font = sample();
        font.glyphs.clear();
        let bytes = binary_serialize(&font);
        assert!(matches!(
            binary_deserialize(&bytes),
            Err(BitmapFontDeserializeError::NoGlyphs)
        ));
    }

    #[test]
    fn no_pages_is_a_fatal_error() {
        let mut font = sample();
        font.pages.clear();
        let bytes = binary_serialize(&font);
        assert!(matches!(
            binary_deserialize(&bytes),
            Err(BitmapFontDeserializeError::NoPages)
        ));
    }

    #[test]
    fn page_ids_assigned_positionally() {
        let mut font = sample();
        font.pages.push("atlas1.png".into());
        let bytes = binary_serialize(&font);
        let decoded = binary_deserialize(&bytes).unwrap();
        assert_eq!(decoded.pages[0], "atlas0.png");
        assert_eq!(decoded.pages[1], "atlas1.png");
    }
}
