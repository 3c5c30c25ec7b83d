//! Text system font asset (spec §4.4 "System font (text, BSON)").
//!
//! This type's deserialize only builds the front matter; the secondary
//! binary request that fills `font_binary` from `ttf_asset_name` is not
//! something this module can do on its own (it needs VFS access), so it's
//! performed by the system-font handler in [`crate::handler`], matching spec
//! §4.5's note that custom handlers "wrap the default to perform
//! post-deserialize work (load binary font body)".

use crate::bson::{Object, ObjectKind, Tree};
use crate::name::Name;

/// A system (TTF-backed) font asset.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemFont {
    pub version: u32,
    pub ttf_asset_name: Name,
    pub ttf_asset_package_name: Name,
    pub faces: Vec<Name>,
    /// Filled in by the handler's secondary binary request; empty right
    /// after [`text_deserialize`] alone.
    pub font_binary: Vec<u8>,
}

const VERSION: u32 = 1;

/// Render `font`'s front matter (not `font_binary`, which is never
/// persisted in the text form — it lives in the referenced TTF asset) to
/// BSON text.
pub fn text_serialize(font: &SystemFont) -> String {
    let mut root = Object::new_object();
    root.set_int(Some("version"), font.version as i64);
    root.set_string(Some("ttf_asset_name"), font.ttf_asset_name.to_string());
    root.set_string(
        Some("ttf_asset_package_name"),
        font.ttf_asset_package_name.to_string(),
    );
    let mut faces = Object::new_array();
    for f in &font.faces {
        faces.set_string(None, f.to_string());
    }
    root.set_object(Some("faces"), faces);
    crate::bson::write(&Tree { root })
}

/// Error parsing a [`SystemFont`]'s front matter.
#[derive(Debug, thiserror::Error)]
pub enum SystemFontDeserializeError {
    #[error(transparent)]
    Parse(#[from] anyhow::Error),
    #[error("system font is missing required field {0:?}")]
    MissingField(&'static str),
}

/// Parse a system font's front matter. Leaves `font_binary` empty; the
/// handler fills it from a secondary request.
pub fn text_deserialize(text: &str) -> Result<SystemFont, SystemFontDeserializeError> {
    let tree = crate::bson::parse_str(text)?;
    let root = &tree.root;
    let version = root
        .get_int("version")
        .map_err(|_| SystemFontDeserializeError::MissingField("version"))? as u32;
    let ttf_asset_name = root
        .get_name("ttf_asset_name")
        .map_err(|_| SystemFontDeserializeError::MissingField("ttf_asset_name"))?;
    let ttf_asset_package_name = root
        .get_name("ttf_asset_package_name")
        .map_err(|_| SystemFontDeserializeError::MissingField("ttf_asset_package_name"))?;
    let faces = match root.get_object("faces") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .filter_map(|v| match v {
                crate::bson::Value::String(s) => Some(Name::new(s)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(SystemFont {
        version,
        ttf_asset_name,
        ttf_asset_package_name,
        faces,
        font_binary: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_front_matter() {
        let font = SystemFont {
            version: VERSION,
            ttf_asset_name: Name::new("Sans"),
            ttf_asset_package_name: Name::new("Runtime"),
            faces: vec![Name::new("regular"), Name::new("bold")],
            font_binary: Vec::new(),
        };
        let text = text_serialize(&font);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(decoded, font);
    }

    #[test]
    fn missing_field_is_an_error() {
        assert!(text_deserialize("version = 1\n").is_err());
    }
}
