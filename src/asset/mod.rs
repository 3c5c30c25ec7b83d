//! Per-type asset structs and serializers (spec §3 "asset base record", §4.4).
//!
//! Every asset type lives in its own module and implements whichever of
//! `binary_serialize`/`binary_deserialize`/`text_serialize`/`text_deserialize`
//! spec §4.4 names for it — there's no shared trait, because the four
//! functions aren't uniform across types (some are binary-only, some
//! text-only, `system_font` is text with a secondary binary fetch bolted on).
//! A small dispatch table from [`AssetTypeTag`] to the right pair lives in
//! [`crate::handler`].

pub mod audio;
pub mod bitmap_font;
pub mod bson_asset;
pub mod heightmap_terrain;
pub mod image;
pub mod material;
pub mod scene;
pub mod shader;
pub mod static_mesh;
pub mod system_font;

use crate::name::Name;

/// The closed set of asset types this pipeline knows how to serialize (spec
/// §3, §9 "tagged variants"). The discriminant is the `type` field of the
/// binary container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AssetTypeTag {
    Image = 1,
    StaticMesh = 2,
    BitmapFont = 3,
    SystemFont = 4,
    HeightmapTerrain = 5,
    BsonAsset = 6,
    Material = 7,
    Shader = 8,
    Scene = 9,
    /// PCM audio, produced by the WAV importer (spec §1's carve-out: no
    /// codec decode, just packaging already-PCM data).
    Audio = 10,
}

impl AssetTypeTag {
    /// The lowercase type-name string used in manifests and material/scene
    /// text fields (spec §4.7's case-insensitive type-bucket lookup).
    pub fn type_name(self) -> &'static str {
        match self {
            AssetTypeTag::Image => "image",
            AssetTypeTag::StaticMesh => "static_mesh",
            AssetTypeTag::BitmapFont => "bitmap_font",
            AssetTypeTag::SystemFont => "system_font",
            AssetTypeTag::HeightmapTerrain => "heightmap_terrain",
            AssetTypeTag::BsonAsset => "bson_asset",
            AssetTypeTag::Material => "material",
            AssetTypeTag::Shader => "shader",
            AssetTypeTag::Scene => "scene",
            AssetTypeTag::Audio => "audio",
        }
    }

    /// Parse a manifest/field type-name string case-insensitively.
    pub fn from_type_name(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        Some(match lower.as_str() {
            "image" => AssetTypeTag::Image,
            "static_mesh" | "staticmesh" => AssetTypeTag::StaticMesh,
            "bitmap_font" | "bitmapfont" => AssetTypeTag::BitmapFont,
            "system_font" | "systemfont" => AssetTypeTag::SystemFont,
            "heightmap_terrain" | "heightmapterrain" | "terrain" => {
                AssetTypeTag::HeightmapTerrain
            }
            "bson_asset" | "bsonasset" => AssetTypeTag::BsonAsset,
            "material" => AssetTypeTag::Material,
            "shader" => AssetTypeTag::Shader,
            "scene" => AssetTypeTag::Scene,
            "audio" => AssetTypeTag::Audio,
            _ => return None,
        })
    }
}

/// Generation value an asset is created with, meaning "never loaded" (spec
/// §3: "`invalid` when unloaded").
pub const GENERATION_INVALID: u32 = 0;

/// Metadata carried by every asset (spec §3 "Asset base record").
#[derive(Debug, Clone, Default)]
pub struct AssetMetadata {
    /// Format version the asset was last (de)serialized at.
    pub version: u32,
    /// Path of the authoring-format file this primary was imported from, if
    /// any.
    pub source_asset_path: Option<String>,
    /// Free-form tags, e.g. from a scene attachment's `tags` field.
    pub tags: Vec<Name>,
}

/// The fields every loaded asset carries regardless of type (spec §3).
#[derive(Debug, Clone)]
pub struct AssetBase {
    /// System-unique id, stable for the process lifetime of the asset.
    pub id: u64,
    /// Incremented on every (re)load; [`GENERATION_INVALID`] before the
    /// first successful load.
    pub generation: u32,
    /// Size in bytes of the primary file this asset was last loaded from.
    pub size: u64,
    /// The asset's own name within its package.
    pub name: Name,
    /// The package this asset was loaded from.
    pub package_name: Name,
    /// Which serializer pair applies.
    pub asset_type: AssetTypeTag,
    /// Version/source-path/tags.
    pub metadata: AssetMetadata,
    /// Filesystem watch identifier, if the embedding VFS set one up. Spec's
    /// Non-goals exclude hot-reload *semantics*; we still carry the
    /// identifier since exposing it is explicitly in scope (spec §1).
    pub watch_id: Option<u64>,
}

impl AssetBase {
    /// Build a fresh, never-loaded base record.
    pub fn new(id: u64, name: Name, package_name: Name, asset_type: AssetTypeTag) -> Self {
        AssetBase {
            id,
            generation: GENERATION_INVALID,
            size: 0,
            name,
            package_name,
            asset_type,
            metadata: AssetMetadata::default(),
            watch_id: None,
        }
    }

    /// Mark this record as freshly (re)loaded with `size` bytes.
    pub fn mark_loaded(&mut self, size: u64) {
        self.generation = self.generation.wrapping_add(1).max(1);
        self.size = size;
    }
}

/// The closed union of deserialized asset payloads, one variant per
/// [`AssetTypeTag`] (spec §9: "avoid base-struct-with-type-tag
/// inheritance"). [`crate::handler`] dispatches on this instead of any
/// generic reflection/schema mechanism.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetPayload {
    Image(image::Image),
    Audio(audio::Audio),
    StaticMesh(static_mesh::StaticMesh),
    BitmapFont(bitmap_font::BitmapFont),
    SystemFont(system_font::SystemFont),
    HeightmapTerrain(heightmap_terrain::HeightmapTerrain),
    Bson(bson_asset::BsonAsset),
    Material(material::Material),
    Shader(shader::Shader),
    Scene(scene::Scene),
}

impl AssetPayload {
    /// The tag this payload was produced for.
    pub fn asset_type(&self) -> AssetTypeTag {
        match self {
            AssetPayload::Image(_) => AssetTypeTag::Image,
            AssetPayload::Audio(_) => AssetTypeTag::Audio,
            AssetPayload::StaticMesh(_) => AssetTypeTag::StaticMesh,
            AssetPayload::BitmapFont(_) => AssetTypeTag::BitmapFont,
            AssetPayload::SystemFont(_) => AssetTypeTag::SystemFont,
            AssetPayload::HeightmapTerrain(_) => AssetTypeTag::HeightmapTerrain,
            AssetPayload::Bson(_) => AssetTypeTag::BsonAsset,
            AssetPayload::Material(_) => AssetTypeTag::Material,
            AssetPayload::Shader(_) => AssetTypeTag::Shader,
            AssetPayload::Scene(_) => AssetTypeTag::Scene,
        }
    }
}

/// Deserialize `bytes` as `tag`'s binary form, if that type has one.
/// Returns `None` for types with no binary serializer (spec §4.4: system
/// font, heightmap terrain, BSON asset, material, shader, and scene are
/// text-only).
pub fn binary_deserialize(tag: AssetTypeTag, bytes: &[u8]) -> Option<anyhow::Result<AssetPayload>> {
    Some(match tag {
        AssetTypeTag::Image => image::binary_deserialize(bytes)
            .map(AssetPayload::Image)
            .map_err(anyhow::Error::from),
        AssetTypeTag::StaticMesh => static_mesh::binary_deserialize(bytes)
            .map(AssetPayload::StaticMesh)
            .map_err(anyhow::Error::from),
        AssetTypeTag::BitmapFont => bitmap_font::binary_deserialize(bytes)
            .map(AssetPayload::BitmapFont)
            .map_err(anyhow::Error::from),
        AssetTypeTag::Audio => audio::binary_deserialize(bytes)
            .map(AssetPayload::Audio)
            .map_err(anyhow::Error::from),
        _ => return None,
    })
}

/// Serialize a payload to its binary form, if that type has one.
pub fn binary_serialize(payload: &AssetPayload) -> Option<Vec<u8>> {
    match payload {
        AssetPayload::Image(a) => Some(image::binary_serialize(a)),
        AssetPayload::StaticMesh(a) => Some(static_mesh::binary_serialize(a)),
        AssetPayload::BitmapFont(a) => Some(bitmap_font::binary_serialize(a)),
        AssetPayload::Audio(a) => Some(audio::binary_serialize(a)),
        _ => None,
    }
}

/// Deserialize `text` as `tag`'s text form, if that type has one.
pub fn text_deserialize(tag: AssetTypeTag, text: &str) -> Option<anyhow::Result<AssetPayload>> {
    Some(match tag {
        AssetTypeTag::SystemFont => system_font::text_deserialize(text)
            .map(AssetPayload::SystemFont)
            .map_err(anyhow::Error::from),
        AssetTypeTag::HeightmapTerrain => {
            heightmap_terrain::text_deserialize(text).map(AssetPayload::HeightmapTerrain)
        }
        AssetTypeTag::BsonAsset => bson_asset::text_deserialize(text).map(AssetPayload::Bson),
        AssetTypeTag::Material => material::text_deserialize(text)
            .map(AssetPayload::Material)
            .map_err(anyhow::Error::from),
        AssetTypeTag::Shader => shader::text_deserialize(text).map(AssetPayload::Shader),
        AssetTypeTag::Scene => scene::text_deserialize(text)
            .map(AssetPayload::Scene)
            .map_err(anyhow::Error::from),
        _ => return None,
    })
}

/// Serialize a payload to its text form, if that type has one.
pub fn text_serialize(payload: &AssetPayload) -> Option<String> {
    match payload {
        AssetPayload::SystemFont(a) => Some(system_font::text_serialize(a)),
        AssetPayload::HeightmapTerrain(a) => Some(heightmap_terrain::text_serialize(a)),
        AssetPayload::Bson(a) => Some(bson_asset::text_serialize(a)),
        AssetPayload::Material(a) => Some(material::text_serialize(a)),
        AssetPayload::Shader(a) => Some(shader::text_serialize(a)),
        AssetPayload::Scene(a) => Some(scene::text_serialize(a)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_round_trips() {
        for tag in [
            AssetTypeTag::Image,
            AssetTypeTag::StaticMesh,
            AssetTypeTag::BitmapFont,
            AssetTypeTag::SystemFont,
            AssetTypeTag::HeightmapTerrain,
            AssetTypeTag::BsonAsset,
            AssetTypeTag::Material,
            AssetTypeTag::Shader,
            AssetTypeTag::Scene,
            AssetTypeTag::Audio,
        ] {
            assert_eq!(AssetTypeTag::from_type_name(tag.type_name()), Some(tag));
        }
    }

    #[test]
    fn type_name_lookup_is_case_insensitive() {
        assert_eq!(
            AssetTypeTag::from_type_name("IMAGE"),
            Some(AssetTypeTag::Image)
        );
    }

    #[test]
    fn terrain_fallback_type_string_is_accepted() {
        assert_eq!(
            AssetTypeTag::from_type_name("terrain"),
            Some(AssetTypeTag::HeightmapTerrain)
        );
    }

    #[test]
    fn base_starts_unloaded_and_marks_loaded() {
        let mut base = AssetBase::new(1, Name::new("rock"), Name::new("runtime"), AssetTypeTag::Image);
        assert_eq!(base.generation, GENERATION_INVALID);
        base.mark_loaded(60);
        assert_ne!(base.generation, GENERATION_INVALID);
        assert_eq!(base.size, 60);
    }
}
