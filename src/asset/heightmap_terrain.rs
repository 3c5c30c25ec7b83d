//! Text heightmap terrain asset (spec §4.4 "Heightmap terrain (text)").
//!
//! Spec §9 notes two struct shapes exist in the original source and says to
//! prefer the richer one, `{heightmap_asset_name, chunk_size, tile_scale,
//! material_count, material_names[]}`; that's what's implemented here
//! (`material_count` is simply `material_names.len()` and isn't stored
//! separately).

use crate::bson::{Object, ObjectKind, Tree, Value};

const DEFAULT_MATERIAL_NAME: &str = "default_terrain";
const DEFAULT_TILE_SCALE: [f32; 3] = [1.0, 1.0, 1.0];

/// A heightmap terrain asset.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapTerrain {
    pub version: u32,
    pub heightmap_asset_name: String,
    pub chunk_size: i64,
    pub tile_scale: [f32; 3],
    pub material_names: Vec<String>,
}

const VERSION: u32 = 1;

/// Render `terrain` to BSON text.
pub fn text_serialize(terrain: &HeightmapTerrain) -> String {
    let mut root = Object::new_object();
    root.set_int(Some("version"), terrain.version as i64);
    root.set_string(Some("heightmap_filename"), &terrain.heightmap_asset_name);
    root.set_int(Some("chunk_size"), terrain.chunk_size);
    root.set_vec3(Some("tile_scale"), terrain.tile_scale);
    let mut names = Object::new_array();
    for n in &terrain.material_names {
        names.set_string(None, n);
    }
    root.set_object(Some("material_names"), names);
    crate::bson::write(&Tree { root })
}

/// Parse a heightmap terrain's BSON text, applying the defaults spec §4.4
/// names: missing `tile_scale` becomes `(1,1,1)`; a missing/empty per-slot
/// material name becomes `"default_terrain"`.
pub fn text_deserialize(text: &str) -> anyhow::Result<HeightmapTerrain> {
    let tree = crate::bson::parse_str(text)?;
    let root = &tree.root;
    let version = root.get_int("version").unwrap_or(1) as u32;
    let heightmap_asset_name = root.get_string("heightmap_filename").unwrap_or("").to_string();
    let chunk_size = root.get_int("chunk_size").unwrap_or(0);
    let tile_scale = root.get_vec3("tile_scale").unwrap_or(DEFAULT_TILE_SCALE);

    let material_names = match root.get_object("material_names") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::String(s) if !s.is_empty() => s.clone(),
                _ => DEFAULT_MATERIAL_NAME.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(HeightmapTerrain {
        version,
        heightmap_asset_name,
        chunk_size,
        tile_scale,
        material_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let terrain = HeightmapTerrain {
            version: VERSION,
            heightmap_asset_name: "heights.raw".into(),
            chunk_size: 32,
            tile_scale: [2.0, 1.0, 2.0],
            material_names: vec!["rock".into(), "grass".into()],
        };
        let text = text_serialize(&terrain);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(decoded, terrain);
    }

    #[test]
    fn missing_tile_scale_defaults_to_one_one_one() {
        let text = "version = 1\nheightmap_filename = \"h.raw\"\nchunk_size = 16\n";
        let decoded = text_deserialize(text).unwrap();
        assert_eq!(decoded.tile_scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_material_slot_defaults() {
        let text = "version = 1\nheightmap_filename = \"h.raw\"\nchunk_size = 16\nmaterial_names = [ \"\" \"grass\" ]\n";
        let decoded = text_deserialize(text).unwrap();
        assert_eq!(decoded.material_names, vec!["default_terrain", "grass"]);
    }
}
