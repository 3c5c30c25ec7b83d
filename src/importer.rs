//! Importer registry (spec §4.6): produces a primary asset from an
//! authoring-format source file when the primary is missing (spec §8
//! Scenario 4).
//!
//! Grounded on `bismuth.plugin.utils/src/importers/basset_importer_static_mesh_obj.c`
//! (the OBJ importer, which may write a companion material file discovered
//! via the OBJ's `mtllib` directive, per
//! `bismuth.plugin.utils/src/serializers/obj_mtl_serializer.h`) and
//! `bismuth.plugin.utils/src/importers/basset_importer_audio.c` (the WAV
//! importer, which extracts PCM frames from a `RIFF/WAVE` container without
//! decoding any compressed codec). The PNG importer decodes pixels via the
//! `image` crate, since a primary/binary image asset must come from
//! somewhere when only a `.png` source is present and pixel decode was never
//! named as excluded.

use crate::asset::audio::Audio;
use crate::asset::material::{FilterMode, Material, MaterialMap, RepeatMode};
use crate::asset::static_mesh::{Extents, Geometry, StaticMesh, Vertex3d};
use crate::asset::image::{Image, ImageFormat};
use crate::asset::AssetPayload;
use crate::name::Name;

/// What an importer produces: the primary asset, plus an optional companion
/// asset an importer wrote on the side (spec §4.6: "An importer may ...
/// write additional sibling assets during import").
pub struct ImportOutput {
    pub primary: AssetPayload,
    pub companion: Option<(String, AssetPayload)>,
}

/// One entry in the importer registry: keyed by (asset type, source
/// extension), case-insensitively (spec §4.6).
pub type ImporterFn = fn(&[u8]) -> anyhow::Result<ImportOutput>;

/// Look up the importer for `(type_name, extension)`, case-insensitively.
/// Spec §4.6: "The registry rejects registrations missing a source type or
/// import function" — since this registry is a fixed match rather than a
/// mutable table, that constraint is enforced by construction: every arm
/// names both.
pub fn find(type_name: &str, extension: &str) -> Option<ImporterFn> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match (type_name.to_ascii_lowercase().as_str(), ext.as_str()) {
        ("image", "png") => Some(import_png_image),
        ("static_mesh", "obj") => Some(import_obj_static_mesh),
        ("audio", "wav") => Some(import_wav_audio),
        _ => None,
    }
}

fn import_png_image(bytes: &[u8]) -> anyhow::Result<ImportOutput> {
    let decoded = ::image::load_from_memory_with_format(bytes, ::image::ImageFormat::Png)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let image = Image {
        format: ImageFormat::Rgba8,
        width,
        height,
        mip_levels: 1,
        pixels: rgba.into_raw(),
    };
    Ok(ImportOutput {
        primary: AssetPayload::Image(image),
        companion: None,
    })
}

/// Minimal ASCII Wavefront OBJ reader: `v`, `vt`, `vn`, `f`, and `mtllib`
/// lines. Faces are triangulated by fan from the first vertex, matching the
/// simplifying assumption a minimal importer of this kind makes.
fn import_obj_static_mesh(bytes: &[u8]) -> anyhow::Result<ImportOutput> {
    let text = std::str::from_utf8(bytes)?;
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut vertices: Vec<Vertex3d> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut mtllib: Option<String> = None;
    let mut object_name = String::from("obj_mesh");

    for line in text.lines() {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let v = parse_floats3(tokens)?;
                positions.push(v);
            }
            Some("vn") => {
                let v = parse_floats3(tokens)?;
                normals.push(v);
            }
            Some("vt") => {
                let u: f32 = tokens.next().unwrap_or("0").parse()?;
                let v: f32 = tokens.next().unwrap_or("0").parse()?;
                uvs.push([u, v]);
            }
            Some("o") => {
                if let Some(name) = tokens.next() {
                    object_name = name.to_string();
                }
            }
            Some("mtllib") => {
                mtllib = tokens.next().map(str::to_string);
            }
            Some("f") => {
                let face_indices: Vec<u32> = tokens
                    .map(|tok| parse_face_vertex(tok, &positions, &normals, &uvs, &mut vertices))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                for i in 1..face_indices.len().saturating_sub(1) {
                    indices.push(face_indices[0]);
                    indices.push(face_indices[i]);
                    indices.push(face_indices[i + 1]);
                }
            }
            _ => continue,
        }
    }

    anyhow::ensure!(!vertices.is_empty(), "OBJ file has no vertices");

    let (min, max) = bounds(&vertices);
    let center = [
        (min[0] + max[0]) / 2.0,
        (min[1] + max[1]) / 2.0,
        (min[2] + max[2]) / 2.0,
    ];
    let extents = Extents { min, max };
    let geometry = Geometry {
        center,
        extents,
        name: object_name,
        material_asset_name: String::new(),
        indices,
        vertices,
    };
    let mesh = StaticMesh {
        extents,
        center,
        geometries: vec![geometry],
    };

    let companion = mtllib.as_deref().map(|filename| {
        let stem = std::path::Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename)
            .to_string();
        (stem, AssetPayload::Material(parse_mtl_stub(filename)))
    });

    Ok(ImportOutput {
        primary: AssetPayload::StaticMesh(mesh),
        companion,
    })
}

fn parse_floats3<'a>(mut tokens: impl Iterator<Item = &'a str>) -> anyhow::Result<[f32; 3]> {
    Ok([
        tokens.next().ok_or_else(|| anyhow::anyhow!("missing x"))?.parse()?,
        tokens.next().ok_or_else(|| anyhow::anyhow!("missing y"))?.parse()?,
        tokens.next().ok_or_else(|| anyhow::anyhow!("missing z"))?.parse()?,
    ])
}

fn parse_face_vertex(
    tok: &str,
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
    vertices: &mut Vec<Vertex3d>,
) -> anyhow::Result<u32> {
    let mut parts = tok.split('/');
    let pi: usize = parts.next().ok_or_else(|| anyhow::anyhow!("empty face vertex"))?.parse()?;
    let ti = parts.next().filter(|s| !s.is_empty()).map(str::parse::<usize>).transpose()?;
    let ni = parts.next().filter(|s| !s.is_empty()).map(str::parse::<usize>).transpose()?;

    let position = *positions
        .get(pi.wrapping_sub(1))
        .ok_or_else(|| anyhow::anyhow!("face references out-of-range position {pi}"))?;
    let normal = ni
        .and_then(|i| normals.get(i.wrapping_sub(1)))
        .copied()
        .unwrap_or([0.0, 0.0, 0.0]);
    let uv = ti.and_then(|i| uvs.get(i.wrapping_sub(1))).copied().unwrap_or([0.0, 0.0]);

    vertices.push(Vertex3d { position, normal, uv });
    Ok((vertices.len() - 1) as u32)
}

fn bounds(vertices: &[Vertex3d]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for v in vertices {
        for axis in 0..3 {
            min[axis] = min[axis].min(v.position[axis]);
            max[axis] = max[axis].max(v.position[axis]);
        }
    }
    (min, max)
}

/// Build a stub material from a referenced `.mtl` filename, the companion
/// asset spec §4.6 gestures at. A full MTL property parse is out of scope
/// for a minimal importer; this records the map reference an OBJ/MTL pair
/// most commonly carries (a diffuse/albedo texture).
fn parse_mtl_stub(mtl_filename: &str) -> Material {
    Material {
        material_type: "pbr".into(),
        name: Name::new(mtl_filename.trim_end_matches(".mtl")),
        version: crate::asset::material::MATERIAL_FILE_VERSION,
        properties: Vec::new(),
        maps: vec![MaterialMap {
            name: Name::new("albedo"),
            image_asset_name: Name::NONE,
            filter_min: FilterMode::Linear,
            filter_mag: FilterMode::Linear,
            repeat_u: RepeatMode::Repeat,
            repeat_v: RepeatMode::Repeat,
            repeat_w: RepeatMode::Repeat,
            channel: None,
        }],
    }
}

const WAV_HEADER_MIN: usize = 44;

fn import_wav_audio(bytes: &[u8]) -> anyhow::Result<ImportOutput> {
    anyhow::ensure!(bytes.len() >= WAV_HEADER_MIN, "WAV file is truncated");
    anyhow::ensure!(&bytes[0..4] == b"RIFF", "missing RIFF chunk id");
    anyhow::ensure!(&bytes[8..12] == b"WAVE", "missing WAVE format id");

    let mut pos = 12;
    let mut channels = 0u16;
    let mut sample_rate = 0u32;
    let mut bits_per_sample = 0u16;
    let mut pcm: Option<Vec<u8>> = None;

    while pos + 8 <= bytes.len() {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body_start = pos + 8;
        anyhow::ensure!(bytes.len() >= body_start + chunk_size, "WAV chunk overruns file");
        let body = &bytes[body_start..body_start + chunk_size];

        match chunk_id {
            b"fmt " => {
                anyhow::ensure!(body.len() >= 16, "fmt chunk too short");
                channels = u16::from_le_bytes(body[2..4].try_into().unwrap());
                sample_rate = u32::from_le_bytes(body[4..8].try_into().unwrap());
                bits_per_sample = u16::from_le_bytes(body[14..16].try_into().unwrap());
            }
            b"data" => pcm = Some(body.to_vec()),
            _ => {}
        }
        pos = body_start + chunk_size + (chunk_size % 2);
    }

    let pcm = pcm.ok_or_else(|| anyhow::anyhow!("WAV file has no data chunk"))?;
    Ok(ImportOutput {
        primary: AssetPayload::Audio(Audio {
            sample_rate,
            channels,
            bits_per_sample,
            pcm,
        }),
        companion: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_wav(frames: usize) -> Vec<u8> {
        let data: Vec<u8> = (0..frames)
            .flat_map(|i| ((i as i16) * 100).to_le_bytes())
            .collect();
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&44100u32.to_le_bytes());
        out.extend_from_slice(&88200u32.to_le_bytes()); // byte rate
        out.extend_from_slice(&2u16.to_le_bytes()); // block align
        out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    #[test]
    fn wav_importer_extracts_pcm() {
        let bytes = sine_wav(4);
        let output = import_wav_audio(&bytes).unwrap();
        match output.primary {
            AssetPayload::Audio(audio) => {
                assert_eq!(audio.sample_rate, 44100);
                assert_eq!(audio.channels, 1);
                assert_eq!(audio.bits_per_sample, 16);
                assert_eq!(audio.pcm.len(), 8);
            }
            _ => panic!("expected audio payload"),
        }
    }

    #[test]
    fn obj_importer_triangulates_and_bounds() {
        let obj = "o cube\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let output = import_obj_static_mesh(obj.as_bytes()).unwrap();
        match output.primary {
            AssetPayload::StaticMesh(mesh) => {
                assert_eq!(mesh.geometries.len(), 1);
                assert_eq!(mesh.geometries[0].indices.len(), 6); // two triangles
                assert_eq!(mesh.geometries[0].extents.max, [1.0, 1.0, 0.0]);
            }
            _ => panic!("expected static mesh payload"),
        }
    }

    #[test]
    fn obj_importer_writes_companion_material_from_mtllib() {
        let obj = "mtllib stone.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let output = import_obj_static_mesh(obj.as_bytes()).unwrap();
        assert!(output.companion.is_some());
    }

    #[test]
    fn registry_is_case_insensitive_on_extension() {
        assert!(find("Image", "PNG").is_some());
        assert!(find("image", ".png").is_some());
        assert!(find("image", "jpg").is_none());
    }
}
