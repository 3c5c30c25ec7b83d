//! Binary static mesh asset (spec §4.4 "Static mesh (binary)", §8 Scenario 3).

use crate::binary::{read_f32, read_len_str, read_u32, write_len_str, BinaryHeader, HeaderError, HEADER_SIZE};
use super::AssetTypeTag;

/// Min/max axis-aligned bounds, 24 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// One vertex. Not named by spec §4.4 beyond "`vertex_3d`"; laid out as
/// position + normal + uv, the conventional minimal static-mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

const VERTEX_SIZE: usize = (3 + 3 + 2) * 4;

/// One sub-mesh within a [`StaticMesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub center: [f32; 3],
    pub extents: Extents,
    pub name: String,
    /// Empty string means "absent" (spec: "a length of 0 is valid and means
    /// 'absent'").
    pub material_asset_name: String,
    pub indices: Vec<u32>,
    pub vertices: Vec<Vertex3d>,
}

/// A static mesh asset: an overall bounds plus a list of geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMesh {
    pub extents: Extents,
    pub center: [f32; 3],
    pub geometries: Vec<Geometry>,
}

const VERSION: u32 = 1;

fn write_vec3(out: &mut Vec<u8>, v: [f32; 3]) {
    for c in v {
        out.extend_from_slice(&c.to_le_bytes());
    }
}

fn write_extents(out: &mut Vec<u8>, e: Extents) {
    write_vec3(out, e.min);
    write_vec3(out, e.max);
}

fn read_vec3(bytes: &[u8], pos: &mut usize) -> anyhow::Result<[f32; 3]> {
    Ok([
        read_f32(bytes, pos)?,
        read_f32(bytes, pos)?,
        read_f32(bytes, pos)?,
    ])
}

fn read_extents(bytes: &[u8], pos: &mut usize) -> anyhow::Result<Extents> {
    Ok(Extents {
        min: read_vec3(bytes, pos)?,
        max: read_vec3(bytes, pos)?,
    })
}

fn geometry_payload_len(g: &Geometry) -> usize {
    12 + 24
        + 4 + g.name.len()
        + 4 + g.material_asset_name.len()
        + 4 + g.indices.len() * 4
        + 4 + g.vertices.len() * VERTEX_SIZE
}

fn write_geometry(out: &mut Vec<u8>, g: &Geometry) {
    write_vec3(out, g.center);
    write_extents(out, g.extents);
    write_len_str(out, &g.name);
    write_len_str(out, &g.material_asset_name);
    out.extend_from_slice(&(g.indices.len() as u32).to_le_bytes());
    for i in &g.indices {
        out.extend_from_slice(&i.to_le_bytes());
    }
    out.extend_from_slice(&(g.vertices.len() as u32).to_le_bytes());
    for v in &g.vertices {
        write_vec3(out, v.position);
        write_vec3(out, v.normal);
        out.extend_from_slice(&v.uv[0].to_le_bytes());
        out.extend_from_slice(&v.uv[1].to_le_bytes());
    }
}

fn read_geometry(bytes: &[u8], pos: &mut usize) -> anyhow::Result<Geometry> {
    let center = read_vec3(bytes, pos)?;
    let extents = read_extents(bytes, pos)?;
    let name = read_len_str(bytes, pos)?;
    let material_asset_name = read_len_str(bytes, pos)?;
    let index_count = read_u32(bytes, pos)? as usize;
    let mut indices = Vec::with_capacity(index_count);
    for _ in 0..index_count {
        indices.push(read_u32(bytes, pos)?);
    }
    let vertex_count = read_u32(bytes, pos)? as usize;
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let position = read_vec3(bytes, pos)?;
        let normal = read_vec3(bytes, pos)?;
        let uv = [read_f32(bytes, pos)?, read_f32(bytes, pos)?];
        vertices.push(Vertex3d {
            position,
            normal,
            uv,
        });
    }
    Ok(Geometry {
        center,
        extents,
        name,
        material_asset_name,
        indices,
        vertices,
    })
}

/// Encode `mesh` to its binary container form.
pub fn binary_serialize(mesh: &StaticMesh) -> Vec<u8> {
    let geometry_bytes: usize = mesh.geometries.iter().map(geometry_payload_len).sum();
    let data_block_size = (4 + 24 + 12 + geometry_bytes) as u32;
    let header = BinaryHeader::new(AssetTypeTag::StaticMesh, VERSION, data_block_size);
    let mut out = Vec::with_capacity(HEADER_SIZE + data_block_size as usize);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&(mesh.geometries.len() as u32).to_le_bytes());
    write_extents(&mut out, mesh.extents);
    write_vec3(&mut out, mesh.center);
    for g in &mesh.geometries {
        write_geometry(&mut out, g);
    }
    out
}

/// Error decoding a [`StaticMesh`] from its binary form.
#[derive(Debug, thiserror::Error)]
pub enum StaticMeshDeserializeError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("malformed static mesh payload: {0}")]
    Malformed(#[from] anyhow::Error),
}

/// Decode a binary static mesh container.
pub fn binary_deserialize(bytes: &[u8]) -> Result<StaticMesh, StaticMeshDeserializeError> {
    let header = BinaryHeader::read(bytes, AssetTypeTag::StaticMesh)?;
    let data = header.data(bytes);
    let mut pos = 0;
    let geometry_count = read_u32(data, &mut pos)? as usize;
    let extents = read_extents(data, &mut pos)?;
    let center = read_vec3(data, &mut pos)?;
    let mut geometries = Vec::with_capacity(geometry_count);
    for _ in 0..geometry_count {
        geometries.push(read_geometry(data, &mut pos)?);
    }
    Ok(StaticMesh {
        extents,
        center,
        geometries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_3_name_length_layout() {
        let mesh = StaticMesh {
            extents: Extents {
                min: [0.0; 3],
                max: [1.0; 3],
            },
            center: [0.0; 3],
            geometries: vec![Geometry {
                center: [0.0; 3],
                extents: Extents {
                    min: [0.0; 3],
                    max: [1.0; 3],
                },
                name: "cube".to_string(),
                material_asset_name: String::new(),
                indices: vec![0, 1, 2],
                vertices: vec![],
            }],
        };
        let bytes = binary_serialize(&mesh);
        // 16-byte base header + 40-byte top header extension + 68-byte
        // single-geometry payload (spec §8 scenario 3's arithmetic).
        assert_eq!(bytes.len(), HEADER_SIZE + 40 + 68);

        let decoded = binary_deserialize(&bytes).unwrap();
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn empty_material_name_round_trips_as_absent() {
        let g = Geometry {
            center: [0.0; 3],
            extents: Extents {
                min: [0.0; 3],
                max: [0.0; 3],
            },
            name: "x".into(),
            material_asset_name: String::new(),
            indices: vec![],
            vertices: vec![],
        };
        let mesh = StaticMesh {
            extents: Extents {
                min: [0.0; 3],
                max: [0.0; 3],
            },
            center: [0.0; 3],
            geometries: vec![g],
        };
        let bytes = binary_serialize(&mesh);
        let decoded = binary_deserialize(&bytes).unwrap();
        assert!(decoded.geometries[0].material_asset_name.is_empty());
    }
}
