//! Text shader asset (spec §4.4 "Shader (text)").

use crate::bson::{Object, ObjectKind, Tree, Value};
use crate::name::Name;

/// Triangle/line/point assembly, one of the pipeline's `topology_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

impl Topology {
    fn as_str(self) -> &'static str {
        match self {
            Topology::TriangleList => "triangle_list",
            Topology::TriangleStrip => "triangle_strip",
            Topology::LineList => "line_list",
            Topology::PointList => "point_list",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "triangle_list" => Some(Topology::TriangleList),
            "triangle_strip" => Some(Topology::TriangleStrip),
            "line_list" => Some(Topology::LineList),
            "point_list" => Some(Topology::PointList),
            _ => None,
        }
    }
}

/// Backface culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

impl CullMode {
    fn as_str(self) -> &'static str {
        match self {
            CullMode::None => "none",
            CullMode::Front => "front",
            CullMode::Back => "back",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(CullMode::None),
            "front" => Some(CullMode::Front),
            "back" => Some(CullMode::Back),
            _ => None,
        }
    }
}

/// Which point in the pipeline a [`ShaderStage`] runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageType {
    Vertex,
    Fragment,
    Compute,
}

impl StageType {
    fn as_str(self) -> &'static str {
        match self {
            StageType::Vertex => "vertex",
            StageType::Fragment => "fragment",
            StageType::Compute => "compute",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "vertex" => Some(StageType::Vertex),
            "fragment" => Some(StageType::Fragment),
            "compute" => Some(StageType::Compute),
            _ => None,
        }
    }
}

/// One compiled-shader stage, sourced from another asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderStage {
    pub stage_type: StageType,
    pub source_asset_name: Name,
    pub package_name: Name,
}

/// Vertex-buffer field type for a [`VertexAttribute`] or uniform entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    Mat4,
    Struct,
}

impl FieldType {
    fn as_str(self) -> &'static str {
        match self {
            FieldType::Float => "float",
            FieldType::Vec2 => "vec2",
            FieldType::Vec3 => "vec3",
            FieldType::Vec4 => "vec4",
            FieldType::Int => "int",
            FieldType::Mat4 => "mat4",
            FieldType::Struct => "struct",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "float" => Some(FieldType::Float),
            "vec2" => Some(FieldType::Vec2),
            "vec3" => Some(FieldType::Vec3),
            "vec4" => Some(FieldType::Vec4),
            "int" => Some(FieldType::Int),
            "mat4" => Some(FieldType::Mat4),
            "struct" => Some(FieldType::Struct),
            _ => None,
        }
    }
}

/// One vertex-buffer input field.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub attribute_type: FieldType,
    pub name: Name,
}

/// One uniform-block entry.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformEntry {
    pub entry_type: FieldType,
    pub name: Name,
    /// Required when `entry_type == FieldType::Struct`.
    pub size: Option<u32>,
    /// Present when the entry is an array of more than one element.
    pub array_size: Option<u32>,
}

/// The three uniform update-frequency buckets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformSets {
    pub per_frame: Vec<UniformEntry>,
    pub per_group: Vec<UniformEntry>,
    pub per_draw: Vec<UniformEntry>,
}

/// A shader asset: pipeline state plus compiled stages, vertex attributes,
/// and uniform layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    pub version: u32,
    pub max_groups: u32,
    pub max_draw_ids: u32,
    pub depth_test: bool,
    pub stencil_test: bool,
    pub color_write: bool,
    pub cull_mode: CullMode,
    pub topology_types: Vec<Topology>,
    pub stages: Vec<ShaderStage>,
    pub attributes: Vec<VertexAttribute>,
    pub uniforms: UniformSets,
}

const VERSION: u32 = 1;

fn write_stage(s: &ShaderStage) -> Object {
    let mut o = Object::new_object();
    o.set_string(Some("type"), s.stage_type.as_str());
    o.set_string(Some("source_asset_name"), s.source_asset_name.to_string());
    o.set_string(Some("package_name"), s.package_name.to_string());
    o
}

fn read_stage(o: &Object) -> anyhow::Result<ShaderStage> {
    Ok(ShaderStage {
        stage_type: StageType::parse(o.get_string("type")?)
            .ok_or_else(|| anyhow::anyhow!("unknown shader stage type"))?,
        source_asset_name: o.get_name("source_asset_name")?,
        package_name: o.get_name("package_name")?,
    })
}

fn write_attribute(a: &VertexAttribute) -> Object {
    let mut o = Object::new_object();
    o.set_string(Some("type"), a.attribute_type.as_str());
    o.set_string(Some("name"), a.name.to_string());
    o
}

fn read_attribute(o: &Object) -> anyhow::Result<VertexAttribute> {
    Ok(VertexAttribute {
        attribute_type: FieldType::parse(o.get_string("type")?)
            .ok_or_else(|| anyhow::anyhow!("unknown attribute type"))?,
        name: o.get_name("name")?,
    })
}

fn write_uniform(u: &UniformEntry) -> Object {
    let mut o = Object::new_object();
    o.set_string(Some("type"), u.entry_type.as_str());
    o.set_string(Some("name"), u.name.to_string());
    if let Some(size) = u.size {
        o.set_int(Some("size"), size as i64);
    }
    if let Some(n) = u.array_size {
        o.set_int(Some("array_size"), n as i64);
    }
    o
}

fn read_uniform(o: &Object) -> anyhow::Result<UniformEntry> {
    let entry_type = FieldType::parse(o.get_string("type")?)
        .ok_or_else(|| anyhow::anyhow!("unknown uniform type"))?;
    let name = o.get_name("name")?;
    let size = match o.get_int("size") {
        Ok(v) => Some(v as u32),
        Err(_) if entry_type == FieldType::Struct => {
            anyhow::bail!("struct uniform {name:?} is missing required `size`")
        }
        Err(_) => None,
    };
    let array_size = o.get_int("array_size").ok().map(|v| v as u32);
    Ok(UniformEntry {
        entry_type,
        name,
        size,
        array_size,
    })
}

fn write_uniform_array(entries: &[UniformEntry]) -> Object {
    let mut arr = Object::new_array();
    for e in entries {
        arr.set_object(None, write_uniform(e));
    }
    arr
}

fn read_uniform_array(root: &Object, field: &str) -> anyhow::Result<Vec<UniformEntry>> {
    match root.get_object(field) {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => read_uniform(o),
                _ => anyhow::bail!("{field} entry is not an object"),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Render `shader` to BSON text.
pub fn text_serialize(shader: &Shader) -> String {
    let mut root = Object::new_object();
    root.set_int(Some("version"), shader.version as i64);
    root.set_int(Some("max_groups"), shader.max_groups as i64);
    root.set_int(Some("max_draw_ids"), shader.max_draw_ids as i64);
    root.set_bool(Some("depth_test"), shader.depth_test);
    root.set_bool(Some("stencil_test"), shader.stencil_test);
    root.set_bool(Some("color_write"), shader.color_write);
    root.set_string(Some("cull_mode"), shader.cull_mode.as_str());

    let mut topology = Object::new_array();
    for t in &shader.topology_types {
        topology.set_string(None, t.as_str());
    }
    root.set_object(Some("topology_types"), topology);

    let mut stages = Object::new_array();
    for s in &shader.stages {
        stages.set_object(None, write_stage(s));
    }
    root.set_object(Some("stages"), stages);

    let mut attributes = Object::new_array();
    for a in &shader.attributes {
        attributes.set_object(None, write_attribute(a));
    }
    root.set_object(Some("attributes"), attributes);

    let mut uniforms = Object::new_object();
    uniforms.set_object(Some("per_frame"), write_uniform_array(&shader.uniforms.per_frame));
    uniforms.set_object(Some("per_group"), write_uniform_array(&shader.uniforms.per_group));
    uniforms.set_object(Some("per_draw"), write_uniform_array(&shader.uniforms.per_draw));
    root.set_object(Some("uniforms"), uniforms);

    crate::bson::write(&Tree { root })
}

/// Parse a shader's BSON text, applying spec §4.4's defaults: missing
/// `topology_types` becomes `[triangle_list]` (warning), missing `cull_mode`
/// becomes `back`, missing `color_write` is `true`, other missing flags are
/// `false`.
pub fn text_deserialize(text: &str) -> anyhow::Result<Shader> {
    let tree = crate::bson::parse_str(text)?;
    let root = &tree.root;

    let version = root.get_int("version").unwrap_or(VERSION as i64) as u32;
    let max_groups = root.get_int("max_groups").unwrap_or(0) as u32;
    let max_draw_ids = root.get_int("max_draw_ids").unwrap_or(0) as u32;
    let depth_test = root.get_bool("depth_test").unwrap_or(false);
    let stencil_test = root.get_bool("stencil_test").unwrap_or(false);
    let color_write = root.get_bool("color_write").unwrap_or(true);

    let cull_mode = match root.get_string("cull_mode") {
        Ok(s) => CullMode::parse(s).ok_or_else(|| anyhow::anyhow!("unknown cull_mode {s:?}"))?,
        Err(_) => {
            tracing::warn!("shader is missing cull_mode, defaulting to back");
            CullMode::Back
        }
    };

    let topology_types = match root.get_object("topology_types") {
        Ok(arr) if arr.kind == ObjectKind::Array && !arr.is_empty() => arr
            .elements()
            .map(|v| match v {
                Value::String(s) => {
                    Topology::parse(s).ok_or_else(|| anyhow::anyhow!("unknown topology {s:?}"))
                }
                _ => anyhow::bail!("topology_types entry is not a string"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => {
            tracing::warn!("shader is missing topology_types, defaulting to [triangle_list]");
            vec![Topology::TriangleList]
        }
    };

    let stages = match root.get_object("stages") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => read_stage(o),
                _ => anyhow::bail!("stages entry is not an object"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    let attributes = match root.get_object("attributes") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => read_attribute(o),
                _ => anyhow::bail!("attributes entry is not an object"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    let uniforms = match root.get_object("uniforms") {
        Ok(u) => UniformSets {
            per_frame: read_uniform_array(u, "per_frame")?,
            per_group: read_uniform_array(u, "per_group")?,
            per_draw: read_uniform_array(u, "per_draw")?,
        },
        Err(_) => UniformSets::default(),
    };

    Ok(Shader {
        version,
        max_groups,
        max_draw_ids,
        depth_test,
        stencil_test,
        color_write,
        cull_mode,
        topology_types,
        stages,
        attributes,
        uniforms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Shader {
        Shader {
            version: VERSION,
            max_groups: 4,
            max_draw_ids: 256,
            depth_test: true,
            stencil_test: false,
            color_write: true,
            cull_mode: CullMode::Back,
            topology_types: vec![Topology::TriangleList],
            stages: vec![ShaderStage {
                stage_type: StageType::Vertex,
                source_asset_name: Name::new("basic.vert"),
                package_name: Name::new("Runtime"),
            }],
            attributes: vec![VertexAttribute {
                attribute_type: FieldType::Vec3,
                name: Name::new("position"),
            }],
            uniforms: UniformSets {
                per_frame: vec![UniformEntry {
                    entry_type: FieldType::Mat4,
                    name: Name::new("view_proj"),
                    size: None,
                    array_size: None,
                }],
                per_group: vec![],
                per_draw: vec![UniformEntry {
                    entry_type: FieldType::Struct,
                    name: Name::new("instance_data"),
                    size: Some(64),
                    array_size: Some(8),
                }],
            },
        }
    }

    #[test]
    fn round_trips() {
        let shader = sample();
        let text = text_serialize(&shader);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(decoded, shader);
    }

    #[test]
    fn missing_topology_and_cull_mode_default() {
        let text = "version = 1\n";
        let decoded = text_deserialize(text).unwrap();
        assert_eq!(decoded.topology_types, vec![Topology::TriangleList]);
        assert_eq!(decoded.cull_mode, CullMode::Back);
        assert!(decoded.color_write);
        assert!(!decoded.depth_test);
    }

    #[test]
    fn struct_uniform_without_size_is_an_error() {
        let text = "version = 1\nuniforms = {\n    per_frame = [ { type = \"struct\" name = \"x\" } ]\n    per_group = []\n    per_draw = []\n}\n";
        assert!(text_deserialize(text).is_err());
    }
}
