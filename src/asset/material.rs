//! Text material asset (spec §4.4 "Material (text)").
//!
//! Spec §9 flags a bug in the original parser: map entries mix up `name` and
//! `channel`, reading the same field twice. Here `name` is the map's logical
//! slot (e.g. `"albedo"`) and `channel` is a separate, optional single-channel
//! selector.

use crate::bson::{Object, ObjectKind, Tree, Value};
use crate::name::Name;

/// Current on-disk material format version. Versions 1 and 2 are rejected
/// outright — no auto-migration (spec: "Older versions (1, 2) are rejected").
pub const MATERIAL_FILE_VERSION: u32 = 3;

/// The uniform-value kinds a [`MaterialProperty`] can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
    /// Opaque uniform-block data; only `size` is persisted (spec: "a warning
    /// that value is not round-tripped").
    Custom { size: u32 },
}

/// A single named material property.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProperty {
    pub name: Name,
    pub value: PropertyValue,
}

/// Texture filtering mode for a [`MaterialMap`]'s sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

impl FilterMode {
    fn as_str(self) -> &'static str {
        match self {
            FilterMode::Nearest => "nearest",
            FilterMode::Linear => "linear",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "nearest" => Some(FilterMode::Nearest),
            "linear" => Some(FilterMode::Linear),
            _ => None,
        }
    }
}

/// Texture addressing mode for a [`MaterialMap`]'s sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    Repeat,
    Clamp,
    Mirror,
}

impl RepeatMode {
    fn as_str(self) -> &'static str {
        match self {
            RepeatMode::Repeat => "repeat",
            RepeatMode::Clamp => "clamp",
            RepeatMode::Mirror => "mirror",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "repeat" => Some(RepeatMode::Repeat),
            "clamp" => Some(RepeatMode::Clamp),
            "mirror" => Some(RepeatMode::Mirror),
            _ => None,
        }
    }
}

/// Which single channel of a map to sample, if not the whole thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    fn as_str(self) -> &'static str {
        match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
            Channel::A => "A",
        }
    }
    fn parse(s: &str) -> Option<Self> {
        match s {
            "R" | "r" => Some(Channel::R),
            "G" | "g" => Some(Channel::G),
            "B" | "b" => Some(Channel::B),
            "A" | "a" => Some(Channel::A),
            _ => None,
        }
    }
}

/// One texture slot bound into the material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialMap {
    /// The map's logical slot, e.g. `"albedo"`, `"normal"`.
    pub name: Name,
    pub image_asset_name: Name,
    pub filter_min: FilterMode,
    pub filter_mag: FilterMode,
    pub repeat_u: RepeatMode,
    pub repeat_v: RepeatMode,
    pub repeat_w: RepeatMode,
    /// `None` means sample all channels.
    pub channel: Option<Channel>,
}

/// A material asset: a named bag of uniform properties plus texture maps.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub material_type: String,
    pub name: Name,
    pub version: u32,
    pub properties: Vec<MaterialProperty>,
    pub maps: Vec<MaterialMap>,
}

fn property_type_str(v: &PropertyValue) -> &'static str {
    match v {
        PropertyValue::Int(_) => "int",
        PropertyValue::Float(_) => "float",
        PropertyValue::Vec2(_) => "vec2",
        PropertyValue::Vec3(_) => "vec3",
        PropertyValue::Vec4(_) => "vec4",
        PropertyValue::Mat4(_) => "mat4",
        PropertyValue::Custom { .. } => "custom",
    }
}

fn write_property(p: &MaterialProperty) -> Object {
    let mut o = Object::new_object();
    o.set_string(Some("name"), p.name.to_string());
    o.set_string(Some("type"), property_type_str(&p.value));
    match &p.value {
        PropertyValue::Int(i) => o.set_int(Some("value"), *i),
        PropertyValue::Float(f) => o.set_float(Some("value"), *f),
        PropertyValue::Vec2(v) => o.set_string(Some("value"), format!("{} {}", v[0], v[1])),
        PropertyValue::Vec3(v) => o.set_vec3(Some("value"), *v),
        PropertyValue::Vec4(v) => o.set_vec4(Some("value"), *v),
        PropertyValue::Mat4(m) => o.set_mat4(Some("value"), *m),
        PropertyValue::Custom { size } => {
            tracing::warn!(property = %p.name, "custom material property value is not round-tripped");
            o.set_int(Some("size"), *size as i64);
        }
    }
    o
}

fn read_property(o: &Object) -> anyhow::Result<MaterialProperty> {
    let name = o.get_name("name")?;
    let ty = o.get_string("type")?;
    let value = match ty {
        "int" => PropertyValue::Int(o.get_int("value")?),
        "float" => PropertyValue::Float(o.get_float("value")?),
        "vec2" => {
            let s = o.get_string("value")?;
            let mut it = s.split_whitespace();
            let x: f32 = it.next().ok_or_else(|| anyhow::anyhow!("vec2 missing x"))?.parse()?;
            let y: f32 = it.next().ok_or_else(|| anyhow::anyhow!("vec2 missing y"))?.parse()?;
            PropertyValue::Vec2([x, y])
        }
        "vec3" => PropertyValue::Vec3(o.get_vec3("value")?),
        "vec4" => PropertyValue::Vec4(o.get_vec4("value")?),
        "mat4" => PropertyValue::Mat4(o.get_mat4("value")?),
        "custom" => PropertyValue::Custom {
            size: o.get_int("size")? as u32,
        },
        other => anyhow::bail!("unknown material property type {other:?}"),
    };
    Ok(MaterialProperty { name, value })
}

fn write_map(m: &MaterialMap) -> Object {
    let mut o = Object::new_object();
    o.set_string(Some("name"), m.name.to_string());
    o.set_string(Some("image_asset_name"), m.image_asset_name.to_string());
    o.set_string(Some("filter_min"), m.filter_min.as_str());
    o.set_string(Some("filter_mag"), m.filter_mag.as_str());
    o.set_string(Some("repeat_u"), m.repeat_u.as_str());
    o.set_string(Some("repeat_v"), m.repeat_v.as_str());
    o.set_string(Some("repeat_w"), m.repeat_w.as_str());
    if let Some(c) = m.channel {
        o.set_string(Some("channel"), c.as_str());
    }
    o
}

fn read_map(o: &Object) -> anyhow::Result<MaterialMap> {
    Ok(MaterialMap {
        name: o.get_name("name")?,
        image_asset_name: o.get_name("image_asset_name")?,
        filter_min: FilterMode::parse(o.get_string("filter_min")?)
            .ok_or_else(|| anyhow::anyhow!("invalid filter_min"))?,
        filter_mag: FilterMode::parse(o.get_string("filter_mag")?)
            .ok_or_else(|| anyhow::anyhow!("invalid filter_mag"))?,
        repeat_u: RepeatMode::parse(o.get_string("repeat_u")?)
            .ok_or_else(|| anyhow::anyhow!("invalid repeat_u"))?,
        repeat_v: RepeatMode::parse(o.get_string("repeat_v")?)
            .ok_or_else(|| anyhow::anyhow!("invalid repeat_v"))?,
        repeat_w: RepeatMode::parse(o.get_string("repeat_w")?)
            .ok_or_else(|| anyhow::anyhow!("invalid repeat_w"))?,
        channel: o.get_string("channel").ok().and_then(Channel::parse),
    })
}

/// Render `material` to BSON text.
pub fn text_serialize(material: &Material) -> String {
    let mut root = Object::new_object();
    root.set_string(Some("type"), &material.material_type);
    root.set_string(Some("name"), material.name.to_string());
    root.set_int(Some("version"), material.version as i64);
    let mut properties = Object::new_array();
    for p in &material.properties {
        properties.set_object(None, write_property(p));
    }
    root.set_object(Some("properties"), properties);
    let mut maps = Object::new_array();
    for m in &material.maps {
        maps.set_object(None, write_map(m));
    }
    root.set_object(Some("maps"), maps);
    crate::bson::write(&Tree { root })
}

/// Error parsing a [`Material`].
#[derive(Debug, thiserror::Error)]
pub enum MaterialDeserializeError {
    #[error(transparent)]
    Parse(#[from] anyhow::Error),
    #[error("material file version {0} is not supported (current is {MATERIAL_FILE_VERSION})")]
    UnsupportedVersion(u32),
}

/// Parse a material's BSON text. Versions other than
/// [`MATERIAL_FILE_VERSION`] are rejected outright.
pub fn text_deserialize(text: &str) -> Result<Material, MaterialDeserializeError> {
    let tree = crate::bson::parse_str(text)?;
    let root = &tree.root;
    let version = root
        .get_int("version")
        .map_err(|e| MaterialDeserializeError::Parse(anyhow::anyhow!("missing version: {e}")))?
        as u32;
    if version != MATERIAL_FILE_VERSION {
        return Err(MaterialDeserializeError::UnsupportedVersion(version));
    }
    let material_type = root.get_string("type").unwrap_or("").to_string();
    let name = root.get_name("name")?;

    let properties = match root.get_object("properties") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => read_property(o),
                _ => anyhow::bail!("material property entry is not an object"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    let maps = match root.get_object("maps") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => read_map(o),
                _ => anyhow::bail!("material map entry is not an object"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    Ok(Material {
        material_type,
        name,
        version,
        properties,
        maps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Material {
        Material {
            material_type: "pbr".into(),
            name: Name::new("Rock"),
            version: MATERIAL_FILE_VERSION,
            properties: vec![
                MaterialProperty {
                    name: Name::new("roughness"),
                    value: PropertyValue::Float(0.8),
                },
                MaterialProperty {
                    name: Name::new("tint"),
                    value: PropertyValue::Vec4([1.0, 1.0, 1.0, 1.0]),
                },
            ],
            maps: vec![MaterialMap {
                name: Name::new("albedo"),
                image_asset_name: Name::new("rock_albedo"),
                filter_min: FilterMode::Linear,
                filter_mag: FilterMode::Linear,
                repeat_u: RepeatMode::Repeat,
                repeat_v: RepeatMode::Repeat,
                repeat_w: RepeatMode::Clamp,
                channel: Some(Channel::R),
            }],
        }
    }

    #[test]
    fn round_trips() {
        let material = sample();
        let text = text_serialize(&material);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(decoded, material);
    }

    #[test]
    fn old_versions_are_rejected() {
        let text = "type = \"pbr\"\nname = \"Rock\"\nversion = 2\n";
        assert!(matches!(
            text_deserialize(text),
            Err(MaterialDeserializeError::UnsupportedVersion(2))
        ));
        let text = "type = \"pbr\"\nname = \"Rock\"\nversion = 1\n";
        assert!(matches!(
            text_deserialize(text),
            Err(MaterialDeserializeError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn map_name_and_channel_are_distinct_fields() {
        let material = sample();
        let text = text_serialize(&material);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(decoded.maps[0].name, Name::new("albedo"));
        assert_eq!(decoded.maps[0].channel, Some(Channel::R));
    }

    #[test]
    fn custom_property_round_trips_size_only() {
        let mut material = sample();
        material.properties.push(MaterialProperty {
            name: Name::new("blob"),
            value: PropertyValue::Custom { size: 64 },
        });
        let text = text_serialize(&material);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(
            decoded.properties.last().unwrap().value,
            PropertyValue::Custom { size: 64 }
        );
    }
}
