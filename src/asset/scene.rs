//! Text scene asset (spec §4.4 "Scene (text)", §8 Scenario 6).
//!
//! Version is inferred on read, not just declared: a root-level `properties`
//! object signals a v1 file (its `description` field becomes the scene's
//! description; a legacy `name` alongside it is ignored). v2+ files declare
//! `version` directly at the root. This module always *writes* the current
//! version.

use crate::bson::{Object, ObjectKind, Tree, Value};
use crate::name::Name;

/// Current scene format version. Files declaring anything newer are
/// rejected (spec: "Versions newer than current are rejected").
pub const SCENE_VERSION: u32 = 2;

fn parse_tags(s: &str) -> Vec<Name> {
    s.split('|').filter(|p| !p.is_empty()).map(Name::new).collect()
}

fn format_tags(tags: &[Name]) -> String {
    tags.iter().map(|t| t.to_string()).collect::<Vec<_>>().join("|")
}

/// Fields common to every attachment, regardless of kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachmentCommon {
    pub name: Option<Name>,
    pub tags: Vec<Name>,
}

/// A volume attachment's bounding shape.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeShape {
    Sphere { radius: f32 },
    Rectangle { extents: [f32; 3] },
}

/// The closed set of attachment kinds (spec §4.4's attachment table).
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentKind {
    Skybox {
        cubemap_image_asset_name: Name,
        package_name: Option<Name>,
    },
    DirectionalLight {
        color: [f32; 4],
        direction: [f32; 4],
        shadow_distance: f32,
        shadow_fade_distance: f32,
        shadow_split_mult: f32,
    },
    PointLight {
        color: [f32; 4],
        position: [f32; 4],
        constant_f: f32,
        linear: f32,
        quadratic: f32,
    },
    AudioEmitter {
        audio_resource_name: Name,
        audio_resource_package_name: Name,
        volume: f32,
        is_looping: bool,
        inner_radius: f32,
        outer_radius: f32,
        falloff: f32,
        is_streaming: bool,
    },
    StaticMesh {
        asset_name: Name,
        package_name: Option<Name>,
    },
    HeightmapTerrain {
        asset_name: Name,
        package_name: Option<Name>,
    },
    WaterPlane,
    Volume {
        shape: VolumeShape,
        volume_type: String,
        on_enter: Option<String>,
        on_leave: Option<String>,
        on_update: Option<String>,
        hit_sphere_tags: Vec<Name>,
    },
    HitSphere {
        radius: f32,
    },
}

impl AttachmentKind {
    fn type_str(&self) -> &'static str {
        match self {
            AttachmentKind::Skybox { .. } => "skybox",
            AttachmentKind::DirectionalLight { .. } => "directional-light",
            AttachmentKind::PointLight { .. } => "point-light",
            AttachmentKind::AudioEmitter { .. } => "audio-emitter",
            AttachmentKind::StaticMesh { .. } => "static-mesh",
            AttachmentKind::HeightmapTerrain { .. } => "heightmap-terrain",
            AttachmentKind::WaterPlane => "water-plane",
            AttachmentKind::Volume { .. } => "volume",
            AttachmentKind::HitSphere { .. } => "hit-sphere",
        }
    }
}

/// A fully-parsed scene attachment: shared fields plus its kind-specific
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub common: AttachmentCommon,
    pub kind: AttachmentKind,
}

/// A scene graph node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: Option<Name>,
    /// Opaque transform-source string; parsed by the scene runtime, not
    /// this layer (spec §3).
    pub xform: Option<String>,
    pub attachments: Vec<Attachment>,
    pub children: Vec<Node>,
}

/// A scene asset: an optional description and a forest of nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub description: Option<String>,
    pub nodes: Vec<Node>,
}

fn write_common(o: &mut Object, c: &AttachmentCommon) {
    if let Some(name) = c.name {
        o.set_string(Some("name"), name.to_string());
    }
    if !c.tags.is_empty() {
        o.set_string(Some("tags"), format_tags(&c.tags));
    }
}

fn read_common(o: &Object) -> AttachmentCommon {
    AttachmentCommon {
        name: o.get_name("name").ok(),
        tags: o.get_string("tags").map(parse_tags).unwrap_or_default(),
    }
}

fn write_attachment(a: &Attachment) -> Object {
    let mut o = Object::new_object();
    o.set_string(Some("type"), a.kind.type_str());
    write_common(&mut o, &a.common);
    match &a.kind {
        AttachmentKind::Skybox {
            cubemap_image_asset_name,
            package_name,
        } => {
            o.set_string(Some("cubemap_image_asset_name"), cubemap_image_asset_name.to_string());
            if let Some(p) = package_name {
                o.set_string(Some("package_name"), p.to_string());
            }
        }
        AttachmentKind::DirectionalLight {
            color,
            direction,
            shadow_distance,
            shadow_fade_distance,
            shadow_split_mult,
        } => {
            o.set_vec4(Some("color"), *color);
            o.set_vec4(Some("direction"), *direction);
            o.set_float(Some("shadow_distance"), *shadow_distance);
            o.set_float(Some("shadow_fade_distance"), *shadow_fade_distance);
            o.set_float(Some("shadow_split_mult"), *shadow_split_mult);
        }
        AttachmentKind::PointLight {
            color,
            position,
            constant_f,
            linear,
            quadratic,
        } => {
            o.set_vec4(Some("color"), *color);
            o.set_vec4(Some("position"), *position);
            o.set_float(Some("constant_f"), *constant_f);
            o.set_float(Some("linear"), *linear);
            o.set_float(Some("quadratic"), *quadratic);
        }
        AttachmentKind::AudioEmitter {
            audio_resource_name,
            audio_resource_package_name,
            volume,
            is_looping,
            inner_radius,
            outer_radius,
            falloff,
            is_streaming,
        } => {
            o.set_string(Some("audio_resource_name"), audio_resource_name.to_string());
            o.set_string(
                Some("audio_resource_package_name"),
                audio_resource_package_name.to_string(),
            );
            o.set_float(Some("volume"), *volume);
            o.set_bool(Some("is_looping"), *is_looping);
            o.set_float(Some("inner_radius"), *inner_radius);
            o.set_float(Some("outer_radius"), *outer_radius);
            o.set_float(Some("falloff"), *falloff);
            o.set_bool(Some("is_streaming"), *is_streaming);
        }
        AttachmentKind::StaticMesh {
            asset_name,
            package_name,
        } => {
            o.set_string(Some("asset_name"), asset_name.to_string());
            if let Some(p) = package_name {
                o.set_string(Some("package_name"), p.to_string());
            }
        }
        AttachmentKind::HeightmapTerrain {
            asset_name,
            package_name,
        } => {
            o.set_string(Some("asset_name"), asset_name.to_string());
            if let Some(p) = package_name {
                o.set_string(Some("package_name"), p.to_string());
            }
        }
        AttachmentKind::WaterPlane => {}
        AttachmentKind::Volume {
            shape,
            volume_type,
            on_enter,
            on_leave,
            on_update,
            hit_sphere_tags,
        } => {
            match shape {
                VolumeShape::Sphere { radius } => {
                    o.set_string(Some("shape_type"), "sphere");
                    o.set_float(Some("radius"), *radius);
                }
                VolumeShape::Rectangle { extents } => {
                    o.set_string(Some("shape_type"), "rectangle");
                    o.set_vec3(Some("extents"), *extents);
                }
            }
            o.set_string(Some("volume_type"), volume_type);
            if let Some(s) = on_enter {
                o.set_string(Some("on_enter"), s);
            }
            if let Some(s) = on_leave {
                o.set_string(Some("on_leave"), s);
            }
            if let Some(s) = on_update {
                o.set_string(Some("on_update"), s);
            }
            if !hit_sphere_tags.is_empty() {
                o.set_string(Some("hit_sphere_tags"), format_tags(hit_sphere_tags));
            }
        }
        AttachmentKind::HitSphere { radius } => {
            o.set_float(Some("radius"), *radius);
        }
    }
    o
}

fn read_attachment(o: &Object) -> anyhow::Result<Attachment> {
    let common = read_common(o);
    let ty = o.get_string("type")?;
    let kind = match ty {
        "skybox" => AttachmentKind::Skybox {
            cubemap_image_asset_name: o
                .get_name("cubemap_image_asset_name")
                .or_else(|_| o.get_name("cubemap_name"))?,
            package_name: o.get_name("package_name").ok(),
        },
        "directional-light" | "directional_light" => AttachmentKind::DirectionalLight {
            color: o.get_vec4("color")?,
            direction: o.get_vec4("direction")?,
            shadow_distance: o.get_float("shadow_distance")?,
            shadow_fade_distance: o.get_float("shadow_fade_distance")?,
            shadow_split_mult: o.get_float("shadow_split_mult")?,
        },
        "point-light" | "point_light" => AttachmentKind::PointLight {
            color: o.get_vec4("color")?,
            position: o.get_vec4("position")?,
            constant_f: o.get_float("constant_f")?,
            linear: o.get_float("linear")?,
            quadratic: o.get_float("quadratic")?,
        },
        "audio-emitter" | "audio_emitter" => AttachmentKind::AudioEmitter {
            audio_resource_name: o.get_name("audio_resource_name")?,
            audio_resource_package_name: o.get_name("audio_resource_package_name")?,
            volume: o.get_float("volume").unwrap_or(1.0),
            is_looping: o.get_bool("is_looping").unwrap_or(true),
            inner_radius: o.get_float("inner_radius").unwrap_or(0.0),
            outer_radius: o.get_float("outer_radius").unwrap_or(0.0),
            falloff: o.get_float("falloff").unwrap_or(1.0),
            is_streaming: o.get_bool("is_streaming").unwrap_or(false),
        },
        "static-mesh" | "static_mesh" => AttachmentKind::StaticMesh {
            asset_name: o.get_name("asset_name").or_else(|_| o.get_name("resource_name"))?,
            package_name: o.get_name("package_name").ok(),
        },
        "heightmap-terrain" | "heightmap_terrain" | "terrain" => AttachmentKind::HeightmapTerrain {
            asset_name: o.get_name("asset_name").or_else(|_| o.get_name("resource_name"))?,
            package_name: o.get_name("package_name").ok(),
        },
        "water-plane" | "water_plane" => AttachmentKind::WaterPlane,
        "volume" => {
            let shape_type = o.get_string("shape_type")?;
            let shape = match shape_type {
                "sphere" => VolumeShape::Sphere {
                    radius: o.get_float("radius")?,
                },
                "rectangle" => VolumeShape::Rectangle {
                    extents: o.get_vec3("extents")?,
                },
                other => anyhow::bail!("unknown volume shape_type {other:?}"),
            };
            let on_enter = o.get_string("on_enter").ok().map(str::to_string);
            let on_leave = o.get_string("on_leave").ok().map(str::to_string);
            let on_update = o.get_string("on_update").ok().map(str::to_string);
            if on_enter.is_none() && on_leave.is_none() && on_update.is_none() {
                tracing::warn!("volume attachment has no enter/leave/update command strings");
            }
            AttachmentKind::Volume {
                shape,
                volume_type: o.get_string("volume_type").unwrap_or("trigger").to_string(),
                on_enter,
                on_leave,
                on_update,
                hit_sphere_tags: o.get_string("hit_sphere_tags").map(parse_tags).unwrap_or_default(),
            }
        }
        "hit-sphere" | "hit_sphere" => AttachmentKind::HitSphere {
            radius: o.get_float("radius")?,
        },
        other => anyhow::bail!("unknown scene attachment type {other:?}"),
    };
    Ok(Attachment { common, kind })
}

fn write_node(n: &Node) -> Object {
    let mut o = Object::new_object();
    if let Some(name) = n.name {
        o.set_string(Some("name"), name.to_string());
    }
    if let Some(xform) = &n.xform {
        o.set_string(Some("xform"), xform);
    }
    if !n.attachments.is_empty() {
        let mut attachments = Object::new_array();
        for a in &n.attachments {
            attachments.set_object(None, write_attachment(a));
        }
        o.set_object(Some("attachments"), attachments);
    }
    if !n.children.is_empty() {
        let mut children = Object::new_array();
        for c in &n.children {
            children.set_object(None, write_node(c));
        }
        o.set_object(Some("children"), children);
    }
    o
}

fn read_node(o: &Object) -> anyhow::Result<Node> {
    let attachments = match o.get_object("attachments") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(a) => read_attachment(a),
                _ => anyhow::bail!("attachment entry is not an object"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };
    let children = match o.get_object("children") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(c) => read_node(c),
                _ => anyhow::bail!("child node entry is not an object"),
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };
    Ok(Node {
        name: o.get_name("name").ok(),
        xform: o.get_string("xform").ok().map(str::to_string),
        attachments,
        children,
    })
}

fn read_nodes(root: &Object) -> anyhow::Result<Vec<Node>> {
    match root.get_object("nodes") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(n) => read_node(n),
                _ => anyhow::bail!("node entry is not an object"),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Render `scene` to BSON text, always in the current version's shape.
pub fn text_serialize(scene: &Scene) -> String {
    let mut root = Object::new_object();
    root.set_int(Some("version"), SCENE_VERSION as i64);
    if let Some(d) = &scene.description {
        root.set_string(Some("description"), d);
    }
    let mut nodes = Object::new_array();
    for n in &scene.nodes {
        nodes.set_object(None, write_node(n));
    }
    root.set_object(Some("nodes"), nodes);
    crate::bson::write(&Tree { root })
}

/// Error parsing a [`Scene`].
#[derive(Debug, thiserror::Error)]
pub enum SceneDeserializeError {
    #[error(transparent)]
    Parse(#[from] anyhow::Error),
    #[error("scene version {0} is newer than the supported version {SCENE_VERSION}")]
    VersionTooNew(u32),
}

/// Parse a scene's BSON text, handling both v1 (`properties.description`)
/// and v2+ (`version` + top-level `description`) shapes (spec §4.4, §8
/// Scenario 6).
pub fn text_deserialize(text: &str) -> Result<Scene, SceneDeserializeError> {
    let tree = crate::bson::parse_str(text)?;
    let root = &tree.root;

    if let Ok(properties) = root.get_object("properties") {
        // v1: description lives under `properties`; a legacy `name` beside
        // it is ignored.
        let description = properties.get_string("description").ok().map(str::to_string);
        let nodes = read_nodes(root)?;
        return Ok(Scene { description, nodes });
    }

    let version = root
        .get_int("version")
        .map_err(|e| anyhow::anyhow!("scene is missing version: {e}"))? as u32;
    if version > SCENE_VERSION {
        return Err(SceneDeserializeError::VersionTooNew(version));
    }
    let description = root.get_string("description").ok().map(str::to_string);
    let nodes = read_nodes(root)?;
    Ok(Scene { description, nodes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_current_version() {
        let scene = Scene {
            description: Some("test scene".into()),
            nodes: vec![Node {
                name: Some(Name::new("root")),
                xform: Some("identity".into()),
                attachments: vec![Attachment {
                    common: AttachmentCommon {
                        name: Some(Name::new("sky")),
                        tags: vec![Name::new("env")],
                    },
                    kind: AttachmentKind::Skybox {
                        cubemap_image_asset_name: Name::new("sky1"),
                        package_name: Some(Name::new("Runtime")),
                    },
                }],
                children: vec![],
            }],
        };
        let text = text_serialize(&scene);
        let decoded = text_deserialize(&text).unwrap();
        assert_eq!(decoded, scene);
    }

    #[test]
    fn scenario_6_v1_compatibility() {
        let src = r#"
properties = {
    description = "x"
}
nodes = [
    {
        attachments = [
            { type = "skybox" cubemap_name = "sky1" }
            { type = "terrain" asset_name = "grid" }
        ]
    }
]
"#;
        let scene = text_deserialize(src).unwrap();
        assert_eq!(scene.description.as_deref(), Some("x"));
        let attachments = &scene.nodes[0].attachments;
        match &attachments[0].kind {
            AttachmentKind::Skybox {
                cubemap_image_asset_name,
                ..
            } => assert_eq!(*cubemap_image_asset_name, Name::new("sky1")),
            other => panic!("expected skybox, got {other:?}"),
        }
        match &attachments[1].kind {
            AttachmentKind::HeightmapTerrain { asset_name, .. } => {
                assert_eq!(*asset_name, Name::new("grid"))
            }
            other => panic!("expected heightmap terrain, got {other:?}"),
        }
    }

    #[test]
    fn newer_version_is_rejected() {
        let src = format!("version = {}\nnodes = []\n", SCENE_VERSION + 1);
        assert!(matches!(
            text_deserialize(&src),
            Err(SceneDeserializeError::VersionTooNew(_))
        ));
    }

    #[test]
    fn unknown_attachment_type_fails() {
        let src = "version = 2\nnodes = [ { attachments = [ { type = \"spaceship\" } ] } ]\n";
        assert!(text_deserialize(src).is_err());
    }

    #[test]
    fn volume_without_commands_is_accepted() {
        let src = "version = 2\nnodes = [ { attachments = [ { type = \"volume\" shape_type = \"sphere\" radius = 2.0 } ] } ]\n";
        let scene = text_deserialize(src).unwrap();
        assert_eq!(scene.nodes[0].attachments.len(), 1);
    }

    #[test]
    fn tags_split_on_pipe() {
        assert_eq!(
            parse_tags("a|b|c"),
            vec![Name::new("a"), Name::new("b"), Name::new("c")]
        );
    }
}
