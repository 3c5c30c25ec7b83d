//! Package manifest loading (spec §4.7's input, §6 "Package manifest file").
//!
//! A manifest is a BSON text file listing a package's assets and its
//! references to other packages, parsed with [`crate::bson`].

use std::path::{Path, PathBuf};

use crate::bson::{Object, ObjectKind, Value};

/// One asset listed in a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub name: String,
    pub path: String,
    pub source_path: Option<String>,
    pub asset_type: String,
}

/// One reference to another package's manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub name: String,
    pub path: String,
}

/// A parsed `.bpackage` manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub package_name: String,
    /// The manifest file's own path.
    pub manifest_path: PathBuf,
    /// The manifest's containing directory; asset/reference paths are
    /// relative to this.
    pub directory: PathBuf,
    pub assets: Vec<AssetRecord>,
    pub references: Vec<ReferenceRecord>,
}

fn read_asset_records(root: &Object) -> anyhow::Result<Vec<AssetRecord>> {
    match root.get_object("assets") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => Ok(AssetRecord {
                    name: o.get_string("name")?.to_string(),
                    path: o.get_string("path")?.to_string(),
                    source_path: o.get_string("source_path").ok().map(str::to_string),
                    asset_type: o.get_string("type")?.to_string(),
                }),
                _ => anyhow::bail!("assets entry is not an object"),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

fn read_reference_records(root: &Object) -> anyhow::Result<Vec<ReferenceRecord>> {
    match root.get_object("references") {
        Ok(arr) if arr.kind == ObjectKind::Array => arr
            .elements()
            .map(|v| match v {
                Value::Object(o) => Ok(ReferenceRecord {
                    name: o.get_string("name")?.to_string(),
                    path: o.get_string("path")?.to_string(),
                }),
                _ => anyhow::bail!("references entry is not an object"),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Parse manifest text already read from `manifest_path`.
pub fn parse(text: &str, manifest_path: &Path) -> anyhow::Result<Manifest> {
    let tree = crate::bson::parse_str(text)?;
    let root = &tree.root;
    let package_name = root.get_string("package_name")?.to_string();
    let assets = read_asset_records(root)?;
    let references = read_reference_records(root)?;
    let directory = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(Manifest {
        package_name,
        manifest_path: manifest_path.to_path_buf(),
        directory,
        assets,
        references,
    })
}

/// Read and parse a manifest from disk.
pub fn load(manifest_path: &Path) -> anyhow::Result<Manifest> {
    let text = std::fs::read_to_string(manifest_path)?;
    parse(&text, manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assets_and_references() {
        let text = r#"
package_name = "Runtime"
references = [
    { name = "Shared" path = "../shared/asset_manifest.bson" }
]
assets = [
    { name = "Rock" path = "rock.bimg" source_path = "rock.png" type = "Image" }
]
"#;
        let manifest = parse(text, Path::new("/game/runtime/asset_manifest.bson")).unwrap();
        assert_eq!(manifest.package_name, "Runtime");
        assert_eq!(manifest.directory, Path::new("/game/runtime"));
        assert_eq!(manifest.references.len(), 1);
        assert_eq!(manifest.references[0].name, "Shared");
        assert_eq!(manifest.assets.len(), 1);
        assert_eq!(manifest.assets[0].source_path.as_deref(), Some("rock.png"));
    }

    #[test]
    fn missing_arrays_are_empty_not_errors() {
        let text = "package_name = \"Bare\"\n";
        let manifest = parse(text, Path::new("/x/asset_manifest.bson")).unwrap();
        assert!(manifest.assets.is_empty());
        assert!(manifest.references.is_empty());
    }
}
