//! A loaded package: assets bucketed by type, resolved to disk paths (spec
//! §4.7).
//!
//! Grounded on `bismuth.core/src/platform/bpackage.c`: `resolve` only
//! produces a path and a size; a distinct read step (`bytes_get`/`text_get`)
//! opens, sizes, reads, and closes the file. Bucket and entry lookups are
//! case-insensitive by name, matching the original's string comparisons.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::PackageResult;
use crate::manifest::Manifest;
use crate::name::Name;

/// One asset's location within a package.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Display name (original casing, as written in the manifest).
    pub name: String,
    /// Path to the primary (pre-built) file, relative to the package root.
    pub path: String,
    /// Path to the authoring-format source file, if any.
    pub source_path: Option<String>,
}

/// The result of [`Package::resolve`]: where an asset's bytes live and how
/// many of them there are, without having read them yet.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub full_path: PathBuf,
    pub size: u64,
}

/// A package: a name, a root directory primary/source paths are relative to,
/// and its assets bucketed by type name.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: Name,
    root_dir: PathBuf,
    buckets: HashMap<String, Vec<Entry>>,
}

impl Package {
    /// Build a package from a parsed manifest (spec §4.7 "Construction from
    /// manifest"). Each asset record is bucketed by its type-name string,
    /// case-insensitively.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut buckets: HashMap<String, Vec<Entry>> = HashMap::new();
        for asset in &manifest.assets {
            buckets
                .entry(asset.asset_type.to_ascii_lowercase())
                .or_default()
                .push(Entry {
                    name: asset.name.clone(),
                    path: asset.path.clone(),
                    source_path: asset.source_path.clone(),
                });
        }
        Package {
            name: Name::new(&manifest.package_name),
            root_dir: manifest.directory.clone(),
            buckets,
        }
    }

    /// Reserved for binary-blob-backed packages; not implemented (spec
    /// §4.7: "returns 'not supported'").
    pub fn from_binary_blob(_bytes: &[u8]) -> Result<Self, PackageResult> {
        Err(PackageResult::InternalFailure)
    }

    /// Whether the manifest lists an entry for `(type_name, asset_name)` at
    /// all, regardless of whether the file exists on disk. Used by
    /// [`crate::vfs::Vfs`] to distinguish "not in package" from "file does
    /// not exist" (spec §4.8's broader VFS result set).
    pub fn has_asset(&self, type_name: &str, asset_name: &str) -> bool {
        self.find_entry(type_name, asset_name).is_some()
    }

    /// Whether the listed entry for `(type_name, asset_name)` names a
    /// source file.
    pub fn has_source(&self, type_name: &str, asset_name: &str) -> bool {
        self.find_entry(type_name, asset_name)
            .map(|e| e.source_path.is_some())
            .unwrap_or(false)
    }

    /// The path a primary file for `(type_name, asset_name)` would live at,
    /// regardless of whether it exists yet. Used by the handler's
    /// auto-import write-back step, which creates that file for the first
    /// time (spec §4.5 step 1).
    pub fn primary_path(&self, type_name: &str, asset_name: &str) -> Option<PathBuf> {
        self.find_entry(type_name, asset_name)
            .map(|e| self.root_dir.join(&e.path))
    }

    fn find_entry(&self, type_name: &str, asset_name: &str) -> Option<&Entry> {
        let bucket = self
            .buckets
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(type_name))?
            .1;
        bucket
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(asset_name))
    }

    /// Resolve `(type_name, asset_name)` to a path and file size, without
    /// reading the file. `source` selects the source-file path instead of
    /// the primary.
    pub fn resolve(
        &self,
        type_name: &str,
        asset_name: &str,
        source: bool,
    ) -> Result<ResolvedPath, PackageResult> {
        let entry = self
            .find_entry(type_name, asset_name)
            .ok_or(PackageResult::PrimaryGetFailure)?;
        let rel = if source {
            entry
                .source_path
                .as_deref()
                .ok_or(PackageResult::SourceGetFailure)?
        } else {
            entry.path.as_str()
        };
        let full_path = self.root_dir.join(rel);
        let size = std::fs::metadata(&full_path)
            .map_err(|_| {
                if source {
                    PackageResult::SourceGetFailure
                } else {
                    PackageResult::PrimaryGetFailure
                }
            })?
            .len();
        Ok(ResolvedPath { full_path, size })
    }

    /// Read a resolved path's full contents as bytes.
    pub fn bytes_get(&self, resolved: &ResolvedPath) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(&resolved.full_path)?)
    }

    /// Read a resolved path's full contents as UTF-8 text.
    pub fn text_get(&self, resolved: &ResolvedPath) -> anyhow::Result<String> {
        Ok(std::fs::read_to_string(&resolved.full_path)?)
    }

    /// The package's root directory (manifest's containing directory).
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{AssetRecord, ReferenceRecord};
    use std::io::Write;

    fn manifest_with(dir: &Path, assets: Vec<AssetRecord>) -> Manifest {
        Manifest {
            package_name: "Runtime".into(),
            manifest_path: dir.join("asset_manifest.bson"),
            directory: dir.to_path_buf(),
            assets,
            references: Vec::<ReferenceRecord>::new(),
        }
    }

    #[test]
    fn resolve_is_case_insensitive_on_type_and_name() {
        let dir = std::env::temp_dir().join(format!("basset-pkg-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("rock.bimg");
        std::fs::File::create(&file_path).unwrap().write_all(b"abc").unwrap();

        let manifest = manifest_with(
            &dir,
            vec![AssetRecord {
                name: "Rock".into(),
                path: "rock.bimg".into(),
                source_path: None,
                asset_type: "Image".into(),
            }],
        );
        let package = Package::from_manifest(&manifest);
        let resolved = package.resolve("image", "rock", false).unwrap();
        assert_eq!(resolved.size, 3);
        let bytes = package.bytes_get(&resolved).unwrap();
        assert_eq!(bytes, b"abc");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_entry_is_primary_get_failure() {
        let dir = std::env::temp_dir();
        let manifest = manifest_with(&dir, vec![]);
        let package = Package::from_manifest(&manifest);
        assert_eq!(
            package.resolve("image", "nope", false).unwrap_err(),
            PackageResult::PrimaryGetFailure
        );
    }

    #[test]
    fn binary_blob_construction_is_not_supported() {
        assert_eq!(
            Package::from_binary_blob(&[]).unwrap_err(),
            PackageResult::InternalFailure
        );
    }
}
