//! The virtual file system over loaded packages (spec §4.8).
//!
//! Grounded on `bismuth.core/src/platform/vfs.c`: `initialize` parses a
//! primary manifest and recursively loads its references, skipping any
//! package name already loaded (spec §8 Scenario 5, the manifest-cycle
//! case). Requests are synchronous today; spec §5 documents this as
//! "to be jobified" and asks implementers to preserve the
//! fire-callback-exactly-once contract if they lift it onto a worker pool —
//! this crate keeps it synchronous and returns a result directly rather than
//! inventing a callback/worker-pool layer the spec explicitly marks as
//! future work.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::VfsResult;
use crate::manifest::Manifest;
use crate::package::Package;

/// The outcome of a [`Vfs::request_asset`] or
/// [`Vfs::request_direct_from_disk`] call (spec §4.8's result struct).
#[derive(Debug, Clone)]
pub struct VfsResponse {
    pub asset_name: String,
    pub package_name: String,
    pub size: u64,
    pub bytes: Option<Vec<u8>>,
    pub text: Option<String>,
    pub path: Option<PathBuf>,
    pub result: VfsResult,
}

impl VfsResponse {
    fn failure(asset_name: &str, package_name: &str, result: VfsResult) -> Self {
        VfsResponse {
            asset_name: asset_name.to_string(),
            package_name: package_name.to_string(),
            size: 0,
            bytes: None,
            text: None,
            path: None,
            result,
        }
    }
}

/// Owns every loaded package. Built once via [`Vfs::initialize`], torn down
/// via [`Vfs::shutdown`]; between the two its package list is read-only
/// (spec §5: "no lock is needed on the hot path").
#[derive(Debug, Default)]
pub struct Vfs {
    packages: Vec<Package>,
}

fn load_recursive(
    manifest_path: &Path,
    packages: &mut Vec<Package>,
    loaded_names: &mut HashSet<String>,
) -> anyhow::Result<()> {
    let manifest: Manifest = crate::manifest::load(manifest_path)?;
    let key = manifest.package_name.to_ascii_lowercase();
    if loaded_names.contains(&key) {
        tracing::trace!(package = %manifest.package_name, "skipping already-loaded package reference");
        return Ok(());
    }
    loaded_names.insert(key);
    let directory = manifest.directory.clone();
    let references = manifest.references.clone();
    packages.push(Package::from_manifest(&manifest));

    for reference in references {
        let ref_path = directory.join(&reference.path);
        load_recursive(&ref_path, packages, loaded_names)?;
    }
    Ok(())
}

impl Vfs {
    /// Load `manifest_path` as the primary manifest and recursively load
    /// every package it (transitively) references, each package name
    /// loaded at most once (spec §4.8, §3 "A reference chain never revisits
    /// a package"). The manifest path is a constructor parameter, not a
    /// hard-coded constant (resolving spec §9's open question about
    /// `"../testbed.bapp/asset_manifest.bson"`).
    pub fn initialize(manifest_path: &Path) -> anyhow::Result<Self> {
        let mut packages = Vec::new();
        let mut loaded_names = HashSet::new();
        load_recursive(manifest_path, &mut packages, &mut loaded_names)?;
        Ok(Vfs { packages })
    }

    /// Drop every loaded package.
    pub fn shutdown(&mut self) {
        self.packages.clear();
    }

    /// Number of currently loaded packages.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    fn find_package(&self, package_name: &str) -> Option<&Package> {
        let target = crate::name::Name::new(package_name);
        self.packages.iter().find(|p| p.name == target)
    }

    /// Resolve and read `(package_name, type_name, asset_name)`. `binary`
    /// selects `bytes` vs `text` in the response; `source` requests the
    /// authoring-format file instead of the primary.
    pub fn request_asset(
        &self,
        package_name: &str,
        type_name: &str,
        asset_name: &str,
        binary: bool,
        source: bool,
    ) -> VfsResponse {
        let Some(package) = self.find_package(package_name) else {
            return VfsResponse::failure(asset_name, package_name, VfsResult::PackageDoesNotExist);
        };
        if !package.has_asset(type_name, asset_name) {
            return VfsResponse::failure(asset_name, package_name, VfsResult::NotInPackage);
        }
        if source && !package.has_source(type_name, asset_name) {
            return VfsResponse::failure(
                asset_name,
                package_name,
                VfsResult::SourceFileDoesNotExist,
            );
        }

        let resolved = match package.resolve(type_name, asset_name, source) {
            Ok(r) => r,
            Err(_) if source => {
                return VfsResponse::failure(
                    asset_name,
                    package_name,
                    VfsResult::SourceFileDoesNotExist,
                )
            }
            Err(_) => {
                return VfsResponse::failure(asset_name, package_name, VfsResult::FileDoesNotExist)
            }
        };

        let (bytes, text, result) = if binary {
            match package.bytes_get(&resolved) {
                Ok(b) => (Some(b), None, VfsResult::Success),
                Err(e) => {
                    tracing::warn!(%asset_name, error = %e, "read error fetching asset bytes");
                    (None, None, VfsResult::ReadError)
                }
            }
        } else {
            match package.text_get(&resolved) {
                Ok(t) => (None, Some(t), VfsResult::Success),
                Err(e) => {
                    tracing::warn!(%asset_name, error = %e, "read error fetching asset text");
                    (None, None, VfsResult::ReadError)
                }
            }
        };

        VfsResponse {
            asset_name: asset_name.to_string(),
            package_name: package_name.to_string(),
            size: resolved.size,
            bytes,
            text,
            path: Some(resolved.full_path),
            result,
        }
    }

    /// Where a primary file for `(package_name, type_name, asset_name)`
    /// would live, whether or not it exists yet (spec §4.5 step 1's
    /// write-back target after a successful auto-import).
    pub fn primary_path(&self, package_name: &str, type_name: &str, asset_name: &str) -> Option<PathBuf> {
        self.find_package(package_name)?.primary_path(type_name, asset_name)
    }

    /// Read a file directly by path, bypassing the package index
    /// (spec §4.8 `request_direct_from_disk`). The response's
    /// `package_name` is left empty; `asset_name` is derived from the
    /// filename stem.
    pub fn request_direct_from_disk(&self, path: &Path, binary: bool) -> VfsResponse {
        let asset_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        if !path.exists() {
            return VfsResponse::failure(&asset_name, "", VfsResult::FileDoesNotExist);
        }
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let (bytes, text, result) = if binary {
            match std::fs::read(path) {
                Ok(b) => (Some(b), None, VfsResult::Success),
                Err(_) => (None, None, VfsResult::ReadError),
            }
        } else {
            match std::fs::read_to_string(path) {
                Ok(t) => (None, Some(t), VfsResult::Success),
                Err(_) => (None, None, VfsResult::ReadError),
            }
        };
        VfsResponse {
            asset_name,
            package_name: String::new(),
            size,
            bytes,
            text,
            path: Some(path.to_path_buf()),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::File::create(path).unwrap().write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn scenario_5_manifest_cycle_loads_each_package_once() {
        let dir = std::env::temp_dir().join(format!("basset-vfs-cycle-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        let a_path = dir.join("a/asset_manifest.bson");
        let b_path = dir.join("b/asset_manifest.bson");
        write_file(
            &a_path,
            "package_name = \"A\"\nreferences = [ { name = \"B\" path = \"../b/asset_manifest.bson\" } ]\n",
        );
        write_file(
            &b_path,
            "package_name = \"B\"\nreferences = [ { name = \"A\" path = \"../a/asset_manifest.bson\" } ]\n",
        );

        let vfs = Vfs::initialize(&a_path).unwrap();
        assert_eq!(vfs.package_count(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn request_for_unloaded_package_fails() {
        let vfs = Vfs::default();
        let response = vfs.request_asset("Nope", "image", "rock", true, false);
        assert_eq!(response.result, VfsResult::PackageDoesNotExist);
    }

    #[test]
    fn direct_from_disk_derives_name_from_stem() {
        let dir = std::env::temp_dir().join(format!("basset-vfs-direct-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rock.txt");
        write_file(&path, "hello");

        let vfs = Vfs::default();
        let response = vfs.request_direct_from_disk(&path, false);
        assert_eq!(response.result, VfsResult::Success);
        assert_eq!(response.asset_name, "rock");
        assert_eq!(response.package_name, "");
        assert_eq!(response.text.as_deref(), Some("hello"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
