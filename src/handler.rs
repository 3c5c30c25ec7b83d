//! Asset handler registry and request pipeline (spec §4.5).
//!
//! Grounded on `bismuth.core/src/assets/basset_utils.c`'s
//! `asset_handler_base_on_asset_loaded`: the default handler's
//! `request_asset` delegates to the VFS, then deserializes; on
//! `file-does-not-exist` it reissues the same request with
//! `get_source = true` and, on success, runs the importer matched to the
//! source file's extension, writes the result back (best-effort), and
//! reports success either way. The system-font handler wraps this default
//! to perform its post-deserialize binary fetch
//! (`asset_handler_system_font.c`).

use std::path::Path;

use crate::asset::{self, AssetPayload, AssetTypeTag};
use crate::error::{RequestResult, VfsResult};
use crate::importer;
use crate::vfs::Vfs;

/// The outcome of [`request_asset`].
#[derive(Debug)]
pub struct AssetResponse {
    pub result: RequestResult,
    /// Present only on `Success`.
    pub payload: Option<AssetPayload>,
}

impl AssetResponse {
    fn failure(result: RequestResult) -> Self {
        AssetResponse {
            result,
            payload: None,
        }
    }

    fn success(payload: AssetPayload) -> Self {
        AssetResponse {
            result: RequestResult::Success,
            payload: Some(payload),
        }
    }
}

/// Whether `tag` has a binary serializer, and so should be requested as
/// binary bytes rather than text (spec §4.4's per-type `is_binary` hint).
fn prefers_binary(tag: AssetTypeTag) -> bool {
    matches!(
        tag,
        AssetTypeTag::Image | AssetTypeTag::StaticMesh | AssetTypeTag::BitmapFont | AssetTypeTag::Audio
    )
}

fn deserialize(tag: AssetTypeTag, bytes: Option<&[u8]>, text: Option<&str>) -> anyhow::Result<AssetPayload> {
    if let Some(bytes) = bytes {
        if let Some(result) = asset::binary_deserialize(tag, bytes) {
            return result;
        }
    }
    if let Some(text) = text {
        if let Some(result) = asset::text_deserialize(tag, text) {
            return result;
        }
    }
    anyhow::bail!("no deserializer available for {:?}", tag)
}

/// Serialize `payload` to whichever form `tag` supports (binary preferred)
/// and write it to `path`, warning rather than failing on write errors
/// (spec §4.5 step 1: "write it back via VFS (best-effort, warn-on-fail)").
fn write_back(path: &Path, payload: &AssetPayload) {
    let write_result = if let Some(bytes) = asset::binary_serialize(payload) {
        std::fs::write(path, bytes)
    } else if let Some(text) = asset::text_serialize(payload) {
        std::fs::write(path, text)
    } else {
        return;
    };
    if let Err(e) = write_result {
        tracing::warn!(path = %path.display(), error = %e, "failed to write back imported asset");
    }
}

/// Run the source-import fallback: pick an importer by the source file's
/// extension, run it, and best-effort write the primary back (spec §4.5
/// step 1).
fn run_import(
    vfs: &Vfs,
    type_name: &str,
    package_name: &str,
    asset_name: &str,
    source_path: &Path,
    source_bytes: &[u8],
) -> AssetResponse {
    let Some(extension) = source_path.extension().and_then(|e| e.to_str()) else {
        return AssetResponse::failure(RequestResult::NoHandler);
    };
    let Some(import_fn) = importer::find(type_name, extension) else {
        return AssetResponse::failure(RequestResult::NoHandler);
    };

    let output = match import_fn(source_bytes) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(%asset_name, error = %e, "importer failed");
            return AssetResponse::failure(RequestResult::AutoImportFailed);
        }
    };

    if let Some(primary_path) = vfs.primary_path(package_name, type_name, asset_name) {
        write_back(&primary_path, &output.primary);
    }

    if let Some((companion_name, companion_payload)) = &output.companion {
        if let Some(companion_path) =
            vfs.primary_path(package_name, companion_payload.asset_type().type_name(), companion_name)
        {
            write_back(&companion_path, companion_payload);
        }
    }

    AssetResponse::success(output.primary)
}

/// The default handler's request pipeline (spec §4.5): VFS fetch, then
/// either deserialize or (on a missing primary) auto-import from source.
pub fn request_asset(vfs: &Vfs, package_name: &str, type_name: &str, asset_name: &str) -> AssetResponse {
    let Some(tag) = AssetTypeTag::from_type_name(type_name) else {
        return AssetResponse::failure(RequestResult::InvalidAssetType);
    };
    if asset_name.is_empty() {
        return AssetResponse::failure(RequestResult::InvalidName);
    }

    let binary = prefers_binary(tag);
    let primary = vfs.request_asset(package_name, type_name, asset_name, binary, false);

    match primary.result {
        VfsResult::Success => match deserialize(tag, primary.bytes.as_deref(), primary.text.as_deref()) {
            Ok(payload) => finish_deserialize(vfs, package_name, asset_name, payload),
            Err(_) => AssetResponse::failure(RequestResult::ParseFailed),
        },
        VfsResult::FileDoesNotExist => {
            let source = vfs.request_asset(package_name, type_name, asset_name, true, true);
            match source.result {
                VfsResult::Success => {
                    let Some(path) = source.path.as_deref() else {
                        return AssetResponse::failure(RequestResult::InternalFailure);
                    };
                    let Some(bytes) = source.bytes.as_deref() else {
                        return AssetResponse::failure(RequestResult::InternalFailure);
                    };
                    run_import(vfs, type_name, package_name, asset_name, path, bytes)
                }
                VfsResult::SourceFileDoesNotExist => {
                    AssetResponse::failure(RequestResult::VfsRequestFailed)
                }
                other => AssetResponse::failure(other.into_request_result()),
            }
        }
        VfsResult::SourceFileDoesNotExist => AssetResponse::failure(RequestResult::VfsRequestFailed),
        other => AssetResponse::failure(other.into_request_result()),
    }
}

/// System-font's custom handler: after the default front-matter deserialize
/// succeeds, issue a secondary binary request for `ttf_asset_name` within
/// `ttf_asset_package_name` and copy its bytes into `font_binary`. Failure of
/// that secondary request fails the whole load (spec §3 line 118).
///
/// The ttf binary is requested from the font's own `system_font` type bucket
/// (a manifest registers it as a second entry under that type, alongside the
/// font's own front-matter entry, distinguished only by asset name) rather
/// than some other type — there's no separate "raw binary" bucket, and the
/// ttf file is logically part of the system font asset, not an image.
fn finish_deserialize(
    vfs: &Vfs,
    package_name: &str,
    asset_name: &str,
    payload: AssetPayload,
) -> AssetResponse {
    let AssetPayload::SystemFont(mut font) = payload else {
        return AssetResponse::success(payload);
    };
    let ttf_package = font.ttf_asset_package_name.text().unwrap_or_default();
    let ttf_name = font.ttf_asset_name.text().unwrap_or_default();
    let resolved_package = if ttf_package.is_empty() {
        package_name.to_string()
    } else {
        ttf_package
    };

    let binary = vfs.request_asset(
        &resolved_package,
        AssetTypeTag::SystemFont.type_name(),
        &ttf_name,
        true,
        false,
    );
    let Some(bytes) = binary.bytes else {
        tracing::warn!(%asset_name, "system font's ttf binary fetch failed");
        return AssetResponse::failure(RequestResult::VfsRequestFailed);
    };
    font.font_binary = bytes;
    AssetResponse::success(AssetPayload::SystemFont(font))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::image::ImageFormat;
    use std::io::Write;

    fn write_file(path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::File::create(path).unwrap().write_all(contents).unwrap();
    }

    fn manifest_text(assets: &str) -> String {
        format!("package_name = \"Runtime\"\nassets = [ {assets} ]\n")
    }

    #[test]
    fn scenario_4_missing_primary_triggers_auto_import() {
        let dir = std::env::temp_dir().join(format!("basset-handler-import-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();

        let png_bytes = {
            let mut img = ::image::RgbaImage::new(2, 2);
            for px in img.pixels_mut() {
                *px = ::image::Rgba([10, 20, 30, 255]);
            }
            let mut buf = Vec::new();
            ::image::DynamicImage::ImageRgba8(img)
                .write_to(&mut std::io::Cursor::new(&mut buf), ::image::ImageFormat::Png)
                .unwrap();
            buf
        };
        write_file(&dir.join("rock.png"), &png_bytes);

        let manifest_path = dir.join("asset_manifest.bson");
        write_file(
            &manifest_path,
            manifest_text(
                r#"{ name = "Rock" path = "rock.bimg" source_path = "rock.png" type = "Image" }"#,
            )
            .as_bytes(),
        );

        let vfs = Vfs::initialize(&manifest_path).unwrap();
        let response = request_asset(&vfs, "Runtime", "image", "Rock");
        assert_eq!(response.result, RequestResult::Success);
        match response.payload {
            Some(AssetPayload::Image(image)) => {
                assert_eq!(image.format, ImageFormat::Rgba8);
                assert_eq!((image.width, image.height), (2, 2));
            }
            other => panic!("expected image payload, got {other:?}"),
        }
        assert!(dir.join("rock.bimg").exists(), "import should write back the primary");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_source_too_is_vfs_request_failed() {
        let dir = std::env::temp_dir().join(format!("basset-handler-nosource-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        let manifest_path = dir.join("asset_manifest.bson");
        write_file(
            &manifest_path,
            manifest_text(r#"{ name = "Rock" path = "rock.bimg" type = "Image" }"#).as_bytes(),
        );

        let vfs = Vfs::initialize(&manifest_path).unwrap();
        let response = request_asset(&vfs, "Runtime", "image", "Rock");
        assert_eq!(response.result, RequestResult::VfsRequestFailed);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn system_font_fetches_ttf_binary_from_its_own_type_bucket() {
        let dir = std::env::temp_dir().join(format!("basset-handler-font-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();

        let font_text = crate::asset::system_font::text_serialize(&crate::asset::system_font::SystemFont {
            version: 1,
            ttf_asset_name: crate::name::Name::new("SansTtf"),
            ttf_asset_package_name: crate::name::Name::new("Runtime"),
            faces: vec![crate::name::Name::new("regular")],
            font_binary: Vec::new(),
        });
        write_file(&dir.join("sans.bsf"), font_text.as_bytes());
        write_file(&dir.join("sans.ttf"), &[0xAA, 0xBB, 0xCC]);

        let manifest_path = dir.join("asset_manifest.bson");
        write_file(
            &manifest_path,
            manifest_text(concat!(
                r#"{ name = "Sans" path = "sans.bsf" type = "system_font" } "#,
                r#"{ name = "SansTtf" path = "sans.ttf" type = "system_font" }"#,
            ))
            .as_bytes(),
        );

        let vfs = Vfs::initialize(&manifest_path).unwrap();
        let response = request_asset(&vfs, "Runtime", "system_font", "Sans");
        assert_eq!(response.result, RequestResult::Success);
        match response.payload {
            Some(AssetPayload::SystemFont(font)) => {
                assert_eq!(font.font_binary, vec![0xAA, 0xBB, 0xCC]);
            }
            other => panic!("expected system font payload, got {other:?}"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unknown_type_name_is_invalid_asset_type() {
        let vfs = Vfs::default();
        let response = request_asset(&vfs, "Runtime", "not-a-real-type", "Rock");
        assert_eq!(response.result, RequestResult::InvalidAssetType);
    }

    #[test]
    fn empty_asset_name_is_invalid_name() {
        let vfs = Vfs::default();
        let response = request_asset(&vfs, "Runtime", "image", "");
        assert_eq!(response.result, RequestResult::InvalidName);
    }
}
