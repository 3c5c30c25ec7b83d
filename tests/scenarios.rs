//! End-to-end coverage of spec §8's six testable scenarios, driven through
//! the crate's public API rather than a module's internals. Each unit module
//! already exercises its own scenario at closer range; this file checks the
//! seams between them (VFS → handler → importer, manifest cycle loading).

use std::io::Write;
use std::path::{Path, PathBuf};

use basset::asset::image::ImageFormat;
use basset::asset::AssetPayload;
use basset::handler::request_asset;
use basset::error::RequestResult;
use basset::vfs::Vfs;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("basset-scenarios-{tag}-{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::File::create(path).unwrap().write_all(contents).unwrap();
}

#[test]
fn scenario_1_bson_round_trip_is_structurally_stable() {
    let text = "name = \"Rock\"\nscale = 1.5\ntags = [ \"solid\" \"heavy\" ]\n";
    let first = basset::bson::parse_str(text).unwrap();
    let rewritten = basset::bson::write(&first);
    let second = basset::bson::parse_str(&rewritten).unwrap();
    assert_eq!(first, second);
}

#[test]
fn scenario_2_image_round_trip_via_asset_payload_dispatch() {
    use basset::asset::image::Image;
    let image = Image {
        format: ImageFormat::Rgba8,
        width: 4,
        height: 2,
        mip_levels: 1,
        pixels: vec![0xAB; 32],
    };
    let payload = AssetPayload::Image(image.clone());
    let bytes = basset::asset::binary_serialize(&payload).unwrap();
    let decoded = basset::asset::binary_deserialize(payload.asset_type(), &bytes)
        .unwrap()
        .unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn scenario_4_missing_primary_present_source_auto_imports() {
    let dir = temp_dir("scenario4");
    let png_bytes = {
        let mut img = image::RgbaImage::new(3, 3);
        for px in img.pixels_mut() {
            *px = image::Rgba([1, 2, 3, 255]);
        }
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    };
    write_file(&dir.join("rock.png"), &png_bytes);
    let manifest_path = dir.join("asset_manifest.bson");
    write_file(
        &manifest_path,
        b"package_name = \"Runtime\"\nassets = [ { name = \"Rock\" path = \"rock.bimg\" source_path = \"rock.png\" type = \"Image\" } ]\n",
    );

    let vfs = Vfs::initialize(&manifest_path).unwrap();
    assert!(!dir.join("rock.bimg").exists());

    let response = request_asset(&vfs, "Runtime", "image", "Rock");
    assert_eq!(response.result, RequestResult::Success);
    assert!(dir.join("rock.bimg").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn scenario_5_manifest_cycle_loads_each_package_once() {
    let dir = temp_dir("scenario5");
    let a_path = dir.join("a/asset_manifest.bson");
    let b_path = dir.join("b/asset_manifest.bson");
    write_file(
        &a_path,
        b"package_name = \"A\"\nreferences = [ { name = \"B\" path = \"../b/asset_manifest.bson\" } ]\n",
    );
    write_file(
        &b_path,
        b"package_name = \"B\"\nreferences = [ { name = \"A\" path = \"../a/asset_manifest.bson\" } ]\n",
    );

    let vfs = Vfs::initialize(&a_path).unwrap();
    assert_eq!(vfs.package_count(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn scenario_6_v1_scene_compatibility() {
    let text = concat!(
        "properties = { description = \"x\" }\n",
        "nodes = [\n",
        "  { attachments = [ { type = \"skybox\" cubemap_name = \"sky1\" } ] }\n",
        "  { attachments = [ { type = \"terrain\" resource_name = \"hmap\" } ] }\n",
        "]\n",
    );
    let scene = basset::asset::scene::text_deserialize(text).unwrap();
    assert_eq!(scene.description.as_deref(), Some("x"));
    assert_eq!(scene.nodes.len(), 2);
}
