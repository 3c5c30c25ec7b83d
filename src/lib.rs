//! Asset pipeline core: a virtual file system over named packages, a
//! hand-written BSON text config language, and per-type asset serializers.

#![warn(missing_docs)]
#![cfg_attr(doc, allow(unknown_lints))]

/// Helper to export the same types in the crate root and in the prelude.
macro_rules! pub_use {
    () => {
        pub use crate::asset::*;
        pub use crate::binary::{BinaryHeader, HeaderError};
        pub use crate::error::{PackageResult, RequestResult, VfsResult};
        pub use crate::handler::{request_asset, AssetResponse};
        pub use crate::manifest::Manifest;
        pub use crate::name::{Name, StringId};
        pub use crate::package::Package;
        pub use crate::vfs::{Vfs, VfsResponse};
        pub use anyhow;
    };
}
pub_use!();

/// Re-exports of the crate's public surface, for `use basset::prelude::*`.
pub mod prelude {
    pub_use!();
}

pub mod asset;
pub mod binary;
pub mod bson;
pub mod error;
pub mod handler;
pub mod importer;
pub mod manifest;
pub mod name;
pub mod package;
pub mod vfs;
