//! The closed result taxonomies from spec §7, plus the narrower per-layer
//! result codes each layer translates into the one above it.
//!
//! These are small tagged unions (`#[derive(Debug, Clone, Copy, PartialEq,
//! Eq)]` enums), not `anyhow::Error`, because they are part of the public
//! contract callers match on (e.g. the handler pipeline's retry-on-missing-
//! primary logic in [`crate::handler`]). Operational failures that don't fit
//! the taxonomy (I/O errors, malformed files) are reported as `anyhow::Error`
//! alongside the nearest matching code.

use std::fmt;

/// Result of a VFS-level request (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfsResult {
    /// The requested bytes/text were found and returned.
    Success,
    /// The primary asset file does not exist.
    FileDoesNotExist,
    /// A source-file request (`get_source = true`) found no source file.
    SourceFileDoesNotExist,
    /// The named asset is not present in the package's manifest.
    NotInPackage,
    /// No package by that name has been loaded.
    PackageDoesNotExist,
    /// The file exists but could not be read.
    ReadError,
    /// A write-back (e.g. after auto-import) failed.
    WriteError,
    /// Any other failure not covered above.
    InternalFailure,
}

impl fmt::Display for VfsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VfsResult::Success => "success",
            VfsResult::FileDoesNotExist => "file-does-not-exist",
            VfsResult::SourceFileDoesNotExist => "source-file-does-not-exist",
            VfsResult::NotInPackage => "not-in-package",
            VfsResult::PackageDoesNotExist => "package-does-not-exist",
            VfsResult::ReadError => "read-error",
            VfsResult::WriteError => "write-error",
            VfsResult::InternalFailure => "internal-failure",
        };
        f.write_str(s)
    }
}

/// Result of a [`crate::package::Package`]-level operation (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageResult {
    /// The operation succeeded.
    Success,
    /// Fetching the primary asset entry failed.
    PrimaryGetFailure,
    /// Fetching the source asset entry failed.
    SourceGetFailure,
    /// Any other failure.
    InternalFailure,
}

impl fmt::Display for PackageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageResult::Success => "success",
            PackageResult::PrimaryGetFailure => "primary-get-failure",
            PackageResult::SourceGetFailure => "source-get-failure",
            PackageResult::InternalFailure => "internal-failure",
        };
        f.write_str(s)
    }
}

/// Result of a request through the asset handler registry (spec §4.5, §7).
///
/// This is the outermost taxonomy: every narrower result above gets mapped
/// into one of these before reaching the user callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestResult {
    /// The asset was resolved and deserialized (or imported) successfully.
    Success,
    /// No package by the requested name is loaded.
    InvalidPackage,
    /// No handler is registered for the requested asset type.
    InvalidAssetType,
    /// The requested asset name is empty or otherwise malformed.
    InvalidName,
    /// A serializer's deserialize step failed.
    ParseFailed,
    /// Reserved for handlers that hand data to the GPU; unused by this
    /// layer, carried because spec §7 lists it as part of the closed set.
    GpuUploadFailed,
    /// An unexpected internal failure.
    InternalFailure,
    /// No handler or importer could process this request.
    NoHandler,
    /// The underlying VFS request failed in a way that isn't recoverable by
    /// auto-import.
    VfsRequestFailed,
    /// The source file was found but the importer failed.
    AutoImportFailed,
}

impl fmt::Display for RequestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestResult::Success => "success",
            RequestResult::InvalidPackage => "invalid-package",
            RequestResult::InvalidAssetType => "invalid-asset-type",
            RequestResult::InvalidName => "invalid-name",
            RequestResult::ParseFailed => "parse-failed",
            RequestResult::GpuUploadFailed => "gpu-upload-failed",
            RequestResult::InternalFailure => "internal-failure",
            RequestResult::NoHandler => "no-handler",
            RequestResult::VfsRequestFailed => "vfs-request-failed",
            RequestResult::AutoImportFailed => "auto-import-failed",
        };
        f.write_str(s)
    }
}

impl VfsResult {
    /// Translate a VFS result into the outer request taxonomy for the cases
    /// the default handler doesn't attempt to recover from itself (spec
    /// §4.5 step 4, §7 propagation policy).
    pub fn into_request_result(self) -> RequestResult {
        match self {
            VfsResult::Success => RequestResult::Success,
            VfsResult::PackageDoesNotExist => RequestResult::InvalidPackage,
            VfsResult::NotInPackage => RequestResult::InvalidName,
            VfsResult::FileDoesNotExist | VfsResult::SourceFileDoesNotExist => {
                RequestResult::VfsRequestFailed
            }
            VfsResult::ReadError | VfsResult::WriteError | VfsResult::InternalFailure => {
                RequestResult::InternalFailure
            }
        }
    }
}
