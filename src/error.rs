//! Error types for provisioning and validation setup.
//!
//! Setup and invocation failures are fatal for a validation pass. Chunk
//! parse failures live in [`crate::output::ParseError`] and are recoverable.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that prevent a validation pass from starting, or that abort
/// provisioning of the tool binary.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unsupported platform: {os} {arch}")]
    UnsupportedPlatform { os: String, arch: String },
    #[error("invalid release url: {0}")]
    InvalidUrl(String),
    #[error("failed to fetch release metadata from {url}: {reason}")]
    MetadataFetch { url: String, reason: String },
    #[error("failed to parse release metadata: {0}")]
    MetadataParse(String),
    #[error("release {tag} has no asset matching '{asset}'")]
    AssetNotFound { tag: String, asset: String },
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("failed to extract {archive}: {reason}")]
    Extract { archive: String, reason: String },
    #[error("archive does not contain the '{0}' executable")]
    MissingExecutable(String),
    #[error("datree binary not found at {0}. Run `datree-validator install` first.")]
    BinaryMissing(PathBuf),
    #[error("datree binary at {0} is not executable")]
    BinaryNotExecutable(PathBuf),
}

/// Failures while running the tool against a manifest.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("failed to run {binary} for {manifest}: {source}")]
    Spawn {
        binary: PathBuf,
        manifest: String,
        #[source]
        source: io::Error,
    },
    #[error("datree exited with unexpected status {status} for {manifest}")]
    UnexpectedStatus { manifest: String, status: String },
}
