//! Error types for bundle generation.

use std::io;
use std::path::PathBuf;

/// Result alias used throughout the core crate.
pub type BundleResult<T> = Result<T, BundleError>;

/// Bundle generation errors.
///
/// The first three variants are the generator's own failure modes; all are
/// fatal and none are retried. The rest belong to the link map, config and
/// pipeline layers.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Source directory missing or not listable.
    #[error("source directory not readable: {}", path.display())]
    DirectoryNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A discovered application has no compiled binary.
    #[error("binary for application '{name}' missing: {}", path.display())]
    SourceBinaryMissing { name: String, path: PathBuf },

    /// Output artifact could not be created or written.
    #[error("failed to write bundle to {}", path.display())]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid or unreadable configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A symbolic reference names no label.
    #[error("unresolved symbol: {symbol}")]
    UnresolvedSymbol { symbol: String },

    /// Two labels share a name.
    #[error("duplicate symbol: {symbol}")]
    DuplicateSymbol { symbol: String },

    /// A linked image does not follow the bundle layout.
    #[error("malformed bundle image: {message}")]
    MalformedImage { message: String },

    /// An external pipeline step exited unsuccessfully.
    #[error("{step} step failed with {status}")]
    StepFailed { step: String, status: String },

    /// An external pipeline step could not be started.
    #[error("failed to start {step} step")]
    StepSpawn {
        step: String,
        #[source]
        source: io::Error,
    },
}

impl BundleError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedImage {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // External tool reported failure
            Self::StepFailed { .. } => 1,

            // Everything else aborts the build step
            Self::DirectoryNotFound { .. }
            | Self::SourceBinaryMissing { .. }
            | Self::OutputWriteError { .. }
            | Self::Config { .. }
            | Self::UnresolvedSymbol { .. }
            | Self::DuplicateSymbol { .. }
            | Self::MalformedImage { .. }
            | Self::StepSpawn { .. } => 2,
        }
    }
}
