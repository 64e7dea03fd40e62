//! Errors raised by the teardown pipeline.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::context::ContextError;
use crate::resource::ResourceKind;
use crate::state::StateError;

/// Failure that stops teardown, or a failure to resolve resource names.
#[derive(Debug, Error)]
pub enum TeardownError {
    /// Raised when a request field is blank or unsafe.
    #[error(transparent)]
    InvalidRequest(#[from] ContextError),
    /// Raised when the bucket recorded by the live storage location cannot be
    /// read. Nothing has been deleted when this is returned.
    #[error("failed to discover bucket from storage location {storage_location}: {source}")]
    BucketDiscovery {
        /// Storage location that was read.
        storage_location: String,
        /// Underlying failure.
        #[source]
        source: StateError,
    },
    /// Raised when the names of a resource kind cannot be resolved.
    #[error("failed to resolve {kind} names: {source}")]
    Resolve {
        /// Kind being resolved.
        kind: ResourceKind,
        /// Underlying failure.
        #[source]
        source: StateError,
    },
    /// Raised when a manifest file cannot be read.
    #[error("failed to read manifest {path}: {message}")]
    ManifestIo {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Error message.
        message: String,
    },
    /// Raised when a manifest file is not valid YAML.
    #[error("failed to parse manifest {path}: {message}")]
    ManifestParse {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Parser error message.
        message: String,
    },
}
