//! Error types for store operations

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by the triple store and the temporal layer.
///
/// All variants are local, recoverable conditions. Absence of data is
/// reported through empty results, not errors; only structural misuse
/// (empty fields) and missing version registrations produce an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A triple with an empty subject, predicate or object.
    #[error("triple components cannot be empty")]
    InvalidTriple,

    /// An empty canonical URI was passed to a versioning operation.
    #[error("canonical URI cannot be empty")]
    EmptyCanonicalUri,

    /// An empty version URI was passed to a versioning operation.
    #[error("version URI cannot be empty")]
    EmptyVersionUri,

    /// The canonical URI has no registered versions.
    #[error("no versions found for {0}")]
    NoVersionsRegistered(String),

    /// The version URI is not registered under the canonical URI.
    #[error("version {version} not found for {canonical}")]
    VersionNotFound { canonical: String, version: String },

    /// No version of the entity was valid at the requested instant.
    #[error("no version found for {uri} at {as_of}")]
    NoVersionAtTime { uri: String, as_of: DateTime<Utc> },
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
