//! Temporal versioning over named graphs
//!
//! Superimposes version history and time-travel queries on the triple
//! store:
//! - Named graphs isolating one version's triples
//! - Per-entity version registries ordered by validity start
//! - Point-in-time queries and version diffing

pub mod models;
pub mod store;

pub use models::{
    TemporalQueryResult, TemporalStats, TripleChange, VersionDiff, VersionHistory, VersionInfo,
    VersionStatus,
};
pub use store::TemporalStore;
