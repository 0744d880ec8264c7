//! In-memory triple store with temporal versioning.
//!
//! Facts are held as subject-predicate-object triples across three
//! synchronized index rotations, so any combination of bound and wildcard
//! query fields resolves through the most selective one instead of a full
//! scan. A temporal layer superimposes named graphs, per-entity version
//! registries, point-in-time queries and version diffing.
//!
//! ```
//! use chronograph::TripleStore;
//!
//! let store = TripleStore::new();
//! store.add("doc:A", "rdf:type", "Article")?;
//! assert_eq!(store.find(Some("doc:A"), None, None).len(), 1);
//! assert_eq!(store.delete(Some("doc:A"), Some("rdf:type"), Some("Article")), 1);
//! assert!(!store.exists("doc:A", "rdf:type", "Article"));
//! # Ok::<(), chronograph::StoreError>(())
//! ```

pub mod error;
pub mod graph;
pub mod temporal;
pub mod vocab;

pub use error::{Result, StoreError};
pub use graph::{IndexStats, Term, Triple, TriplePattern, TripleStore};
pub use temporal::{
    TemporalQueryResult, TemporalStats, TemporalStore, TripleChange, VersionDiff, VersionHistory,
    VersionInfo, VersionStatus,
};
