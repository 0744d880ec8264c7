//! Indexed triple store
//!
//! Holds facts as subject-predicate-object triples across three redundant
//! rotations for:
//! - Facts about a subject (subject -> predicate -> object)
//! - Subjects with property = value (predicate -> object -> subject)
//! - Subjects pointing to an object (object -> subject -> predicate)

pub mod store;
pub mod triple;

pub use store::{IndexStats, TripleStore};
pub use triple::{Term, Triple, TriplePattern};
