//! Predicate vocabulary for version provenance triples.
//!
//! The temporal layer writes these predicates into the base store when
//! versions are registered, activated or superseded. The store itself
//! treats them as opaque strings like any other predicate.

/// Links a version to its canonical entity.
pub const PROP_VERSION_OF: &str = "ver:versionOf";

/// Version label (e.g. "1.0", "2024-01-15").
pub const PROP_VERSION_NUMBER: &str = "ver:versionNumber";

/// Lifecycle status of a version.
pub const PROP_VERSION_STATUS: &str = "ver:status";

/// Start of a version's validity interval.
pub const PROP_VALID_FROM: &str = "ver:validFrom";

/// End of a version's validity interval.
pub const PROP_VALID_UNTIL: &str = "ver:validUntil";

/// Links a canonical entity to its active version.
pub const PROP_CURRENT_VERSION: &str = "ver:currentVersion";

/// Indicates replacement of a previous version.
pub const PROP_SUPERSEDES: &str = "ver:supersedes";

/// Indicates being replaced (inverse).
pub const PROP_SUPERSEDED_BY: &str = "ver:supersededBy";

/// Chain link to the preceding version.
pub const PROP_PREVIOUS_VERSION: &str = "ver:previousVersion";

/// Chain link to the following version.
pub const PROP_NEXT_VERSION: &str = "ver:nextVersion";

/// Date at which a version was superseded.
pub const PROP_SUPERSEDED_DATE: &str = "ver:supersededDate";

/// Links a version to the decision event that adopted it.
pub const PROP_DECIDED_AT: &str = "ver:decidedAt";
