//! Data models for the temporal versioning layer

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{IndexStats, Term, Triple};

/// Lifecycle status of a version.
///
/// Transitions are driven by `set_current_version` (any -> active, the
/// previously active version -> superseded) and `supersede_version`
/// (target -> superseded). `Withdrawn` is a recognized terminal state but
/// no operation currently produces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    #[default]
    Draft,
    Active,
    Superseded,
    Withdrawn,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Draft => "draft",
            VersionStatus::Active => "active",
            VersionStatus::Superseded => "superseded",
            VersionStatus::Withdrawn => "withdrawn",
        }
    }

    /// True for states that can no longer become active.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VersionStatus::Superseded | VersionStatus::Withdrawn)
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata about one version of a canonical entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// The version-specific URI.
    pub uri: Term,

    /// The version label (e.g. "1.0", "2024-01-15").
    pub version: String,

    /// When this version became valid.
    pub valid_from: DateTime<Utc>,

    /// When this version ceased to be valid (`None` if still open-ended).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    /// The named graph holding this version's triples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_name: Option<String>,

    /// URI of the version this one replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supersedes_uri: Option<Term>,

    /// URI of the version that replaced this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by_uri: Option<Term>,

    pub status: VersionStatus,

    /// The decision event (meeting) where this version was adopted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_uri: Option<Term>,
}

impl VersionInfo {
    pub fn new(
        uri: impl Into<Term>,
        version: impl Into<String>,
        valid_from: DateTime<Utc>,
    ) -> Self {
        Self {
            uri: uri.into(),
            version: version.into(),
            valid_from,
            valid_until: None,
            graph_name: None,
            supersedes_uri: None,
            superseded_by_uri: None,
            status: VersionStatus::Draft,
            meeting_uri: None,
        }
    }

    pub fn with_status(mut self, status: VersionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_valid_until(mut self, valid_until: DateTime<Utc>) -> Self {
        self.valid_until = Some(valid_until);
        self
    }

    pub fn with_graph(mut self, graph_name: impl Into<String>) -> Self {
        self.graph_name = Some(graph_name.into());
        self
    }

    pub fn with_supersedes(mut self, uri: impl Into<Term>) -> Self {
        self.supersedes_uri = Some(uri.into());
        self
    }

    pub fn with_meeting(mut self, uri: impl Into<Term>) -> Self {
        self.meeting_uri = Some(uri.into());
        self
    }

    /// True when this version covers `at`: `valid_from <= at < valid_until`,
    /// with an unset `valid_until` treated as open-ended.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && self.valid_until.map_or(true, |until| until > at)
    }
}

/// The complete version history for an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionHistory {
    /// The abstract, version-independent URI for the entity.
    pub canonical_uri: Term,

    /// The currently active version, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<VersionInfo>,

    /// All versions in chronological order (ascending by `valid_from`).
    pub versions: Vec<VersionInfo>,
}

/// Results from a point-in-time query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalQueryResult {
    /// The instant the query was evaluated at.
    pub as_of: DateTime<Utc>,

    /// The version that was valid at that instant, when the subject was
    /// bound and resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionInfo>,

    pub triples: Vec<Triple>,
}

/// A change in a predicate's object value between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleChange {
    pub predicate: Term,
    pub old_object: Term,
    pub new_object: Term,
}

/// Differences between the direct triples of two versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDiff {
    /// The first (older) version.
    pub version1_uri: Term,

    /// The second (newer) version.
    pub version2_uri: Term,

    /// Predicates present in v2 but not v1.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<Triple>,

    /// Predicates present in v1 but not v2.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<Triple>,

    /// Predicates present in both with different object values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<TripleChange>,
}

impl VersionDiff {
    /// Short text summary of the diff.
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} removed, {} modified",
            self.added.len(),
            self.removed.len(),
            self.modified.len()
        )
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Statistics about the temporal store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalStats {
    /// Stats from the base triple store.
    pub base_stats: IndexStats,

    /// Number of named graphs.
    pub graph_count: usize,

    /// Entities with version history.
    pub versioned_entities: usize,

    /// Total versions across all entities.
    pub total_versions: usize,

    /// Versions currently carrying active status.
    pub active_versions: usize,
}
