//! Temporal versioning layer over the triple store

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use super::models::*;
use crate::error::{Result, StoreError};
use crate::graph::{Term, TripleStore};
use crate::vocab;

/// Versioning layer over a [`TripleStore`].
///
/// Named graphs isolate one version's triples from the shared base store,
/// and a version registry maps each canonical URI to its chronologically
/// ordered versions. The registry lock is separate from each store's own
/// lock, so a registry update and its provenance triples become visible
/// independently: consistency between the two layers is best-effort, not
/// transactional.
#[derive(Default)]
pub struct TemporalStore {
    base: TripleStore,
    state: RwLock<TemporalState>,
}

#[derive(Default)]
struct TemporalState {
    graphs: HashMap<String, Arc<TripleStore>>,
    versions: HashMap<Term, Vec<VersionInfo>>,
}

impl TemporalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing store with versioning capabilities.
    pub fn with_store(base: TripleStore) -> Self {
        Self {
            base,
            state: RwLock::new(TemporalState::default()),
        }
    }

    /// The base store holding the current (non-versioned) state.
    pub fn base(&self) -> &TripleStore {
        &self.base
    }

    /// Creates a named graph, returning the existing instance if one was
    /// already created under that name.
    pub fn create_graph(&self, name: &str) -> Arc<TripleStore> {
        let mut state = self.state.write().unwrap();
        match state.graphs.get(name) {
            Some(graph) => Arc::clone(graph),
            None => {
                let graph = Arc::new(TripleStore::new());
                state.graphs.insert(name.to_string(), Arc::clone(&graph));
                info!(graph = name, "created named graph");
                graph
            }
        }
    }

    pub fn get_graph(&self, name: &str) -> Option<Arc<TripleStore>> {
        self.state.read().unwrap().graphs.get(name).map(Arc::clone)
    }

    /// Names of all named graphs, sorted for deterministic output.
    pub fn list_graphs(&self) -> Vec<String> {
        let state = self.state.read().unwrap();
        let mut names: Vec<String> = state.graphs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Removes a named graph. Returns true if it existed.
    pub fn delete_graph(&self, name: &str) -> bool {
        let removed = self.state.write().unwrap().graphs.remove(name).is_some();
        if removed {
            info!(graph = name, "deleted named graph");
        }
        removed
    }

    /// Adds a triple to a named graph, creating the graph if needed.
    pub fn add_versioned(
        &self,
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
        graph_name: &str,
    ) -> Result<()> {
        self.create_graph(graph_name).add(subject, predicate, object)
    }

    /// Registers a new version for an entity and writes its provenance
    /// triples into the base store. Additive: earlier provenance triples
    /// are never removed.
    pub fn add_version(&self, canonical_uri: impl Into<Term>, version: VersionInfo) -> Result<()> {
        let canonical = canonical_uri.into();
        if canonical.is_empty() {
            return Err(StoreError::EmptyCanonicalUri);
        }
        if version.uri.is_empty() {
            return Err(StoreError::EmptyVersionUri);
        }

        {
            let mut state = self.state.write().unwrap();
            let versions = state.versions.entry(canonical.clone()).or_default();
            versions.push(version.clone());
            versions.sort_by_key(|v| v.valid_from);
        }

        debug!(canonical = %canonical, version = %version.uri, "registered version");

        // Registry and base store are guarded by separate locks; the
        // provenance below lands in its own critical section.
        let uri = &version.uri;
        self.base.add(uri.clone(), vocab::PROP_VERSION_OF, canonical)?;
        if !version.version.is_empty() {
            self.base
                .add(uri.clone(), vocab::PROP_VERSION_NUMBER, version.version.as_str())?;
        }
        self.base
            .add(uri.clone(), vocab::PROP_VERSION_STATUS, version.status.as_str())?;
        self.base
            .add(uri.clone(), vocab::PROP_VALID_FROM, rfc3339(version.valid_from))?;
        if let Some(until) = version.valid_until {
            self.base
                .add(uri.clone(), vocab::PROP_VALID_UNTIL, rfc3339(until))?;
        }
        if let Some(supersedes) = &version.supersedes_uri {
            self.base
                .add(uri.clone(), vocab::PROP_SUPERSEDES, supersedes.clone())?;
            self.base
                .add(supersedes.clone(), vocab::PROP_SUPERSEDED_BY, uri.clone())?;
        }
        if let Some(meeting) = &version.meeting_uri {
            self.base
                .add(uri.clone(), vocab::PROP_DECIDED_AT, meeting.clone())?;
        }

        Ok(())
    }

    /// Marks `version_uri` as the active version of `canonical_uri`. The
    /// previously active version, if any, transitions to superseded and
    /// gets its validity closed when still open.
    pub fn set_current_version(&self, canonical_uri: &str, version_uri: &str) -> Result<()> {
        {
            let mut state = self.state.write().unwrap();
            let versions = state
                .versions
                .get_mut(canonical_uri)
                .ok_or_else(|| StoreError::NoVersionsRegistered(canonical_uri.to_string()))?;

            if !versions.iter().any(|v| v.uri.as_str() == version_uri) {
                return Err(StoreError::VersionNotFound {
                    canonical: canonical_uri.to_string(),
                    version: version_uri.to_string(),
                });
            }

            for version in versions.iter_mut() {
                if version.uri.as_str() == version_uri {
                    version.status = VersionStatus::Active;
                } else if version.status == VersionStatus::Active {
                    supersede(version, None);
                }
            }
        }

        self.base
            .add(canonical_uri, vocab::PROP_CURRENT_VERSION, version_uri)?;
        self.base
            .add(version_uri, vocab::PROP_VERSION_STATUS, VersionStatus::Active.as_str())?;
        info!(canonical = canonical_uri, version = version_uri, "set current version");
        Ok(())
    }

    /// The complete version history for an entity, with versions in
    /// chronological order.
    pub fn get_version_history(&self, canonical_uri: &str) -> Result<VersionHistory> {
        let state = self.state.read().unwrap();
        let versions = state
            .versions
            .get(canonical_uri)
            .ok_or_else(|| StoreError::NoVersionsRegistered(canonical_uri.to_string()))?;

        Ok(VersionHistory {
            canonical_uri: Term::from(canonical_uri),
            current_version: versions
                .iter()
                .find(|v| v.status == VersionStatus::Active)
                .cloned(),
            versions: versions.clone(),
        })
    }

    /// Finds triples valid at `as_of`.
    ///
    /// A bound subject resolves to the version valid at that instant: the
    /// version's named graph is queried when it has one, and the version
    /// URI is substituted in the base store when it differs from the
    /// subject. Otherwise the query falls through to a validity-filtered
    /// scan of the base store and every named graph.
    pub fn query_at_time(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
        as_of: DateTime<Utc>,
    ) -> TemporalQueryResult {
        let state = self.state.read().unwrap();

        let mut result = TemporalQueryResult {
            as_of,
            version: None,
            triples: Vec::new(),
        };

        if let Some(subject) = subject {
            if let Some(version) = find_version_at_time(&state, subject, as_of) {
                result.version = Some(version.clone());

                if let Some(graph) = version
                    .graph_name
                    .as_deref()
                    .and_then(|name| state.graphs.get(name))
                {
                    result.triples = graph.find(Some(subject), predicate, object);
                    return result;
                }

                if version.uri.as_str() != subject {
                    result.triples = self.base.find(Some(version.uri.as_str()), predicate, object);
                    return result;
                }
            }
        }

        for triple in self.base.find(subject, predicate, object) {
            if is_valid_at_time(&state, &triple.subject, as_of) {
                result.triples.push(triple);
            }
        }
        for graph in state.graphs.values() {
            for triple in graph.find(subject, predicate, object) {
                if is_valid_at_time(&state, &triple.subject, as_of) {
                    result.triples.push(triple);
                }
            }
        }

        result
    }

    /// The version of an entity that was valid at `as_of`.
    pub fn get_version_at_time(
        &self,
        canonical_uri: &str,
        as_of: DateTime<Utc>,
    ) -> Result<VersionInfo> {
        let state = self.state.read().unwrap();
        find_version_at_time(&state, canonical_uri, as_of)
            .cloned()
            .ok_or_else(|| StoreError::NoVersionAtTime {
                uri: canonical_uri.to_string(),
                as_of,
            })
    }

    /// The most recent version of an entity.
    pub fn get_latest_version(&self, canonical_uri: &str) -> Result<VersionInfo> {
        let state = self.state.read().unwrap();
        state
            .versions
            .get(canonical_uri)
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or_else(|| StoreError::NoVersionsRegistered(canonical_uri.to_string()))
    }

    /// All versions across all entities that carry active status, or are
    /// open-ended with a non-terminal status.
    pub fn get_active_versions(&self) -> Vec<VersionInfo> {
        let state = self.state.read().unwrap();
        let mut active = Vec::new();
        for versions in state.versions.values() {
            for version in versions {
                if version.status == VersionStatus::Active
                    || (version.valid_until.is_none() && !version.status.is_terminal())
                {
                    active.push(version.clone());
                }
            }
        }
        active
    }

    /// Associates a version with the decision event that adopted it.
    pub fn link_version_to_meeting(
        &self,
        version_uri: &str,
        meeting_uri: impl Into<Term>,
    ) -> Result<()> {
        let meeting = meeting_uri.into();
        {
            let mut state = self.state.write().unwrap();
            'outer: for versions in state.versions.values_mut() {
                for version in versions.iter_mut() {
                    if version.uri.as_str() == version_uri {
                        version.meeting_uri = Some(meeting.clone());
                        break 'outer;
                    }
                }
            }
        }
        self.base.add(version_uri, vocab::PROP_DECIDED_AT, meeting)
    }

    /// Marks `old_version_uri` as superseded by `new_version_uri`, linking
    /// the two in both the registry and the base store. Operates on the
    /// registry directly and does not change which version is current.
    pub fn supersede_version(
        &self,
        old_version_uri: &str,
        new_version_uri: &str,
        superseded_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if old_version_uri.is_empty() || new_version_uri.is_empty() {
            return Err(StoreError::EmptyVersionUri);
        }

        {
            let mut state = self.state.write().unwrap();
            for versions in state.versions.values_mut() {
                for version in versions.iter_mut() {
                    if version.uri.as_str() == old_version_uri {
                        version.superseded_by_uri = Some(Term::from(new_version_uri));
                        supersede(version, superseded_at);
                    }
                    if version.uri.as_str() == new_version_uri {
                        version.supersedes_uri = Some(Term::from(old_version_uri));
                    }
                }
            }
        }

        self.base
            .add(new_version_uri, vocab::PROP_SUPERSEDES, old_version_uri)?;
        self.base
            .add(old_version_uri, vocab::PROP_SUPERSEDED_BY, new_version_uri)?;
        self.base
            .add(new_version_uri, vocab::PROP_PREVIOUS_VERSION, old_version_uri)?;
        self.base
            .add(old_version_uri, vocab::PROP_NEXT_VERSION, new_version_uri)?;
        if let Some(at) = superseded_at {
            self.base
                .add(old_version_uri, vocab::PROP_SUPERSEDED_DATE, rfc3339(at))?;
        }
        debug!(old = old_version_uri, new = new_version_uri, "superseded version");
        Ok(())
    }

    /// Differences between the direct triples of two versions.
    ///
    /// Builds a predicate -> object map per side, so a predicate carrying
    /// several objects keeps only one of them (last write wins).
    pub fn compare_versions(&self, version1_uri: &str, version2_uri: &str) -> VersionDiff {
        let triples1 = self.base.find(Some(version1_uri), None, None);
        let triples2 = self.base.find(Some(version2_uri), None, None);

        let map1: HashMap<&Term, &Term> =
            triples1.iter().map(|t| (&t.predicate, &t.object)).collect();
        let map2: HashMap<&Term, &Term> =
            triples2.iter().map(|t| (&t.predicate, &t.object)).collect();

        let mut diff = VersionDiff {
            version1_uri: Term::from(version1_uri),
            version2_uri: Term::from(version2_uri),
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
        };

        for triple in &triples2 {
            if !map1.contains_key(&triple.predicate) {
                diff.added.push(triple.clone());
            }
        }
        for triple in &triples1 {
            if !map2.contains_key(&triple.predicate) {
                diff.removed.push(triple.clone());
            }
        }
        for triple in &triples1 {
            if let Some(&new_object) = map2.get(&triple.predicate) {
                if *new_object != triple.object {
                    diff.modified.push(TripleChange {
                        predicate: triple.predicate.clone(),
                        old_object: triple.object.clone(),
                        new_object: new_object.clone(),
                    });
                }
            }
        }

        diff
    }

    /// Aggregated statistics for the base store, named graphs and version
    /// registry.
    pub fn stats(&self) -> TemporalStats {
        let state = self.state.read().unwrap();
        let mut total_versions = 0;
        let mut active_versions = 0;
        for versions in state.versions.values() {
            total_versions += versions.len();
            active_versions += versions
                .iter()
                .filter(|v| v.status == VersionStatus::Active)
                .count();
        }
        TemporalStats {
            base_stats: self.base.stats(),
            graph_count: state.graphs.len(),
            versioned_entities: state.versions.len(),
            total_versions,
            active_versions,
        }
    }
}

/// The single authoritative superseded transition, shared by
/// `set_current_version` and `supersede_version`. An explicit `at` always
/// wins; without one, an existing `valid_until` is kept and an open-ended
/// validity closes at now.
fn supersede(version: &mut VersionInfo, at: Option<DateTime<Utc>>) {
    version.status = VersionStatus::Superseded;
    match at {
        Some(at) => version.valid_until = Some(at),
        None => {
            if version.valid_until.is_none() {
                version.valid_until = Some(Utc::now());
            }
        }
    }
}

/// Newest-first scan for the version covering `as_of`.
fn find_version_at_time<'a>(
    state: &'a TemporalState,
    canonical_uri: &str,
    as_of: DateTime<Utc>,
) -> Option<&'a VersionInfo> {
    state
        .versions
        .get(canonical_uri)?
        .iter()
        .rev()
        .find(|v| v.is_valid_at(as_of))
}

/// Whether a subject is valid at `as_of` per the version registry.
/// Subjects with no version records are treated as always valid.
fn is_valid_at_time(state: &TemporalState, subject: &Term, as_of: DateTime<Utc>) -> bool {
    match state.versions.get(subject.as_str()) {
        None => true,
        Some(versions) => versions
            .iter()
            .any(|v| v.uri == *subject && v.is_valid_at(as_of)),
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
