//! Multi-index in-memory triple store

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::triple::{Term, Triple, TriplePattern};
use crate::error::{Result, StoreError};

/// Statistics about the triple store for query optimization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_triples: usize,
    pub unique_subjects: usize,
    pub unique_predicates: usize,
    pub unique_objects: usize,
    pub predicate_counts: HashMap<Term, usize>,
    pub subject_counts: HashMap<Term, usize>,
    pub object_counts: HashMap<Term, usize>,
}

/// Two-level nested mapping terminating in a set of existence markers.
type Nested = HashMap<Term, HashMap<Term, HashSet<Term>>>;

/// The three rotations of the triple set plus frequency counters.
///
/// All mutation funnels through [`Indexes::insert`] and [`Indexes::remove`]
/// so the rotations cannot drift apart.
#[derive(Debug, Default)]
struct Indexes {
    /// subject -> predicate -> objects
    spo: Nested,
    /// predicate -> object -> subjects
    pos: Nested,
    /// object -> subject -> predicates
    osp: Nested,
    count: usize,
    subject_counts: HashMap<Term, usize>,
    predicate_counts: HashMap<Term, usize>,
    object_counts: HashMap<Term, usize>,
}

impl Indexes {
    fn contains(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.spo
            .get(subject)
            .and_then(|p_map| p_map.get(predicate))
            .map_or(false, |o_set| o_set.contains(object))
    }

    /// Inserts into all three rotations and bumps the counters.
    /// Returns false if the triple was already present.
    fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        if self.contains(subject.as_str(), predicate.as_str(), object.as_str()) {
            return false;
        }

        self.spo
            .entry(subject.clone())
            .or_default()
            .entry(predicate.clone())
            .or_default()
            .insert(object.clone());
        self.pos
            .entry(predicate.clone())
            .or_default()
            .entry(object.clone())
            .or_default()
            .insert(subject.clone());
        self.osp
            .entry(object.clone())
            .or_default()
            .entry(subject.clone())
            .or_default()
            .insert(predicate.clone());

        *self.subject_counts.entry(subject).or_insert(0) += 1;
        *self.predicate_counts.entry(predicate).or_insert(0) += 1;
        *self.object_counts.entry(object).or_insert(0) += 1;
        self.count += 1;
        true
    }

    /// Removes from all three rotations, pruning empty nesting levels.
    /// Returns false if the triple was not present.
    fn remove(&mut self, triple: &Triple) -> bool {
        let subject = triple.subject.as_str();
        let predicate = triple.predicate.as_str();
        let object = triple.object.as_str();

        if !self.contains(subject, predicate, object) {
            return false;
        }

        Self::remove_entry(&mut self.spo, subject, predicate, object);
        Self::remove_entry(&mut self.pos, predicate, object, subject);
        Self::remove_entry(&mut self.osp, object, subject, predicate);

        Self::decrement(&mut self.subject_counts, subject);
        Self::decrement(&mut self.predicate_counts, predicate);
        Self::decrement(&mut self.object_counts, object);
        self.count -= 1;
        true
    }

    fn remove_entry(index: &mut Nested, first: &str, second: &str, third: &str) {
        if let Some(second_map) = index.get_mut(first) {
            if let Some(third_set) = second_map.get_mut(second) {
                third_set.remove(third);
                if third_set.is_empty() {
                    second_map.remove(second);
                }
            }
            if second_map.is_empty() {
                index.remove(first);
            }
        }
    }

    fn decrement(counts: &mut HashMap<Term, usize>, key: &str) {
        if let Some(n) = counts.get_mut(key) {
            *n -= 1;
            if *n == 0 {
                counts.remove(key);
            }
        }
    }

    /// Wildcard query resolved through the most selective rotation for the
    /// bound fields: subject-first, then predicate-first, then object-first.
    /// Only the all-wildcard pattern scans the full store.
    fn find(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Vec<Triple> {
        match (subject, predicate, object) {
            (None, None, None) => self.find_all(),
            (Some(s), _, _) => self.find_by_subject(s, predicate, object),
            (None, Some(p), _) => self.find_by_predicate(p, object),
            (None, None, Some(o)) => self.find_by_object(o),
        }
    }

    fn find_all(&self) -> Vec<Triple> {
        let mut results = Vec::with_capacity(self.count);
        for (s, p_map) in &self.spo {
            for (p, o_set) in p_map {
                for o in o_set {
                    results.push(Triple::new(s, p, o));
                }
            }
        }
        results
    }

    fn find_by_subject(
        &self,
        subject: &str,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Vec<Triple> {
        let mut results = Vec::new();
        let Some(p_map) = self.spo.get(subject) else {
            return results;
        };

        match predicate {
            Some(p) => {
                if let Some(o_set) = p_map.get(p) {
                    match object {
                        Some(o) => {
                            if o_set.contains(o) {
                                results.push(Triple::new(subject, p, o));
                            }
                        }
                        None => {
                            for o in o_set {
                                results.push(Triple::new(subject, p, o));
                            }
                        }
                    }
                }
            }
            None => {
                for (p, o_set) in p_map {
                    match object {
                        Some(o) => {
                            if o_set.contains(o) {
                                results.push(Triple::new(subject, p, o));
                            }
                        }
                        None => {
                            for o in o_set {
                                results.push(Triple::new(subject, p, o));
                            }
                        }
                    }
                }
            }
        }
        results
    }

    fn find_by_predicate(&self, predicate: &str, object: Option<&str>) -> Vec<Triple> {
        let mut results = Vec::new();
        let Some(o_map) = self.pos.get(predicate) else {
            return results;
        };

        match object {
            Some(o) => {
                if let Some(s_set) = o_map.get(o) {
                    for s in s_set {
                        results.push(Triple::new(s, predicate, o));
                    }
                }
            }
            None => {
                for (o, s_set) in o_map {
                    for s in s_set {
                        results.push(Triple::new(s, predicate, o));
                    }
                }
            }
        }
        results
    }

    fn find_by_object(&self, object: &str) -> Vec<Triple> {
        let mut results = Vec::new();
        if let Some(s_map) = self.osp.get(object) {
            for (s, p_set) in s_map {
                for p in p_set {
                    results.push(Triple::new(s, p, object));
                }
            }
        }
        results
    }

    fn clear(&mut self) {
        *self = Indexes::default();
    }
}

/// Thread-safe in-memory triple store with three redundant indexes.
///
/// Each triple is held in three rotations (subject-first, predicate-first,
/// object-first), so any combination of bound and wildcard query fields
/// resolves without a full scan. A single reader/writer lock guards all
/// three rotations and the counters together; every public operation
/// acquires it exactly once, so reads always observe a consistent snapshot.
#[derive(Debug, Default)]
pub struct TripleStore {
    indexes: RwLock<Indexes>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a triple. Fails with [`StoreError::InvalidTriple`] if any
    /// component is empty; adding an existing triple is a no-op.
    pub fn add(
        &self,
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Result<()> {
        self.add_triple(Triple::new(subject, predicate, object))
    }

    pub fn add_triple(&self, triple: Triple) -> Result<()> {
        if !triple.is_valid() {
            return Err(StoreError::InvalidTriple);
        }
        let mut indexes = self.indexes.write().unwrap();
        indexes.insert(triple);
        Ok(())
    }

    /// Inserts a batch under a single write-lock acquisition. Unlike
    /// [`TripleStore::add`], invalid and duplicate entries are skipped
    /// silently rather than failing the batch; large imports favor
    /// throughput over per-item error reporting. Returns the number of
    /// triples actually inserted.
    pub fn bulk_add(&self, triples: impl IntoIterator<Item = Triple>) -> usize {
        let mut indexes = self.indexes.write().unwrap();
        let mut inserted = 0;
        let mut skipped = 0;
        for triple in triples {
            if triple.is_valid() && indexes.insert(triple) {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(inserted, skipped, "bulk add skipped invalid or duplicate triples");
        }
        inserted
    }

    /// Copies every triple from `source` into this store. Duplicates are
    /// skipped; returns the number of new triples added.
    pub fn merge_from(&self, source: &TripleStore) -> usize {
        self.bulk_add(source.all())
    }

    /// Wildcard query; `None` fields match anything. Results reflect a
    /// single consistent snapshot of the store.
    pub fn find(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Vec<Triple> {
        self.indexes.read().unwrap().find(subject, predicate, object)
    }

    pub fn find_pattern(&self, pattern: &TriplePattern) -> Vec<Triple> {
        self.find(
            pattern.subject.as_ref().map(Term::as_str),
            pattern.predicate.as_ref().map(Term::as_str),
            pattern.object.as_ref().map(Term::as_str),
        )
    }

    /// Point lookup through the subject-first rotation.
    pub fn exists(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.indexes.read().unwrap().contains(subject, predicate, object)
    }

    /// All properties of one subject as predicate -> objects.
    pub fn get(&self, subject: &str) -> HashMap<Term, Vec<Term>> {
        let indexes = self.indexes.read().unwrap();
        let mut result = HashMap::new();
        if let Some(p_map) = indexes.spo.get(subject) {
            for (p, o_set) in p_map {
                result.insert(p.clone(), o_set.iter().cloned().collect());
            }
        }
        result
    }

    /// A single object for a subject-predicate pair, in no particular
    /// order. Callers needing determinism must not rely on which one.
    pub fn get_one(&self, subject: &str, predicate: &str) -> Option<Term> {
        let indexes = self.indexes.read().unwrap();
        indexes
            .spo
            .get(subject)?
            .get(predicate)?
            .iter()
            .next()
            .cloned()
    }

    /// Removes every triple matching the pattern; `None` fields are
    /// wildcards. Returns the number of triples removed.
    pub fn delete(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> usize {
        let mut indexes = self.indexes.write().unwrap();
        let matches = indexes.find(subject, predicate, object);
        for triple in &matches {
            indexes.remove(triple);
        }
        if !matches.is_empty() {
            debug!(removed = matches.len(), "deleted triples");
        }
        matches.len()
    }

    /// Removes a specific triple. Returns true if it was present.
    pub fn delete_triple(&self, triple: &Triple) -> bool {
        self.delete(
            Some(triple.subject.as_str()),
            Some(triple.predicate.as_str()),
            Some(triple.object.as_str()),
        ) > 0
    }

    /// Resets all indexes and counters to empty.
    pub fn clear(&self) {
        self.indexes.write().unwrap().clear();
    }

    pub fn count(&self) -> usize {
        self.indexes.read().unwrap().count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// All unique subjects.
    pub fn subjects(&self) -> Vec<Term> {
        self.indexes.read().unwrap().spo.keys().cloned().collect()
    }

    /// All unique predicates.
    pub fn predicates(&self) -> Vec<Term> {
        self.indexes.read().unwrap().pos.keys().cloned().collect()
    }

    /// All unique objects.
    pub fn objects(&self) -> Vec<Term> {
        self.indexes.read().unwrap().osp.keys().cloned().collect()
    }

    /// Every triple in the store.
    pub fn all(&self) -> Vec<Triple> {
        self.find(None, None, None)
    }

    /// A defensive copy of the store's statistics.
    pub fn stats(&self) -> IndexStats {
        let indexes = self.indexes.read().unwrap();
        IndexStats {
            total_triples: indexes.count,
            unique_subjects: indexes.spo.len(),
            unique_predicates: indexes.pos.len(),
            unique_objects: indexes.osp.len(),
            predicate_counts: indexes.predicate_counts.clone(),
            subject_counts: indexes.subject_counts.clone(),
            object_counts: indexes.object_counts.clone(),
        }
    }
}

impl fmt::Display for TripleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indexes = self.indexes.read().unwrap();
        write!(
            f,
            "TripleStore{{triples: {}, subjects: {}, predicates: {}, objects: {}}}",
            indexes.count,
            indexes.spo.len(),
            indexes.pos.len(),
            indexes.osp.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_count() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        store.add("s2", "p2", "o2").unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_add_idempotent() {
        let store = TripleStore::new();
        store.add("s", "p", "o").unwrap();
        store.add("s", "p", "o").unwrap();
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_add_invalid_triple() {
        let store = TripleStore::new();
        assert!(matches!(
            store.add("", "p", "o"),
            Err(StoreError::InvalidTriple)
        ));
        assert!(matches!(
            store.add("s", "", "o"),
            Err(StoreError::InvalidTriple)
        ));
        assert!(matches!(
            store.add("s", "p", ""),
            Err(StoreError::InvalidTriple)
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_bulk_add_skips_invalid_and_duplicates() {
        let store = TripleStore::new();
        let inserted = store.bulk_add(vec![
            Triple::new("s1", "p", "o"),
            Triple::new("s1", "p", "o"),
            Triple::new("", "p", "o"),
            Triple::new("s2", "p", "o"),
        ]);
        assert_eq!(inserted, 2);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_find_all_wildcards() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        store.add("s2", "p2", "o2").unwrap();
        assert_eq!(store.find(None, None, None).len(), 2);
    }

    #[test]
    fn test_find_subject_first() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        store.add("s1", "p2", "o2").unwrap();
        store.add("s2", "p1", "o3").unwrap();

        assert_eq!(store.find(Some("s1"), None, None).len(), 2);
        assert_eq!(store.find(Some("s1"), Some("p1"), None).len(), 1);
        assert_eq!(store.find(Some("s1"), Some("p1"), Some("o1")).len(), 1);
        assert_eq!(store.find(Some("s1"), None, Some("o2")).len(), 1);
        assert!(store.find(Some("s1"), Some("p1"), Some("o2")).is_empty());
    }

    #[test]
    fn test_find_predicate_first() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        store.add("s2", "p1", "o1").unwrap();
        store.add("s3", "p2", "o2").unwrap();

        assert_eq!(store.find(None, Some("p1"), None).len(), 2);
        assert_eq!(store.find(None, Some("p1"), Some("o1")).len(), 2);
        assert!(store.find(None, Some("p3"), None).is_empty());
    }

    #[test]
    fn test_find_object_first() {
        let store = TripleStore::new();
        store.add("s1", "p1", "shared").unwrap();
        store.add("s2", "p2", "shared").unwrap();
        assert_eq!(store.find(None, None, Some("shared")).len(), 2);
    }

    #[test]
    fn test_find_pattern() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        let pattern = TriplePattern::new(Some(Term::from("s1")), None, None);
        assert_eq!(store.find_pattern(&pattern).len(), 1);
    }

    #[test]
    fn test_exists() {
        let store = TripleStore::new();
        store.add("s", "p", "o").unwrap();
        assert!(store.exists("s", "p", "o"));
        assert!(!store.exists("s", "p", "x"));
    }

    #[test]
    fn test_get_and_get_one() {
        let store = TripleStore::new();
        store.add("s", "p1", "o1").unwrap();
        store.add("s", "p1", "o2").unwrap();
        store.add("s", "p2", "o3").unwrap();

        let props = store.get("s");
        assert_eq!(props.len(), 2);
        assert_eq!(props[&Term::from("p1")].len(), 2);

        assert_eq!(store.get_one("s", "p2"), Some(Term::from("o3")));
        assert_eq!(store.get_one("s", "missing"), None);
        assert_eq!(store.get_one("missing", "p1"), None);
    }

    #[test]
    fn test_delete_exact() {
        let store = TripleStore::new();
        store.add("s", "p", "o").unwrap();
        let removed = store.delete(Some("s"), Some("p"), Some("o"));
        assert_eq!(removed, 1);
        assert_eq!(store.count(), 0);
        assert!(!store.exists("s", "p", "o"));
    }

    #[test]
    fn test_delete_wildcard() {
        let store = TripleStore::new();
        store.add("s1", "p", "o1").unwrap();
        store.add("s1", "p", "o2").unwrap();
        store.add("s2", "p", "o3").unwrap();

        let removed = store.delete(Some("s1"), None, None);
        assert_eq!(removed, 2);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_delete_prunes_index_levels() {
        let store = TripleStore::new();
        store.add("s", "p", "o").unwrap();
        store.delete(Some("s"), None, None);

        // No residue: the subject must be gone from every rotation.
        assert!(store.subjects().is_empty());
        assert!(store.predicates().is_empty());
        assert!(store.objects().is_empty());
        let stats = store.stats();
        assert!(stats.subject_counts.is_empty());
        assert!(stats.predicate_counts.is_empty());
        assert!(stats.object_counts.is_empty());
    }

    #[test]
    fn test_delete_add_symmetry() {
        let store = TripleStore::new();
        store.add("base", "p", "o").unwrap();
        let before = store.count();

        store.add("s", "p", "o").unwrap();
        assert_eq!(store.count(), before + 1);
        assert_eq!(store.delete(Some("s"), Some("p"), Some("o")), 1);
        assert_eq!(store.count(), before);
        assert!(!store.exists("s", "p", "o"));
    }

    #[test]
    fn test_delete_triple() {
        let store = TripleStore::new();
        let triple = Triple::new("s", "p", "o");
        store.add_triple(triple.clone()).unwrap();
        assert!(store.delete_triple(&triple));
        assert!(!store.delete_triple(&triple));
    }

    #[test]
    fn test_clear() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        store.add("s2", "p2", "o2").unwrap();
        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.all().is_empty());
        assert_eq!(store.stats().unique_subjects, 0);
    }

    #[test]
    fn test_merge_from() {
        let source = TripleStore::new();
        source.add("s1", "p", "o").unwrap();
        source.add("s2", "p", "o").unwrap();

        let target = TripleStore::new();
        target.add("s1", "p", "o").unwrap();

        let added = target.merge_from(&source);
        assert_eq!(added, 1);
        assert_eq!(target.count(), 2);
    }

    #[test]
    fn test_stats() {
        let store = TripleStore::new();
        store.add("s1", "p1", "o1").unwrap();
        store.add("s1", "p2", "o2").unwrap();
        store.add("s2", "p1", "o1").unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_triples, 3);
        assert_eq!(stats.unique_subjects, 2);
        assert_eq!(stats.unique_predicates, 2);
        assert_eq!(stats.unique_objects, 2);
        assert_eq!(stats.subject_counts[&Term::from("s1")], 2);
        assert_eq!(stats.predicate_counts[&Term::from("p1")], 2);
        assert_eq!(stats.object_counts[&Term::from("o1")], 2);
    }

    #[test]
    fn test_index_agreement() {
        let store = TripleStore::new();
        store.add("s", "p", "o").unwrap();
        store.add("s", "p", "o2").unwrap();
        store.add("s2", "p", "o").unwrap();

        // Every stored triple must be reachable through each rotation
        // exactly once.
        for triple in store.all() {
            let by_subject = store.find(Some(triple.subject.as_str()), None, None);
            let by_predicate = store.find(None, Some(triple.predicate.as_str()), None);
            let by_object = store.find(None, None, Some(triple.object.as_str()));

            assert_eq!(by_subject.iter().filter(|t| **t == triple).count(), 1);
            assert_eq!(by_predicate.iter().filter(|t| **t == triple).count(), 1);
            assert_eq!(by_object.iter().filter(|t| **t == triple).count(), 1);
        }
    }

    #[test]
    fn test_display() {
        let store = TripleStore::new();
        store.add("s", "p", "o").unwrap();
        let rendered = store.to_string();
        assert!(rendered.contains("triples: 1"));
    }
}
