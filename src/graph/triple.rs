//! Triple and pattern types

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a subject, predicate or object (URI or literal).
///
/// Wraps the underlying string so identifiers do not silently mix with
/// unrelated string parameters at call sites. Hashing, equality and
/// ordering delegate to the wrapped string, and `Borrow<str>` lets the
/// indexes be probed with plain `&str` keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(String);

impl Term {
    pub fn new(value: impl Into<String>) -> Self {
        Term(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term(value.to_string())
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term(value)
    }
}

impl From<&String> for Term {
    fn from(value: &String) -> Self {
        Term(value.clone())
    }
}

impl From<&Term> for Term {
    fn from(value: &Term) -> Self {
        value.clone()
    }
}

impl AsRef<str> for Term {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Term {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Term {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Term {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subject-predicate-object fact.
///
/// Triples are immutable once stored; updating a fact means deleting and
/// re-adding it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// True if all components are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.subject.is_empty() && !self.predicate.is_empty() && !self.object.is_empty()
    }

    /// The triple in N-Triples format.
    pub fn n_triples(&self) -> String {
        format!("<{}> <{}> <{}> .", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> <{}> <{}>", self.subject, self.predicate, self.object)
    }
}

/// A pattern for matching triples. `None` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriplePattern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Term>,
}

impl TriplePattern {
    pub fn new(subject: Option<Term>, predicate: Option<Term>, object: Option<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Checks whether a triple matches this pattern.
    pub fn matches(&self, triple: &Triple) -> bool {
        if let Some(subject) = &self.subject {
            if *subject != triple.subject {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate {
            if *predicate != triple.predicate {
                return false;
            }
        }
        if let Some(object) = &self.object {
            if *object != triple.object {
                return false;
            }
        }
        true
    }

    /// True if any component is a wildcard.
    pub fn has_wildcards(&self) -> bool {
        self.subject.is_none() || self.predicate.is_none() || self.object.is_none()
    }

    /// Number of wildcard components.
    pub fn wildcard_count(&self) -> usize {
        [
            self.subject.is_none(),
            self.predicate.is_none(),
            self.object.is_none(),
        ]
        .iter()
        .filter(|wildcard| **wildcard)
        .count()
    }
}
