use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single engine parameter, e.g. `maxmemory-policy = allkeys-lru`.
///
/// Names are case-insensitive on the remote side, so they are lowercased on
/// construction and on deserialization. Equality, ordering and hashing cover
/// the full (name, value) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawParameter")]
pub struct Parameter {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    value: String,
}

impl From<RawParameter> for Parameter {
    fn from(raw: RawParameter) -> Self {
        Parameter::new(raw.name, raw.value)
    }
}

impl Parameter {
    pub fn new(name: impl AsRef<str>, value: impl Into<String>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// An unordered set of parameters keyed by (name, value).
///
/// Iteration is sorted by name, then value, which keeps batches stable
/// between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeSet<Parameter>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the parameter was not already present.
    pub fn insert(&mut self, parameter: Parameter) -> bool {
        self.0.insert(parameter)
    }

    pub fn contains(&self, parameter: &Parameter) -> bool {
        self.0.contains(parameter)
    }

    /// Whether any entry carries this name, whatever its value.
    pub fn contains_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.0.iter().any(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    /// Entries present in `self` but absent from `other`, in set order.
    pub fn difference(&self, other: &ParameterSet) -> Vec<Parameter> {
        self.0.difference(&other.0).cloned().collect()
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Parameter> for ParameterSet {
    fn extend<I: IntoIterator<Item = Parameter>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::collections::btree_set::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ParameterSet {
    type Item = Parameter;
    type IntoIter = std::collections::btree_set::IntoIter<Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
