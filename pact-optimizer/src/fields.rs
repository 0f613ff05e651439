//! Field positions used as keys of properties and statistics.
//!
//! [`FieldSet`] compares and hashes by content, so `{1, 0}` and `{0, 1}` are the same key.
//! [`FieldList`] keeps insertion order, and is used wherever order matters, e.g. the columns
//! of an ordering or the key positions of a join.

use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;
use serde::Serialize;

/// Position of a field in a record.
pub type FieldId = usize;

/// Unordered, immutable set of field positions.
#[derive(Clone, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeSet<FieldId>);

impl FieldSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0.contains(&field)
    }

    pub fn is_subset_of(&self, other: &FieldSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns a new set containing fields of both sets.
    pub fn union(&self, other: &FieldSet) -> FieldSet {
        FieldSet(self.0.union(&other.0).copied().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.0.iter().copied()
    }

    /// Fields in ascending position order.
    pub fn to_field_list(&self) -> FieldList {
        FieldList(self.0.iter().copied().collect())
    }
}

impl FromIterator<FieldId> for FieldSet {
    fn from_iter<T: IntoIterator<Item = FieldId>>(iter: T) -> Self {
        FieldSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[FieldId; N]> for FieldSet {
    fn from(fields: [FieldId; N]) -> Self {
        fields.into_iter().collect()
    }
}

impl From<&FieldList> for FieldSet {
    fn from(list: &FieldList) -> Self {
        list.iter().collect()
    }
}

impl Debug for FieldSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

impl Display for FieldSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Ordered, immutable list of field positions.
#[derive(Clone, Default, Hash, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldList(Vec<FieldId>);

impl FieldList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<FieldId> {
        self.0.get(idx).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.0.iter().copied()
    }

    /// Position of `field` in this list.
    pub fn position(&self, field: FieldId) -> Option<usize> {
        self.0.iter().position(|f| *f == field)
    }

    pub fn to_field_set(&self) -> FieldSet {
        FieldSet::from(self)
    }
}

impl FromIterator<FieldId> for FieldList {
    fn from_iter<T: IntoIterator<Item = FieldId>>(iter: T) -> Self {
        FieldList(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[FieldId; N]> for FieldList {
    fn from(fields: [FieldId; N]) -> Self {
        FieldList(fields.to_vec())
    }
}

impl From<Vec<FieldId>> for FieldList {
    fn from(fields: Vec<FieldId>) -> Self {
        FieldList(fields)
    }
}

impl Debug for FieldList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

impl Display for FieldList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}
