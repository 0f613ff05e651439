use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::fields::FieldSet;
use crate::properties::{unique_sets_cover, Ordering};

/// Properties of the records inside a single partition.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default, Serialize)]
pub struct LocalProperties {
    ordering: Option<Ordering>,
    grouped_fields: Option<FieldSet>,
    /// Field combinations whose values are unique within each partition.
    unique_fields: BTreeSet<FieldSet>,
}

impl LocalProperties {
    /// No ordering, grouping or uniqueness.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ordered(ordering: Ordering) -> Self {
        Self {
            ordering: Some(ordering),
            ..Self::default()
        }
    }

    pub fn grouped(fields: FieldSet) -> Self {
        Self {
            grouped_fields: Some(fields),
            ..Self::default()
        }
    }

    pub fn with_unique_fields<I: IntoIterator<Item = FieldSet>>(mut self, unique: I) -> Self {
        self.unique_fields.extend(unique);
        self
    }

    pub fn ordering(&self) -> Option<&Ordering> {
        self.ordering.as_ref()
    }

    pub fn grouped_fields(&self) -> Option<&FieldSet> {
        self.grouped_fields.as_ref()
    }

    pub fn unique_fields(&self) -> &BTreeSet<FieldSet> {
        &self.unique_fields
    }

    pub fn add_unique_fields(&mut self, fields: FieldSet) {
        self.unique_fields.insert(fields);
    }

    pub fn is_trivial(&self) -> bool {
        self.ordering.is_none() && self.grouped_fields.is_none() && self.unique_fields.is_empty()
    }

    /// Tests whether records agreeing on `fields` are adjacent within each partition.
    pub fn is_grouped_on(&self, fields: &FieldSet) -> bool {
        if self.grouped_fields.as_ref() == Some(fields) {
            return true;
        }

        if let Some(prefix) = self
            .ordering
            .as_ref()
            .and_then(|o| o.prefix_field_set(fields.len()))
        {
            if &prefix == fields {
                return true;
            }
        }

        // An empty unique set means at most one record per partition.
        self.unique_fields.iter().any(|u| u.is_subset_of(fields))
    }

    /// Tests whether `ordering` is a prefix of the delivered ordering.
    pub fn is_ordered_on(&self, ordering: &Ordering) -> bool {
        self.ordering
            .as_ref()
            .map(|o| ordering.is_prefix_of(o))
            .unwrap_or(false)
    }

    /// Projects the properties onto the fields surviving an operator.
    pub fn filter_by_fields(&self, retained: &FieldSet) -> LocalProperties {
        LocalProperties {
            ordering: self
                .ordering
                .as_ref()
                .and_then(|o| o.retained_prefix(retained)),
            grouped_fields: self
                .grouped_fields
                .as_ref()
                .filter(|g| g.is_subset_of(retained))
                .cloned(),
            unique_fields: self
                .unique_fields
                .iter()
                .filter(|u| u.is_subset_of(retained))
                .cloned()
                .collect(),
        }
    }

    /// Tests whether these properties meet every request `other` meets.
    pub fn is_at_least_as_strong_as(&self, other: &LocalProperties) -> bool {
        let ordering_ok = match &other.ordering {
            Some(ordering) => self.is_ordered_on(ordering),
            None => true,
        };
        let grouping_ok = match &other.grouped_fields {
            Some(fields) => self.is_grouped_on(fields),
            None => true,
        };

        ordering_ok && grouping_ok && unique_sets_cover(&self.unique_fields, &other.unique_fields)
    }
}

impl Display for LocalProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_trivial() {
            return write!(f, "none");
        }
        let mut parts = Vec::new();
        if let Some(ordering) = &self.ordering {
            parts.push(format!("ordered{}", ordering));
        }
        if let Some(fields) = &self.grouped_fields {
            parts.push(format!("grouped{}", fields));
        }
        if !self.unique_fields.is_empty() {
            parts.push(format!("unique{:?}", self.unique_fields));
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use crate::fields::{FieldList, FieldSet};
    use crate::properties::{LocalProperties, Order, Ordering};

    #[test]
    fn test_grouping_from_ordering() {
        let props = LocalProperties::ordered(Ordering::ascending(&FieldList::from([1, 0, 2])));

        assert!(props.is_grouped_on(&FieldSet::from([0, 1])));
        assert!(props.is_grouped_on(&FieldSet::from([1])));
        assert!(!props.is_grouped_on(&FieldSet::from([0])));
        assert!(!props.is_grouped_on(&FieldSet::from([1, 2])));
    }

    #[test]
    fn test_grouping_from_unique_fields() {
        let props = LocalProperties::none().with_unique_fields(vec![FieldSet::from([3])]);

        assert!(props.is_grouped_on(&FieldSet::from([3, 4])));
        assert!(!props.is_grouped_on(&FieldSet::from([4])));
    }

    #[test]
    fn test_filter_by_fields() {
        let props = LocalProperties::ordered(
            Ordering::new()
                .append(0, Order::Ascending)
                .append(1, Order::Descending),
        );

        let filtered = props.filter_by_fields(&FieldSet::from([0]));
        assert_eq!(
            Some(&Ordering::new().append(0, Order::Ascending)),
            filtered.ordering()
        );
        assert!(props.filter_by_fields(&FieldSet::from([1])).is_trivial());

        let grouped = LocalProperties::grouped(FieldSet::from([0, 1]));
        assert!(grouped.filter_by_fields(&FieldSet::from([0])).is_trivial());
    }

    #[test]
    fn test_strength() {
        let sorted_ab = LocalProperties::ordered(Ordering::ascending(&FieldList::from([0, 1])));
        let sorted_a = LocalProperties::ordered(Ordering::ascending(&FieldList::from([0])));
        let grouped_a = LocalProperties::grouped(FieldSet::from([0]));

        assert!(sorted_ab.is_at_least_as_strong_as(&sorted_a));
        assert!(!sorted_a.is_at_least_as_strong_as(&sorted_ab));
        assert!(sorted_a.is_at_least_as_strong_as(&grouped_a));
        assert!(!grouped_a.is_at_least_as_strong_as(&sorted_a));
        assert!(grouped_a.is_at_least_as_strong_as(&LocalProperties::none()));
        assert!(!LocalProperties::none().is_at_least_as_strong_as(&grouped_a));
    }
}
