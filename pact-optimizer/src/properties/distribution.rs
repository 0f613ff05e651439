use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use strum_macros::AsRefStr;

use crate::fields::{FieldList, FieldSet};
use crate::properties::{unique_sets_cover, Ordering};

/// Boundaries of a range partitioning, identified by name.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DataDistribution {
    name: String,
    num_buckets: usize,
}

impl DataDistribution {
    pub fn new<S: Into<String>>(name: S, num_buckets: usize) -> Self {
        Self {
            name: name.into(),
            num_buckets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_buckets(&self) -> usize {
        self.num_buckets
    }
}

/// How records are distributed across parallel partitions.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default, AsRefStr, Serialize)]
pub enum Partitioning {
    /// Records are spread over partitions without following any rule.
    #[default]
    Random,
    /// Partitioned by the hash values of fields.
    HashPartitioned(FieldList),
    /// Partitioned by value ranges of an ordering.
    RangePartitioned {
        ordering: Ordering,
        distribution: Option<DataDistribution>,
    },
    /// Every partition holds all records.
    FullyReplicated,
    /// Partitioned on fields by some unknown, but consistent, function.
    AnyPartitioning(FieldList),
}

impl Partitioning {
    /// Fields defining the partitioning, if any.
    pub fn fields(&self) -> Option<FieldSet> {
        match self {
            Partitioning::HashPartitioned(fields) | Partitioning::AnyPartitioning(fields) => {
                Some(fields.to_field_set())
            }
            Partitioning::RangePartitioned { ordering, .. } => Some(ordering.field_set()),
            Partitioning::Random | Partitioning::FullyReplicated => None,
        }
    }

    /// Tests whether `self` meets every partitioning request `other` meets.
    fn is_at_least_as_strong_as(&self, other: &Partitioning) -> bool {
        use Partitioning::*;
        match (self, other) {
            (_, Random) | (FullyReplicated, _) => true,
            (HashPartitioned(a), HashPartitioned(b))
            | (HashPartitioned(a), AnyPartitioning(b))
            | (AnyPartitioning(a), AnyPartitioning(b)) => {
                !a.is_empty() && a.to_field_set().is_subset_of(&b.to_field_set()) || a == b
            }
            (RangePartitioned { ordering, .. }, AnyPartitioning(b)) => {
                !ordering.is_empty() && ordering.field_set().is_subset_of(&b.to_field_set())
            }
            (a, b) => a == b,
        }
    }
}

/// Partition level properties of a data set.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default, Serialize)]
pub struct GlobalProperties {
    partitioning: Partitioning,
    /// Field combinations whose values are unique across the whole data set.
    unique_field_combinations: BTreeSet<FieldSet>,
}

impl GlobalProperties {
    pub fn random() -> Self {
        Self::default()
    }

    pub fn hash_partitioned<F: Into<FieldList>>(fields: F) -> Self {
        Self::with_partitioning(Partitioning::HashPartitioned(fields.into()))
    }

    pub fn any_partitioning<F: Into<FieldList>>(fields: F) -> Self {
        Self::with_partitioning(Partitioning::AnyPartitioning(fields.into()))
    }

    pub fn range_partitioned(ordering: Ordering, distribution: Option<DataDistribution>) -> Self {
        Self::with_partitioning(Partitioning::RangePartitioned {
            ordering,
            distribution,
        })
    }

    pub fn fully_replicated() -> Self {
        Self::with_partitioning(Partitioning::FullyReplicated)
    }

    pub fn with_partitioning(partitioning: Partitioning) -> Self {
        Self {
            partitioning,
            unique_field_combinations: BTreeSet::new(),
        }
    }

    pub fn with_unique_fields<I: IntoIterator<Item = FieldSet>>(mut self, unique: I) -> Self {
        self.unique_field_combinations.extend(unique);
        self
    }

    pub fn partitioning(&self) -> &Partitioning {
        &self.partitioning
    }

    pub fn set_any_partitioning(&mut self, fields: FieldList) {
        self.partitioning = Partitioning::AnyPartitioning(fields);
    }

    pub fn unique_field_combinations(&self) -> &BTreeSet<FieldSet> {
        &self.unique_field_combinations
    }

    pub fn add_unique_field_combination(&mut self, fields: FieldSet) {
        self.unique_field_combinations.insert(fields);
    }

    pub fn clear_unique_field_combinations(&mut self) {
        self.unique_field_combinations.clear();
    }

    pub fn is_fully_replicated(&self) -> bool {
        matches!(self.partitioning, Partitioning::FullyReplicated)
    }

    pub fn is_random(&self) -> bool {
        matches!(self.partitioning, Partitioning::Random)
    }

    /// Tests whether all records agreeing on `fields` are guaranteed to be in the same
    /// partition.
    pub fn is_partitioned_on_fields(&self, fields: &FieldSet) -> bool {
        self.partitioning
            .fields()
            .map(|p| !p.is_empty() && p.is_subset_of(fields))
            .unwrap_or(false)
    }

    /// Projects the properties onto the fields surviving an operator.
    pub fn filter_by_fields(&self, retained: &FieldSet) -> GlobalProperties {
        let partitioning = match self.partitioning.fields() {
            Some(fields) if !fields.is_subset_of(retained) => Partitioning::Random,
            _ => self.partitioning.clone(),
        };

        GlobalProperties {
            partitioning,
            unique_field_combinations: self
                .unique_field_combinations
                .iter()
                .filter(|u| u.is_subset_of(retained))
                .cloned()
                .collect(),
        }
    }

    /// Merges the properties of two inputs of a binary operator.
    ///
    /// A replicated side contributes no partitioning, otherwise the first input wins.
    pub fn combine(first: &GlobalProperties, second: &GlobalProperties) -> GlobalProperties {
        let partitioning = if first.is_fully_replicated() {
            second.partitioning.clone()
        } else {
            first.partitioning.clone()
        };

        GlobalProperties {
            partitioning,
            unique_field_combinations: first
                .unique_field_combinations
                .union(&second.unique_field_combinations)
                .cloned()
                .collect(),
        }
    }

    /// Tests whether these properties meet every request `other` meets.
    pub fn is_at_least_as_strong_as(&self, other: &GlobalProperties) -> bool {
        self.partitioning.is_at_least_as_strong_as(&other.partitioning)
            && unique_sets_cover(
                &self.unique_field_combinations,
                &other.unique_field_combinations,
            )
    }
}

impl Display for GlobalProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.partitioning {
            Partitioning::HashPartitioned(fields) => write!(f, "hash{}", fields)?,
            Partitioning::AnyPartitioning(fields) => write!(f, "any{}", fields)?,
            Partitioning::RangePartitioned { ordering, .. } => write!(f, "range{}", ordering)?,
            Partitioning::FullyReplicated => write!(f, "replicated")?,
            Partitioning::Random => write!(f, "random")?,
        }
        if !self.unique_field_combinations.is_empty() {
            write!(f, " unique{:?}", self.unique_field_combinations)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::fields::{FieldList, FieldSet};
    use crate::properties::{GlobalProperties, Ordering, Partitioning};

    #[test]
    fn test_partitioned_on_fields() {
        let hashed = GlobalProperties::hash_partitioned([0]);

        assert!(hashed.is_partitioned_on_fields(&FieldSet::from([0])));
        assert!(hashed.is_partitioned_on_fields(&FieldSet::from([0, 1])));
        assert!(!hashed.is_partitioned_on_fields(&FieldSet::from([1])));
        assert!(!GlobalProperties::random().is_partitioned_on_fields(&FieldSet::from([0])));
        assert!(!GlobalProperties::hash_partitioned(FieldList::default())
            .is_partitioned_on_fields(&FieldSet::from([0])));
    }

    #[test]
    fn test_filter_by_fields() {
        let props = GlobalProperties::hash_partitioned([0, 1])
            .with_unique_fields(vec![FieldSet::from([0]), FieldSet::from([2])]);

        let kept = props.filter_by_fields(&FieldSet::from([0, 1]));
        assert_eq!(&Partitioning::HashPartitioned(FieldList::from([0, 1])), kept.partitioning());
        assert_eq!(1, kept.unique_field_combinations().len());

        let dropped = props.filter_by_fields(&FieldSet::from([0, 2]));
        assert!(dropped.is_random());
        assert_eq!(2, dropped.unique_field_combinations().len());

        let replicated = GlobalProperties::fully_replicated().filter_by_fields(&FieldSet::empty());
        assert!(replicated.is_fully_replicated());
    }

    #[test]
    fn test_combine() {
        let hashed = GlobalProperties::hash_partitioned([0]);
        let replicated = GlobalProperties::fully_replicated();

        assert_eq!(hashed, GlobalProperties::combine(&hashed, &replicated));
        assert_eq!(hashed, GlobalProperties::combine(&replicated, &hashed));
        assert_eq!(
            replicated,
            GlobalProperties::combine(&replicated, &replicated)
        );
        assert_eq!(
            hashed,
            GlobalProperties::combine(&hashed, &GlobalProperties::random())
        );
    }

    #[test]
    fn test_strength() {
        let random = GlobalProperties::random();
        let replicated = GlobalProperties::fully_replicated();
        let hash_a = GlobalProperties::hash_partitioned([0]);
        let hash_ab = GlobalProperties::hash_partitioned([0, 1]);
        let any_ab = GlobalProperties::any_partitioning([1, 0]);
        let range_a = GlobalProperties::range_partitioned(
            Ordering::ascending(&FieldList::from([0])),
            None,
        );

        assert!(replicated.is_at_least_as_strong_as(&hash_a));
        assert!(!hash_a.is_at_least_as_strong_as(&replicated));
        assert!(hash_a.is_at_least_as_strong_as(&random));
        assert!(!random.is_at_least_as_strong_as(&hash_a));
        assert!(hash_a.is_at_least_as_strong_as(&hash_ab));
        assert!(!hash_ab.is_at_least_as_strong_as(&hash_a));
        assert!(hash_ab.is_at_least_as_strong_as(&any_ab));
        assert!(range_a.is_at_least_as_strong_as(&any_ab));
        assert!(!range_a.is_at_least_as_strong_as(&hash_ab));
        assert!(!hash_a.is_at_least_as_strong_as(&range_a));

        let unique = hash_a.clone().with_unique_fields(vec![FieldSet::from([3])]);
        assert!(unique.is_at_least_as_strong_as(&hash_a));
        assert!(!hash_a.is_at_least_as_strong_as(&unique));
    }
}
