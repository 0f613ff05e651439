use std::fmt::{Display, Formatter};

use crate::fields::FieldSet;
use crate::properties::{
    DataDistribution, GlobalProperties, LocalProperties, Ordering, Partitioning,
    RequestedProperty,
};

/// Partitioning an operator strategy demands from one of its inputs.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default)]
pub enum RequestedGlobalProperties {
    /// No requirement.
    #[default]
    Random,
    /// Co-locate records agreeing on the fields, by any partitioning function.
    AnyPartitioning(FieldSet),
    /// Co-locate records agreeing on the fields by hash partitioning.
    HashPartitioned(FieldSet),
    RangePartitioned {
        ordering: Ordering,
        distribution: Option<DataDistribution>,
    },
    FullyReplicated,
}

impl RequestedProperty for RequestedGlobalProperties {
    type Delivered = GlobalProperties;

    fn is_trivial(&self) -> bool {
        matches!(self, RequestedGlobalProperties::Random)
    }

    /// Full replication is the strongest property and meets every request, while random
    /// partitioning only meets the trivial one.
    fn is_met_by(&self, delivered: &GlobalProperties) -> bool {
        match self {
            RequestedGlobalProperties::Random => true,
            _ if delivered.is_fully_replicated() => true,
            RequestedGlobalProperties::FullyReplicated => false,
            RequestedGlobalProperties::AnyPartitioning(fields) => {
                delivered.is_partitioned_on_fields(fields)
            }
            RequestedGlobalProperties::HashPartitioned(fields) => {
                matches!(delivered.partitioning(), Partitioning::HashPartitioned(_))
                    && delivered.is_partitioned_on_fields(fields)
            }
            RequestedGlobalProperties::RangePartitioned {
                ordering,
                distribution,
            } => match delivered.partitioning() {
                Partitioning::RangePartitioned {
                    ordering: delivered_ordering,
                    distribution: delivered_distribution,
                } => {
                    ordering == delivered_ordering
                        && (distribution.is_none() || distribution == delivered_distribution)
                }
                _ => false,
            },
        }
    }
}

impl Display for RequestedGlobalProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestedGlobalProperties::Random => write!(f, "any"),
            RequestedGlobalProperties::AnyPartitioning(fields) => {
                write!(f, "partitioned{}", fields)
            }
            RequestedGlobalProperties::HashPartitioned(fields) => write!(f, "hash{}", fields),
            RequestedGlobalProperties::RangePartitioned { ordering, .. } => {
                write!(f, "range{}", ordering)
            }
            RequestedGlobalProperties::FullyReplicated => write!(f, "replicated"),
        }
    }
}

/// Ordering and grouping an operator strategy demands within each input partition.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default)]
pub struct RequestedLocalProperties {
    ordering: Option<Ordering>,
    grouped_fields: Option<FieldSet>,
}

impl RequestedLocalProperties {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ordered(ordering: Ordering) -> Self {
        Self {
            ordering: Some(ordering),
            grouped_fields: None,
        }
    }

    pub fn grouped(fields: FieldSet) -> Self {
        Self {
            ordering: None,
            grouped_fields: Some(fields),
        }
    }

    pub fn ordering(&self) -> Option<&Ordering> {
        self.ordering.as_ref()
    }

    pub fn grouped_fields(&self) -> Option<&FieldSet> {
        self.grouped_fields.as_ref()
    }
}

impl RequestedProperty for RequestedLocalProperties {
    type Delivered = LocalProperties;

    fn is_trivial(&self) -> bool {
        self.ordering.is_none() && self.grouped_fields.is_none()
    }

    fn is_met_by(&self, delivered: &LocalProperties) -> bool {
        let ordering_met = self
            .ordering
            .as_ref()
            .map(|o| delivered.is_ordered_on(o))
            .unwrap_or(true);
        let grouping_met = self
            .grouped_fields
            .as_ref()
            .map(|g| delivered.is_grouped_on(g))
            .unwrap_or(true);

        ordering_met && grouping_met
    }
}

impl Display for RequestedLocalProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.ordering, &self.grouped_fields) {
            (None, None) => write!(f, "any"),
            (Some(ordering), None) => write!(f, "ordered{}", ordering),
            (None, Some(fields)) => write!(f, "grouped{}", fields),
            (Some(ordering), Some(fields)) => {
                write!(f, "ordered{} grouped{}", ordering, fields)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::fields::{FieldList, FieldSet};
    use crate::properties::{
        satisfies, DataDistribution, GlobalProperties, LocalProperties, Order, Ordering,
        RequestedGlobalProperties, RequestedLocalProperties, RequestedProperty,
    };

    fn all_global_properties() -> Vec<GlobalProperties> {
        vec![
            GlobalProperties::random(),
            GlobalProperties::fully_replicated(),
            GlobalProperties::hash_partitioned([0]),
            GlobalProperties::hash_partitioned([0, 1]),
            GlobalProperties::any_partitioning([1]),
            GlobalProperties::range_partitioned(Ordering::ascending(&FieldList::from([0])), None),
            GlobalProperties::random().with_unique_fields(vec![FieldSet::from([0])]),
        ]
    }

    #[test]
    fn test_trivial_request_is_always_met() {
        assert!(RequestedGlobalProperties::Random.is_trivial());
        assert!(RequestedLocalProperties::none().is_trivial());

        for props in all_global_properties() {
            assert!(satisfies(&RequestedGlobalProperties::Random, &props));
        }

        let locals = vec![
            LocalProperties::none(),
            LocalProperties::grouped(FieldSet::from([0])),
            LocalProperties::ordered(Ordering::ascending(&FieldList::from([2]))),
        ];
        for props in locals {
            assert!(satisfies(&RequestedLocalProperties::none(), &props));
        }
    }

    #[test]
    fn test_replication_meets_every_request() {
        let replicated = GlobalProperties::fully_replicated();
        let requests = vec![
            RequestedGlobalProperties::FullyReplicated,
            RequestedGlobalProperties::HashPartitioned(FieldSet::from([0])),
            RequestedGlobalProperties::AnyPartitioning(FieldSet::from([0, 1])),
            RequestedGlobalProperties::RangePartitioned {
                ordering: Ordering::ascending(&FieldList::from([0])),
                distribution: None,
            },
        ];

        for request in requests {
            assert!(request.is_met_by(&replicated), "{} not met", request);
        }
    }

    #[test]
    fn test_random_meets_only_trivial_request() {
        let random = GlobalProperties::random();

        assert!(RequestedGlobalProperties::Random.is_met_by(&random));
        assert!(!RequestedGlobalProperties::FullyReplicated.is_met_by(&random));
        assert!(!RequestedGlobalProperties::AnyPartitioning(FieldSet::from([0])).is_met_by(&random));
        assert!(!RequestedGlobalProperties::HashPartitioned(FieldSet::from([0])).is_met_by(&random));
    }

    #[test]
    fn test_hash_and_range_are_not_interchangeable() {
        let hashed = GlobalProperties::hash_partitioned([0]);
        let ranged =
            GlobalProperties::range_partitioned(Ordering::ascending(&FieldList::from([0])), None);

        let hash_request = RequestedGlobalProperties::HashPartitioned(FieldSet::from([0]));
        let range_request = RequestedGlobalProperties::RangePartitioned {
            ordering: Ordering::ascending(&FieldList::from([0])),
            distribution: None,
        };

        assert!(hash_request.is_met_by(&hashed));
        assert!(!hash_request.is_met_by(&ranged));
        assert!(range_request.is_met_by(&ranged));
        assert!(!range_request.is_met_by(&hashed));

        let any_request = RequestedGlobalProperties::AnyPartitioning(FieldSet::from([0, 1]));
        assert!(any_request.is_met_by(&hashed));
        assert!(any_request.is_met_by(&ranged));
    }

    #[test]
    fn test_hash_request_on_superset() {
        let request = RequestedGlobalProperties::HashPartitioned(FieldSet::from([0, 1]));

        assert!(request.is_met_by(&GlobalProperties::hash_partitioned([1])));
        assert!(request.is_met_by(&GlobalProperties::hash_partitioned([1, 0])));
        assert!(!request.is_met_by(&GlobalProperties::hash_partitioned([0, 2])));
    }

    #[test]
    fn test_range_request_with_distribution() {
        let ordering = Ordering::new().append(0, Order::Descending);
        let request = RequestedGlobalProperties::RangePartitioned {
            ordering: ordering.clone(),
            distribution: Some(DataDistribution::new("dates", 8)),
        };

        assert!(request.is_met_by(&GlobalProperties::range_partitioned(
            ordering.clone(),
            Some(DataDistribution::new("dates", 8))
        )));
        assert!(!request.is_met_by(&GlobalProperties::range_partitioned(ordering, None)));
        assert!(!request.is_met_by(&GlobalProperties::range_partitioned(
            Ordering::new().append(0, Order::Ascending),
            Some(DataDistribution::new("dates", 8))
        )));
    }

    #[test]
    fn test_local_ordering_prefix() {
        let delivered = LocalProperties::ordered(
            Ordering::new()
                .append(0, Order::Ascending)
                .append(1, Order::Descending)
                .append(2, Order::Ascending),
        );

        let prefix = RequestedLocalProperties::ordered(
            Ordering::new()
                .append(0, Order::Ascending)
                .append(1, Order::Descending),
        );
        let wrong_direction = RequestedLocalProperties::ordered(
            Ordering::new()
                .append(0, Order::Ascending)
                .append(1, Order::Ascending),
        );
        let longer = RequestedLocalProperties::ordered(
            Ordering::ascending(&FieldList::from([0, 1, 2, 3])),
        );

        assert!(prefix.is_met_by(&delivered));
        assert!(!wrong_direction.is_met_by(&delivered));
        assert!(!longer.is_met_by(&delivered));
        assert!(RequestedLocalProperties::grouped(FieldSet::from([0, 1])).is_met_by(&delivered));
        assert!(!RequestedLocalProperties::grouped(FieldSet::from([1])).is_met_by(&delivered));
    }
}
