//! Physical execution strategies of logical operators.
//!
//! An [`OperatorDescriptor`] is one way to execute an operator, e.g. a join by repartitioning
//! both inputs on the keys, or by broadcasting one side. Every descriptor declares the fixed
//! list of property combinations it accepts on its inputs, and derives the properties of its
//! output from the properties its inputs actually carry.
mod instantiate;
pub use instantiate::*;

use std::fmt::{Display, Formatter};

use enumset::EnumSetType;
use itertools::Itertools;
use smallvec::{smallvec, SmallVec};
use strum_macros::AsRefStr;

use crate::fields::{FieldList, FieldSet};
use crate::properties::{
    GlobalProperties, LocalProperties, Ordering, Partitioning, RequestedGlobalProperties,
    RequestedLocalProperties,
};

/// Field-less tag of an [`OperatorDescriptor`], usable in [`enumset::EnumSet`]s.
#[derive(EnumSetType, Debug, Hash, AsRefStr)]
pub enum DriverStrategy {
    SourceScan,
    SinkForward,
    MapForward,
    SortedReduce,
    RepartitionHashJoin,
    SortMergeJoin,
    BroadcastHashJoinFirst,
    BroadcastHashJoinSecond,
    CartesianProduct,
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum OperatorDescriptor {
    SourceScan,
    SinkForward,
    MapForward,
    /// Groups records by sorting each partition on the keys.
    ///
    /// When `combinable`, groups may be pre-aggregated while sorting.
    SortedReduce { keys: FieldSet, combinable: bool },
    /// Hash partitions both inputs on the keys, builds a hash table from the first.
    RepartitionHashJoin { left: FieldList, right: FieldList },
    /// Hash partitions and sorts both inputs on the keys, then merges them.
    SortMergeJoin { left: FieldList, right: FieldList },
    /// Replicates the first input and builds a hash table from it.
    BroadcastHashJoinFirst { left: FieldList, right: FieldList },
    /// Replicates the second input and builds a hash table from it.
    BroadcastHashJoinSecond { left: FieldList, right: FieldList },
    /// Replicates one input and crosses it with each partition of the other.
    CartesianProduct,
}

/// Properties requested from one input.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Default)]
pub struct InputRequirement {
    pub global: RequestedGlobalProperties,
    pub local: RequestedLocalProperties,
}

impl Display for InputRequirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.global, self.local)
    }
}

/// One admissible combination of input requirements, one entry per input.
pub type Requirements = SmallVec<[InputRequirement; 2]>;

type GlobalPair = SmallVec<[RequestedGlobalProperties; 2]>;
type LocalPair = SmallVec<[RequestedLocalProperties; 2]>;

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref CARTESIAN_GLOBAL_PAIRS: Vec<GlobalPair> = vec![
        smallvec![RequestedGlobalProperties::Random, RequestedGlobalProperties::FullyReplicated],
        smallvec![RequestedGlobalProperties::FullyReplicated, RequestedGlobalProperties::Random],
    ];
    static ref TRIVIAL_LOCAL_PAIR: LocalPair = smallvec![
        RequestedLocalProperties::none(),
        RequestedLocalProperties::none()
    ];
}

impl OperatorDescriptor {
    pub fn strategy(&self) -> DriverStrategy {
        match self {
            OperatorDescriptor::SourceScan => DriverStrategy::SourceScan,
            OperatorDescriptor::SinkForward => DriverStrategy::SinkForward,
            OperatorDescriptor::MapForward => DriverStrategy::MapForward,
            OperatorDescriptor::SortedReduce { .. } => DriverStrategy::SortedReduce,
            OperatorDescriptor::RepartitionHashJoin { .. } => DriverStrategy::RepartitionHashJoin,
            OperatorDescriptor::SortMergeJoin { .. } => DriverStrategy::SortMergeJoin,
            OperatorDescriptor::BroadcastHashJoinFirst { .. } => {
                DriverStrategy::BroadcastHashJoinFirst
            }
            OperatorDescriptor::BroadcastHashJoinSecond { .. } => {
                DriverStrategy::BroadcastHashJoinSecond
            }
            OperatorDescriptor::CartesianProduct => DriverStrategy::CartesianProduct,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            OperatorDescriptor::SourceScan => 0,
            OperatorDescriptor::SinkForward
            | OperatorDescriptor::MapForward
            | OperatorDescriptor::SortedReduce { .. } => 1,
            OperatorDescriptor::RepartitionHashJoin { .. }
            | OperatorDescriptor::SortMergeJoin { .. }
            | OperatorDescriptor::BroadcastHashJoinFirst { .. }
            | OperatorDescriptor::BroadcastHashJoinSecond { .. }
            | OperatorDescriptor::CartesianProduct => 2,
        }
    }

    /// Whether the local grouping of the input may pre-aggregate records.
    pub fn is_combinable(&self) -> bool {
        matches!(
            self,
            OperatorDescriptor::SortedReduce {
                combinable: true,
                ..
            }
        )
    }

    /// Key order used when input `input` has to be hash partitioned.
    ///
    /// Co-partitioned joins need both inputs hashed on corresponding key positions, so the
    /// partitioning follows the declared key order instead of the field order.
    pub fn partitioning_keys(&self, input: usize) -> Option<&FieldList> {
        match self {
            OperatorDescriptor::RepartitionHashJoin { left, right }
            | OperatorDescriptor::SortMergeJoin { left, right } => match input {
                0 => Some(left),
                1 => Some(right),
                _ => None,
            },
            _ => None,
        }
    }

    fn global_pairs(&self) -> Vec<GlobalPair> {
        use RequestedGlobalProperties::*;
        match self {
            OperatorDescriptor::SourceScan => vec![smallvec![]],
            OperatorDescriptor::SinkForward | OperatorDescriptor::MapForward => {
                vec![smallvec![Random]]
            }
            OperatorDescriptor::SortedReduce { keys, .. } => {
                vec![smallvec![AnyPartitioning(keys.clone())]]
            }
            OperatorDescriptor::RepartitionHashJoin { left, right }
            | OperatorDescriptor::SortMergeJoin { left, right } => vec![smallvec![
                HashPartitioned(left.to_field_set()),
                HashPartitioned(right.to_field_set())
            ]],
            OperatorDescriptor::BroadcastHashJoinFirst { .. } => {
                vec![smallvec![FullyReplicated, Random]]
            }
            OperatorDescriptor::BroadcastHashJoinSecond { .. } => {
                vec![smallvec![Random, FullyReplicated]]
            }
            OperatorDescriptor::CartesianProduct => CARTESIAN_GLOBAL_PAIRS.clone(),
        }
    }

    fn local_pairs(&self) -> Vec<LocalPair> {
        match self {
            OperatorDescriptor::SourceScan => vec![smallvec![]],
            OperatorDescriptor::SinkForward | OperatorDescriptor::MapForward => {
                vec![smallvec![RequestedLocalProperties::none()]]
            }
            OperatorDescriptor::SortedReduce { keys, .. } => {
                vec![smallvec![RequestedLocalProperties::grouped(keys.clone())]]
            }
            OperatorDescriptor::SortMergeJoin { left, right } => vec![smallvec![
                RequestedLocalProperties::ordered(Ordering::ascending(left)),
                RequestedLocalProperties::ordered(Ordering::ascending(right))
            ]],
            OperatorDescriptor::RepartitionHashJoin { .. }
            | OperatorDescriptor::BroadcastHashJoinFirst { .. }
            | OperatorDescriptor::BroadcastHashJoinSecond { .. }
            | OperatorDescriptor::CartesianProduct => vec![TRIVIAL_LOCAL_PAIR.clone()],
        }
    }

    /// Admissible input requirements, global pairs crossed with local pairs in declaration
    /// order.
    pub fn requirements(&self) -> Vec<Requirements> {
        self.global_pairs()
            .into_iter()
            .cartesian_product(self.local_pairs())
            .map(|(globals, locals)| {
                globals
                    .into_iter()
                    .zip(locals)
                    .map(|(global, local)| InputRequirement { global, local })
                    .collect()
            })
            .collect()
    }

    /// Global properties of the output, given the properties delivered to each input.
    ///
    /// A source has no inputs, its declared properties are passed in as the only element.
    pub fn compute_global_properties(&self, inputs: &[GlobalProperties]) -> GlobalProperties {
        match self {
            OperatorDescriptor::SourceScan
            | OperatorDescriptor::SinkForward
            | OperatorDescriptor::MapForward
            | OperatorDescriptor::SortedReduce { .. } => {
                inputs.first().cloned().unwrap_or_default()
            }
            OperatorDescriptor::RepartitionHashJoin { .. }
            | OperatorDescriptor::SortMergeJoin { .. }
            | OperatorDescriptor::BroadcastHashJoinFirst { .. }
            | OperatorDescriptor::BroadcastHashJoinSecond { .. } => {
                let mut props = combine_inputs(inputs);
                props.clear_unique_field_combinations();
                props
            }
            OperatorDescriptor::CartesianProduct => {
                let mut props = combine_inputs(inputs);
                if props.is_random() {
                    if let Some(unique) = props.unique_field_combinations().iter().next() {
                        let fields = unique.to_field_list();
                        props.set_any_partitioning(fields);
                    }
                }
                props.clear_unique_field_combinations();
                props
            }
        }
    }

    /// Local properties of the output, given the properties delivered to each input.
    pub fn compute_local_properties(&self, inputs: &[LocalProperties]) -> LocalProperties {
        match self {
            OperatorDescriptor::SourceScan
            | OperatorDescriptor::SinkForward
            | OperatorDescriptor::MapForward => inputs.first().cloned().unwrap_or_default(),
            OperatorDescriptor::SortedReduce { keys, .. } => {
                let covering = inputs
                    .first()
                    .and_then(|input| input.ordering())
                    .filter(|o| o.prefix_field_set(keys.len()).as_ref() == Some(keys));
                let props = match covering {
                    Some(ordering) => LocalProperties::ordered(ordering.clone()),
                    None => LocalProperties::grouped(keys.clone()),
                };
                props.with_unique_fields([keys.clone()])
            }
            OperatorDescriptor::SortMergeJoin { left, .. } => {
                LocalProperties::ordered(Ordering::ascending(left))
            }
            OperatorDescriptor::RepartitionHashJoin { .. }
            | OperatorDescriptor::BroadcastHashJoinFirst { .. }
            | OperatorDescriptor::BroadcastHashJoinSecond { .. }
            | OperatorDescriptor::CartesianProduct => LocalProperties::none(),
        }
    }

    /// Checks that the partitionings delivered to both inputs fit together.
    ///
    /// Single input strategies are always compatible.
    pub fn are_inputs_compatible(&self, inputs: &[&GlobalProperties]) -> bool {
        match (self, inputs) {
            (
                OperatorDescriptor::RepartitionHashJoin { left, right }
                | OperatorDescriptor::SortMergeJoin { left, right },
                [first, second],
            ) => co_partitioned(left, right, first, second),
            _ => true,
        }
    }
}

impl Display for OperatorDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorDescriptor::SortedReduce { keys, combinable } => {
                write!(f, "SortedReduce{}", keys)?;
                if *combinable {
                    write!(f, " combinable")?;
                }
                Ok(())
            }
            OperatorDescriptor::RepartitionHashJoin { left, right }
            | OperatorDescriptor::SortMergeJoin { left, right }
            | OperatorDescriptor::BroadcastHashJoinFirst { left, right }
            | OperatorDescriptor::BroadcastHashJoinSecond { left, right } => {
                write!(f, "{}{}={}", self.strategy().as_ref(), left, right)
            }
            _ => write!(f, "{}", self.strategy().as_ref()),
        }
    }
}

fn combine_inputs(inputs: &[GlobalProperties]) -> GlobalProperties {
    match inputs {
        [first, second] => GlobalProperties::combine(first, second),
        [single] => single.clone(),
        _ => GlobalProperties::random(),
    }
}

/// Both sides are hash partitioned on keys at the same positions of the join key lists.
fn co_partitioned(
    left_keys: &FieldList,
    right_keys: &FieldList,
    first: &GlobalProperties,
    second: &GlobalProperties,
) -> bool {
    if first.is_fully_replicated() || second.is_fully_replicated() {
        return true;
    }

    match (first.partitioning(), second.partitioning()) {
        (Partitioning::HashPartitioned(a), Partitioning::HashPartitioned(b)) => {
            a.len() == b.len()
                && a.iter().zip(b.iter()).all(|(l, r)| {
                    match (left_keys.position(l), right_keys.position(r)) {
                        (Some(i), Some(j)) => i == j,
                        _ => false,
                    }
                })
        }
        _ => false,
    }
}
