//! Physical alternatives of logical nodes.
//!
//! A [`PlanCandidate`] is one way to execute a logical node, together with the channels that
//! bring its inputs into the shape its strategy needs. Candidates are immutable and shared
//! through [`Arc`], a candidate of an upstream node is referenced by every downstream
//! candidate built on top of it.
mod channel;
pub use channel::*;
mod prune;
pub use prune::*;

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use prettytable::{row, Table};
use serde::Serialize;
use smallvec::SmallVec;
use strum_macros::AsRefStr;

use crate::cost::{Cost, CostWeights};
use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldList;
use crate::plan::{PlanNodeId, PlanNodeRef};
use crate::properties::{DataDistribution, GlobalProperties, LocalProperties, Ordering};
use crate::stat::Statistics;

pub type CandidateId = usize;

pub type CandidateRef = Arc<PlanCandidate>;

/// Candidates chosen for branching ancestors, i.e. nodes with several consumers.
///
/// Two candidates can only be combined if they agree on every shared entry, otherwise the
/// same logical node would be executed twice in different ways.
pub type BranchPlan = BTreeMap<PlanNodeId, CandidateId>;

/// Merges branch plans, `None` if two of them disagree on a node.
pub fn merge_branch_plans<'a, I>(plans: I) -> Option<BranchPlan>
where
    I: IntoIterator<Item = &'a BranchPlan>,
{
    let mut merged = BranchPlan::new();
    for plan in plans {
        for (node, candidate) in plan {
            match merged.insert(*node, *candidate) {
                Some(previous) if previous != *candidate => return None,
                _ => {}
            }
        }
    }
    Some(merged)
}

/// How records move from a producer to its consumer.
#[derive(Clone, Debug, Hash, Eq, PartialEq, AsRefStr, Serialize)]
pub enum ShipStrategy {
    /// Each producer partition feeds the consumer partition with the same index.
    Forward,
    PartitionHash(FieldList),
    PartitionRange {
        ordering: Ordering,
        distribution: Option<DataDistribution>,
    },
    /// Records are spread evenly, e.g. to change the parallelism.
    PartitionRandom,
    /// Every consumer partition receives all records.
    Broadcast,
}

/// Field-less tag of a [`ShipStrategy`], used to force a strategy on an input.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, AsRefStr, Serialize)]
pub enum ShipStrategyType {
    Forward,
    PartitionHash,
    PartitionRange,
    PartitionRandom,
    Broadcast,
}

impl ShipStrategy {
    pub fn strategy_type(&self) -> ShipStrategyType {
        match self {
            ShipStrategy::Forward => ShipStrategyType::Forward,
            ShipStrategy::PartitionHash(_) => ShipStrategyType::PartitionHash,
            ShipStrategy::PartitionRange { .. } => ShipStrategyType::PartitionRange,
            ShipStrategy::PartitionRandom => ShipStrategyType::PartitionRandom,
            ShipStrategy::Broadcast => ShipStrategyType::Broadcast,
        }
    }
}

impl Display for ShipStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipStrategy::PartitionHash(fields) => write!(f, "PartitionHash{}", fields),
            ShipStrategy::PartitionRange { ordering, .. } => {
                write!(f, "PartitionRange{}", ordering)
            }
            _ => write!(f, "{}", self.as_ref()),
        }
    }
}

/// Preparation of the records of one partition before the driver runs.
#[derive(Clone, Debug, Hash, Eq, PartialEq, AsRefStr, Serialize)]
pub enum LocalStrategy {
    None,
    Sort(Ordering),
    /// Sorts and pre-aggregates records with equal keys.
    CombiningSort(Ordering),
}

impl Display for LocalStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalStrategy::None => write!(f, "None"),
            LocalStrategy::Sort(ordering) => write!(f, "Sort{}", ordering),
            LocalStrategy::CombiningSort(ordering) => write!(f, "CombiningSort{}", ordering),
        }
    }
}

/// One alternative physical node for a logical node.
#[derive(Clone, Debug)]
pub struct PlanCandidate {
    id: CandidateId,
    node: PlanNodeRef,
    descriptor: OperatorDescriptor,
    inputs: SmallVec<[Channel; 2]>,
    global_props: GlobalProperties,
    local_props: LocalProperties,
    parallelism: u32,
    statistics: Statistics,
    node_cost: Cost,
    /// Cost of this node and everything upstream of it.
    cumulative_cost: Cost,
    branch_plan: BranchPlan,
}

impl PlanCandidate {
    pub fn id(&self) -> CandidateId {
        self.id
    }

    pub fn node(&self) -> &PlanNodeRef {
        &self.node
    }

    pub fn descriptor(&self) -> &OperatorDescriptor {
        &self.descriptor
    }

    pub fn inputs(&self) -> &[Channel] {
        &self.inputs
    }

    pub fn global_properties(&self) -> &GlobalProperties {
        &self.global_props
    }

    pub fn local_properties(&self) -> &LocalProperties {
        &self.local_props
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn node_cost(&self) -> Cost {
        self.node_cost
    }

    /// Cost of this node and everything upstream of it.
    ///
    /// Summed over input paths: a subplan reached through several inputs, like a source
    /// read by both sides of a cross, is counted once per input. On shared subplans this
    /// exceeds the cost of the plan that is executed, but it does so for every candidate of
    /// the node alike.
    pub fn cumulative_cost(&self) -> Cost {
        self.cumulative_cost
    }

    pub fn branch_plan(&self) -> &BranchPlan {
        &self.branch_plan
    }

    /// Records this candidate as the choice for its own node, which has several consumers.
    pub fn open_branch(&mut self) {
        self.branch_plan.insert(self.node.id(), self.id);
    }
}

/// Everything a candidate consists of, before it is frozen.
pub struct PlanCandidateBuilder {
    candidate: PlanCandidate,
}

impl PlanCandidateBuilder {
    pub fn new(id: CandidateId, node: PlanNodeRef, descriptor: OperatorDescriptor) -> Self {
        Self {
            candidate: PlanCandidate {
                id,
                node,
                descriptor,
                inputs: SmallVec::new(),
                global_props: GlobalProperties::default(),
                local_props: LocalProperties::default(),
                parallelism: 1,
                statistics: Statistics::default(),
                node_cost: Cost::zero(),
                cumulative_cost: Cost::zero(),
                branch_plan: BranchPlan::new(),
            },
        }
    }

    pub fn with_inputs<I: IntoIterator<Item = Channel>>(mut self, inputs: I) -> Self {
        self.candidate.inputs.extend(inputs);
        self
    }

    pub fn with_properties(mut self, global: GlobalProperties, local: LocalProperties) -> Self {
        self.candidate.global_props = global;
        self.candidate.local_props = local;
        self
    }

    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.candidate.parallelism = parallelism;
        self
    }

    pub fn with_statistics(mut self, statistics: Statistics) -> Self {
        self.candidate.statistics = statistics;
        self
    }

    pub fn with_branch_plan(mut self, branch_plan: BranchPlan) -> Self {
        self.candidate.branch_plan = branch_plan;
        self
    }

    pub fn with_node_cost(mut self, node_cost: Cost) -> Self {
        self.candidate.node_cost = node_cost;
        self
    }

    /// Freezes the candidate, accumulating the cost of its inputs.
    pub fn build(self) -> PlanCandidate {
        let mut candidate = self.candidate;
        candidate.cumulative_cost = candidate
            .inputs
            .iter()
            .fold(candidate.node_cost, |acc, channel| {
                acc + channel.cost() + channel.source().cumulative_cost()
            });
        candidate
    }

    pub fn build_ref(self) -> CandidateRef {
        Arc::new(self.build())
    }
}

/// Renders candidates as a table in its `Debug` output.
pub struct CandidateSet<'a> {
    candidates: &'a [CandidateRef],
    weights: &'a CostWeights,
}

impl<'a> CandidateSet<'a> {
    pub fn new(candidates: &'a [CandidateRef], weights: &'a CostWeights) -> Self {
        Self {
            candidates,
            weights,
        }
    }
}

impl<'a> Debug for CandidateSet<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table.add_row(row![
            "Id",
            "Driver",
            "Inputs",
            "Global Properties",
            "Local Properties",
            "Cost"
        ]);
        for candidate in self.candidates {
            let inputs = candidate
                .inputs()
                .iter()
                .map(|c| format!("{} {}", c.ship_strategy(), c.local_strategy()))
                .join(", ");
            table.add_row(row![
                candidate.id(),
                candidate.descriptor(),
                inputs,
                candidate.global_properties(),
                candidate.local_properties(),
                format!("{:.1}", candidate.cumulative_cost().weighted(self.weights))
            ]);
        }

        writeln!(f, "{}", table)
    }
}
