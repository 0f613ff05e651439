use std::collections::{BTreeMap, HashMap};

use anyhow::bail;
use serde::Serialize;

use crate::candidate::{CandidateRef, LocalStrategy, ShipStrategy};
use crate::cost::Cost;
use crate::descriptor::OperatorDescriptor;
use crate::error::{CompilerError, OptResult};
use crate::plan::{Plan, PlanNodeId, PlanNodeRef};
use crate::properties::{GlobalProperties, LocalProperties};
use crate::stat::Statistics;

/// Input edge of a node in the optimized plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhysicalChannel {
    source: PlanNodeId,
    ship_strategy: ShipStrategy,
    local_strategy: LocalStrategy,
    replication_factor: u32,
    cost: Cost,
}

impl PhysicalChannel {
    pub fn source(&self) -> PlanNodeId {
        self.source
    }

    pub fn ship_strategy(&self) -> &ShipStrategy {
        &self.ship_strategy
    }

    pub fn local_strategy(&self) -> &LocalStrategy {
        &self.local_strategy
    }

    pub fn replication_factor(&self) -> u32 {
        self.replication_factor
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }
}

/// A logical node together with the strategy chosen to execute it.
#[derive(Clone, Debug, Serialize)]
pub struct PhysicalPlanNode {
    id: PlanNodeId,
    name: String,
    operator: String,
    #[serde(skip)]
    descriptor: OperatorDescriptor,
    driver: String,
    parallelism: u32,
    global_props: GlobalProperties,
    local_props: LocalProperties,
    statistics: Statistics,
    node_cost: Cost,
    cumulative_cost: Cost,
    inputs: Vec<PhysicalChannel>,
}

impl PhysicalPlanNode {
    fn from_candidate(candidate: &CandidateRef) -> Self {
        let inputs = candidate
            .inputs()
            .iter()
            .map(|channel| PhysicalChannel {
                source: channel.source().node().id(),
                ship_strategy: channel.ship_strategy().clone(),
                local_strategy: channel.local_strategy().clone(),
                replication_factor: channel.replication_factor(),
                cost: channel.cost(),
            })
            .collect();

        Self {
            id: candidate.node().id(),
            name: candidate.node().name().to_string(),
            operator: candidate.node().operator().as_ref().to_string(),
            descriptor: candidate.descriptor().clone(),
            driver: candidate.descriptor().strategy().as_ref().to_string(),
            parallelism: candidate.parallelism(),
            global_props: candidate.global_properties().clone(),
            local_props: candidate.local_properties().clone(),
            statistics: candidate.statistics(),
            node_cost: candidate.node_cost(),
            cumulative_cost: candidate.cumulative_cost(),
            inputs,
        }
    }

    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn descriptor(&self) -> &OperatorDescriptor {
        &self.descriptor
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn global_properties(&self) -> &GlobalProperties {
        &self.global_props
    }

    pub fn local_properties(&self) -> &LocalProperties {
        &self.local_props
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn node_cost(&self) -> Cost {
        self.node_cost
    }

    pub fn cumulative_cost(&self) -> Cost {
        self.cumulative_cost
    }

    pub fn inputs(&self) -> &[PhysicalChannel] {
        &self.inputs
    }
}

/// Result of optimizing a [`Plan`]: exactly one strategy per reachable node.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizedPlan {
    job_name: String,
    /// Every node comes after its inputs.
    nodes: Vec<PhysicalPlanNode>,
    #[serde(skip)]
    index: HashMap<PlanNodeId, usize>,
    sinks: Vec<PlanNodeId>,
    max_machines: Option<u32>,
    cache_files: BTreeMap<String, String>,
}

impl OptimizedPlan {
    /// Collects the candidates reachable from the chosen sink candidates.
    ///
    /// `order` lists the logical nodes so that inputs come first. Fails if two reachable
    /// candidates execute the same logical node.
    pub fn from_candidates(
        plan: &Plan,
        order: &[PlanNodeRef],
        sinks: &[CandidateRef],
    ) -> OptResult<Self> {
        let mut chosen: HashMap<PlanNodeId, CandidateRef> = HashMap::new();
        let mut stack: Vec<CandidateRef> = sinks.to_vec();

        while let Some(candidate) = stack.pop() {
            let node_id = candidate.node().id();
            if let Some(existing) = chosen.get(&node_id) {
                if existing.id() != candidate.id() {
                    bail!(CompilerError::InvalidOperator(format!(
                        "node {} would be executed by candidates {} and {}",
                        candidate.node().name(),
                        existing.id(),
                        candidate.id()
                    )));
                }
                continue;
            }

            stack.extend(candidate.inputs().iter().map(|c| c.source().clone()));
            chosen.insert(node_id, candidate);
        }

        let nodes: Vec<PhysicalPlanNode> = order
            .iter()
            .filter_map(|node| chosen.get(&node.id()))
            .map(PhysicalPlanNode::from_candidate)
            .collect();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id(), idx))
            .collect();

        Ok(Self {
            job_name: plan.job_name().to_string(),
            nodes,
            index,
            sinks: sinks.iter().map(|c| c.node().id()).collect(),
            max_machines: plan.max_machines(),
            cache_files: plan.cached_files().clone(),
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn nodes(&self) -> &[PhysicalPlanNode] {
        &self.nodes
    }

    pub fn node(&self, id: PlanNodeId) -> Option<&PhysicalPlanNode> {
        self.index.get(&id).map(|idx| &self.nodes[*idx])
    }

    pub fn sinks(&self) -> &[PlanNodeId] {
        &self.sinks
    }

    pub fn max_machines(&self) -> Option<u32> {
        self.max_machines
    }

    pub fn cached_files(&self) -> &BTreeMap<String, String> {
        &self.cache_files
    }

    /// Sum of the cumulative costs of all sinks.
    ///
    /// Shared nodes are counted once per sink reaching them.
    pub fn total_cost(&self) -> Cost {
        self.sinks
            .iter()
            .filter_map(|id| self.node(*id))
            .fold(Cost::zero(), |acc, node| acc + node.cumulative_cost())
    }

    pub fn to_json(&self) -> OptResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
