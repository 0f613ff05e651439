use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::bail;
use enumset::EnumSet;
use smallvec::SmallVec;

use crate::candidate::ShipStrategyType;
use crate::descriptor::DriverStrategy;
use crate::error::{CompilerError, OptResult};
use crate::hints::CompilerHints;
use crate::operator::{Operator, OperatorTrait};

mod logical;
pub use logical::*;
mod graph;
pub use graph::*;
mod physical;
pub use physical::*;
pub mod explain;

pub type PlanNodeId = u32;

pub type PlanNodeRef = Arc<PlanNode>;

/// Restrictions the user places on the physical execution of one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyHints {
    drivers: Option<EnumSet<DriverStrategy>>,
    ship: [Option<ShipStrategyType>; 2],
}

impl StrategyHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only consider the given driver strategies.
    pub fn with_drivers(mut self, drivers: EnumSet<DriverStrategy>) -> Self {
        self.drivers = Some(drivers);
        self
    }

    /// Force how records are shipped to input `input`.
    pub fn with_ship_strategy(mut self, input: usize, ship: ShipStrategyType) -> Self {
        if let Some(slot) = self.ship.get_mut(input) {
            *slot = Some(ship);
        }
        self
    }

    pub fn admits(&self, driver: DriverStrategy) -> bool {
        self.drivers
            .map(|drivers| drivers.contains(driver))
            .unwrap_or(true)
    }

    pub fn ship_strategy(&self, input: usize) -> Option<ShipStrategyType> {
        self.ship.get(input).copied().flatten()
    }
}

/// One operator in a data flow program.
///
/// Nodes are immutable once built and share their inputs through [`Arc`], so a node feeding
/// several consumers appears once in the graph.
#[derive(Clone, Debug)]
pub struct PlanNode {
    id: PlanNodeId,
    name: String,
    operator: Operator,
    inputs: SmallVec<[PlanNodeRef; 2]>,
    /// `None` inherits the default of the plan.
    parallelism: Option<u32>,
    hints: CompilerHints,
    strategy_hints: StrategyHints,
}

/// The `eq` should ignore `id`.
impl PartialEq for PlanNode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.operator == other.operator
            && self.inputs == other.inputs
            && self.parallelism == other.parallelism
            && self.hints == other.hints
            && self.strategy_hints == other.strategy_hints
    }
}

impl PlanNode {
    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn inputs(&self) -> &[PlanNodeRef] {
        &self.inputs
    }

    pub fn parallelism(&self) -> Option<u32> {
        self.parallelism
    }

    pub fn hints(&self) -> &CompilerHints {
        &self.hints
    }

    pub fn strategy_hints(&self) -> &StrategyHints {
        &self.strategy_hints
    }
}

pub struct PlanNodeBuilder {
    plan_node: PlanNode,
}

impl PlanNodeBuilder {
    pub fn new<S: Into<String>, O: Into<Operator>>(id: PlanNodeId, name: S, operator: O) -> Self {
        Self {
            plan_node: PlanNode {
                id,
                name: name.into(),
                operator: operator.into(),
                inputs: SmallVec::new(),
                parallelism: None,
                hints: CompilerHints::default(),
                strategy_hints: StrategyHints::default(),
            },
        }
    }

    pub fn add_inputs<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = PlanNodeRef>,
    {
        self.plan_node.inputs.extend(inputs);
        self
    }

    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.plan_node.parallelism = Some(parallelism);
        self
    }

    pub fn with_hints(mut self, hints: CompilerHints) -> Self {
        self.plan_node.hints = hints;
        self
    }

    pub fn with_strategy_hints(mut self, strategy_hints: StrategyHints) -> Self {
        self.plan_node.strategy_hints = strategy_hints;
        self
    }

    /// Checks the wiring of the node against its operator.
    pub fn build(self) -> OptResult<PlanNode> {
        let node = self.plan_node;
        let arity = node.operator.arity();
        if node.inputs.len() != arity {
            bail!(CompilerError::InvalidOperator(format!(
                "{} ({}) expects {} inputs, got {}",
                node.name,
                node.operator.as_ref(),
                arity,
                node.inputs.len()
            )));
        }
        Ok(node)
    }

    pub fn build_ref(self) -> OptResult<PlanNodeRef> {
        self.build().map(Arc::new)
    }
}

/// A data flow program.
///
/// The program is a dag(directed acyclic graph) ending in data sinks. Only nodes reachable
/// from a registered sink belong to the program.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    job_name: String,
    sinks: Vec<PlanNodeRef>,
    default_parallelism: Option<u32>,
    max_machines: Option<u32>,
    /// Files distributed to every worker, by name.
    cache_files: BTreeMap<String, String>,
}

impl Plan {
    pub fn new<S: Into<String>>(job_name: S) -> Self {
        Self {
            job_name: job_name.into(),
            ..Self::default()
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Registers a sink. Adding the same sink twice has no effect.
    pub fn add_sink(&mut self, sink: PlanNodeRef) -> &mut Self {
        if !self.sinks.iter().any(|s| Arc::ptr_eq(s, &sink)) {
            self.sinks.push(sink);
        }
        self
    }

    pub fn sinks(&self) -> &[PlanNodeRef] {
        &self.sinks
    }

    pub fn set_default_parallelism(&mut self, parallelism: u32) -> &mut Self {
        self.default_parallelism = Some(parallelism);
        self
    }

    pub fn default_parallelism(&self) -> Option<u32> {
        self.default_parallelism
    }

    pub fn set_max_machines(&mut self, max_machines: u32) -> &mut Self {
        self.max_machines = Some(max_machines);
        self
    }

    pub fn max_machines(&self) -> Option<u32> {
        self.max_machines
    }

    /// Registers the file at `path` under `name`.
    ///
    /// Names are unique, a second registration of a name fails and keeps the first path.
    pub fn register_cached_file<P, N>(&mut self, path: P, name: N) -> OptResult<()>
    where
        P: Into<String>,
        N: Into<String>,
    {
        let name = name.into();
        if let Some(existing) = self.cache_files.get(&name) {
            bail!(CompilerError::DuplicateCacheFile {
                existing: existing.clone(),
                name,
            });
        }
        self.cache_files.insert(name, path.into());
        Ok(())
    }

    pub fn cached_files(&self) -> &BTreeMap<String, String> {
        &self.cache_files
    }
}
