//! Bottom-up optimizer for data flow programs.
//!
//! Nodes are visited in topological order. For every node, all physical candidates are built
//! on top of the surviving candidates of its inputs, then dominated ones are dropped. At the
//! end one candidate per sink is chosen, and the candidates they reach form the optimized
//! plan.
mod enumerate;
mod select;

use anyhow::bail;
use itertools::Itertools;
use log::info;

use crate::config::{OptimizerConfig, OptimizerContext};
use crate::cost::CostEstimator;
use crate::error::{CompilerError, OptResult};
use crate::optimizer::enumerate::Enumerator;
use crate::optimizer::select::select_sinks;
use crate::plan::{OptimizedPlan, Plan, PlanGraph, PlanNode};

pub struct PactOptimizer {
    context: OptimizerContext,
    estimator: CostEstimator,
}

impl Default for PactOptimizer {
    fn default() -> Self {
        Self {
            context: OptimizerContext::default(),
            estimator: CostEstimator::default(),
        }
    }
}

impl PactOptimizer {
    pub fn new(config: OptimizerConfig) -> OptResult<Self> {
        config.validate()?;
        Ok(Self {
            estimator: CostEstimator::new(&config),
            context: OptimizerContext::new(config),
        })
    }

    pub fn context(&self) -> &OptimizerContext {
        &self.context
    }

    /// Chooses a strategy for every node reachable from the sinks of `plan`.
    pub fn optimize(&mut self, plan: &Plan) -> OptResult<OptimizedPlan> {
        if plan.sinks().is_empty() {
            bail!(CompilerError::EmptyPlan);
        }

        info!("Beginning to optimize job {:?}", plan.job_name());
        let graph = PlanGraph::from_sinks(plan.sinks())?;
        let order = graph.topological_order()?;
        info!("Plan graph has {} nodes", graph.len());

        let mut enumerator = Enumerator::new(&graph, &self.estimator);
        for node in &order {
            let parallelism = self.parallelism(plan, node)?;
            enumerator.enumerate(&mut self.context, node, parallelism)?;
        }

        info!("Beginning to select sink candidates");
        let sink_candidates = plan
            .sinks()
            .iter()
            .map(|sink| enumerator.candidates(sink.id()).to_vec())
            .collect_vec();
        let chosen = match select_sinks(&sink_candidates, self.estimator.weights()) {
            Some(chosen) => chosen,
            None => bail!(CompilerError::NoFeasibleCandidate {
                node: plan.sinks()[0].id(),
                name: plan.sinks()[0].name().to_string(),
                requirements: "no combination of sink candidates agrees on shared nodes"
                    .to_string(),
            }),
        };

        let optimized = OptimizedPlan::from_candidates(plan, &order, &chosen)?;
        info!(
            "Optimized job {:?}, total weighted cost {:.2}",
            plan.job_name(),
            optimized.total_cost().weighted(self.estimator.weights())
        );
        Ok(optimized)
    }

    fn parallelism(&self, plan: &Plan, node: &PlanNode) -> OptResult<u32> {
        let parallelism = node
            .parallelism()
            .or_else(|| plan.default_parallelism())
            .unwrap_or(self.context.config().default_parallelism);
        if parallelism == 0 {
            bail!(CompilerError::InvalidParallelism {
                node: node.id(),
                parallelism,
            });
        }
        Ok(parallelism)
    }
}

/// Every way to pick one element of each list, in declaration order.
///
/// No lists yield exactly one empty combination.
fn combinations<T>(options: &[Vec<T>]) -> Vec<Vec<&T>> {
    if options.is_empty() {
        return vec![vec![]];
    }
    options
        .iter()
        .map(|o| o.iter())
        .multi_cartesian_product()
        .collect()
}
