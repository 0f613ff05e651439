use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use itertools::Itertools;
use log::{debug, info, trace};

use crate::candidate::{
    merge_branch_plans, prune, CandidateRef, CandidateSet, Channel, ChannelRequest,
};
use crate::config::OptimizerContext;
use crate::cost::CostEstimator;
use crate::descriptor::{NodeContext, OperatorDescriptor, Requirements};
use crate::error::{CompilerError, OptResult};
use crate::operator::OperatorTrait;
use crate::optimizer::combinations;
use crate::plan::{PlanGraph, PlanNodeId, PlanNodeRef};
use crate::stat::Statistics;

/// Surviving candidates of every node visited so far.
pub(super) struct Enumerator<'a> {
    graph: &'a PlanGraph,
    estimator: &'a CostEstimator,
    candidates: HashMap<PlanNodeId, Vec<CandidateRef>>,
    statistics: HashMap<PlanNodeId, Statistics>,
}

impl<'a> Enumerator<'a> {
    pub(super) fn new(graph: &'a PlanGraph, estimator: &'a CostEstimator) -> Self {
        Self {
            graph,
            estimator,
            candidates: HashMap::new(),
            statistics: HashMap::new(),
        }
    }

    pub(super) fn candidates(&self, node: PlanNodeId) -> &[CandidateRef] {
        self.candidates
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Builds and prunes the candidates of `node`. All inputs must have been enumerated.
    ///
    /// Candidates of a node with several consumers enter their own branch plan only after
    /// pruning, otherwise none of them could dominate another.
    pub(super) fn enumerate(
        &mut self,
        context: &mut OptimizerContext,
        node: &PlanNodeRef,
        parallelism: u32,
    ) -> OptResult<()> {
        info!(
            "Beginning to enumerate candidates of node {} ({})",
            node.id(),
            node.name()
        );

        let input_stats = node
            .inputs()
            .iter()
            .map(|input| self.statistics.get(&input.id()).copied().unwrap_or_default())
            .collect_vec();
        let statistics = Statistics::estimate(node, &input_stats);
        self.statistics.insert(node.id(), statistics);

        let ctx = NodeContext {
            node: node.clone(),
            parallelism,
            statistics,
        };
        let inputs = node
            .inputs()
            .iter()
            .map(|input| self.candidates(input.id()).to_vec())
            .collect_vec();

        let descriptors = node
            .operator()
            .descriptors()
            .into_iter()
            .filter(|d| node.strategy_hints().admits(d.strategy()))
            .collect_vec();

        let mut produced = Vec::new();
        let mut unmet = Vec::new();
        for descriptor in &descriptors {
            for requirements in descriptor.requirements() {
                let before = produced.len();
                self.instantiate_all(context, &ctx, descriptor, &requirements, &inputs, &mut produced);
                if produced.len() == before {
                    unmet.push(format!(
                        "{} [{}]",
                        descriptor,
                        requirements.iter().join(", ")
                    ));
                }
            }
        }

        if produced.is_empty() {
            let requirements = if descriptors.is_empty() {
                "no admissible driver strategy".to_string()
            } else {
                unmet.join("; ")
            };
            bail!(CompilerError::NoFeasibleCandidate {
                node: node.id(),
                name: node.name().to_string(),
                requirements,
            });
        }

        let total = produced.len();
        let mut survivors = prune(produced, self.estimator.weights());
        if self.graph.is_branching(node.id()) {
            survivors = survivors
                .into_iter()
                .map(|candidate| {
                    let mut candidate = (*candidate).clone();
                    candidate.open_branch();
                    Arc::new(candidate)
                })
                .collect();
        }
        debug!(
            "Node {} ({}): {} candidates, {} after pruning\n{:?}",
            node.id(),
            node.name(),
            total,
            survivors.len(),
            CandidateSet::new(&survivors, self.estimator.weights())
        );
        self.candidates.insert(node.id(), survivors);
        Ok(())
    }

    /// Instantiates `descriptor` on every consistent combination of input candidates and
    /// channels meeting `requirements`.
    fn instantiate_all(
        &self,
        context: &mut OptimizerContext,
        ctx: &NodeContext,
        descriptor: &OperatorDescriptor,
        requirements: &Requirements,
        inputs: &[Vec<CandidateRef>],
        produced: &mut Vec<CandidateRef>,
    ) {
        let node = &ctx.node;

        for combination in combinations(inputs) {
            let mut branch_plan =
                match merge_branch_plans(combination.iter().map(|c| c.branch_plan())) {
                    Some(branch_plan) => branch_plan,
                    None => {
                        trace!(
                            "Skipping inputs {:?} of node {}, they disagree on a shared node",
                            combination.iter().map(|c| c.id()).collect_vec(),
                            node.id()
                        );
                        continue;
                    }
                };
            branch_plan.retain(|branch, _| !self.graph.closes_branch(*branch, node.id()));

            let channel_options = combination
                .iter()
                .zip(requirements.iter())
                .enumerate()
                .map(|(idx, (source, requirement))| {
                    let request = ChannelRequest {
                        requirement,
                        partitioning_keys: descriptor.partitioning_keys(idx),
                        combinable: descriptor.is_combinable(),
                        forced: node.strategy_hints().ship_strategy(idx),
                        target_parallelism: ctx.parallelism,
                    };
                    Channel::synthesize(source, &request, self.estimator)
                })
                .collect_vec();

            for channels in combinations(&channel_options) {
                let delivered = channels.iter().map(|c| c.global_properties()).collect_vec();
                if !descriptor.are_inputs_compatible(&delivered) {
                    trace!(
                        "Skipping {} of node {}, inputs are not co-partitioned",
                        descriptor,
                        node.id()
                    );
                    continue;
                }

                let candidate = descriptor.instantiate(
                    context.next_candidate_id(),
                    ctx,
                    channels.into_iter().cloned().collect(),
                    branch_plan.clone(),
                    self.estimator,
                );
                produced.push(Arc::new(candidate));
            }
        }
    }
}
