use crate::candidate::{BranchPlan, CandidateId, CandidateRef, PlanCandidateBuilder};
use crate::cost::Cost;
use crate::descriptor::OperatorDescriptor;
use crate::operator::DataSource;
use crate::plan::{PlanNodeBuilder, PlanNodeId};
use crate::properties::{GlobalProperties, LocalProperties};

/// A source candidate delivering the given properties, without statistics.
pub fn source_candidate(
    id: CandidateId,
    global: GlobalProperties,
    local: LocalProperties,
    parallelism: u32,
) -> CandidateRef {
    let source = DataSource::new()
        .with_global_properties(global.clone())
        .with_local_properties(local.clone());
    let node = PlanNodeBuilder::new(id as PlanNodeId, format!("src{}", id), source)
        .with_parallelism(parallelism)
        .build_ref()
        .unwrap();

    PlanCandidateBuilder::new(id, node, OperatorDescriptor::SourceScan)
        .with_properties(global, local)
        .with_parallelism(parallelism)
        .build_ref()
}

/// A candidate with fixed cost, which chose candidate `branch` for a shared ancestor.
pub fn candidate_with_cost(
    id: CandidateId,
    global: GlobalProperties,
    local: LocalProperties,
    cost: Cost,
    branch: u32,
) -> CandidateRef {
    let node = PlanNodeBuilder::new(0, "src", DataSource::new())
        .build_ref()
        .unwrap();
    let mut branch_plan = BranchPlan::new();
    branch_plan.insert(100, branch as CandidateId);

    PlanCandidateBuilder::new(id, node, OperatorDescriptor::SourceScan)
        .with_properties(global, local)
        .with_branch_plan(branch_plan)
        .with_node_cost(cost)
        .build_ref()
}
