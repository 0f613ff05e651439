use crate::candidate::{CandidateRef, PlanCandidate};
use crate::cost::CostWeights;

/// Tests whether `a` strictly dominates `b`.
///
/// `a` dominates `b` if both made the same choices for branching ancestors, `a` delivers
/// properties at least as strong as `b` for less or equal cost, and `a` is strictly better
/// in properties or in cost. Candidates equal in both are kept side by side.
pub fn dominates(a: &PlanCandidate, b: &PlanCandidate, weights: &CostWeights) -> bool {
    if a.branch_plan() != b.branch_plan() {
        return false;
    }

    let a_covers_b = a.global_properties().is_at_least_as_strong_as(b.global_properties())
        && a.local_properties().is_at_least_as_strong_as(b.local_properties());
    if !a_covers_b {
        return false;
    }

    let a_cost = a.cumulative_cost().weighted(weights);
    let b_cost = b.cumulative_cost().weighted(weights);
    if a_cost > b_cost {
        return false;
    }

    let b_covers_a = b.global_properties().is_at_least_as_strong_as(a.global_properties())
        && b.local_properties().is_at_least_as_strong_as(a.local_properties());
    a_cost < b_cost || !b_covers_a
}

/// Drops every candidate dominated by another one. Survivors keep their order.
pub fn prune(candidates: Vec<CandidateRef>, weights: &CostWeights) -> Vec<CandidateRef> {
    candidates
        .iter()
        .filter(|b| !candidates.iter().any(|a| dominates(a, b, weights)))
        .cloned()
        .collect()
}
