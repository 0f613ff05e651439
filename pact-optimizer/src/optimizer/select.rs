use crate::candidate::{merge_branch_plans, CandidateRef};
use crate::cost::CostWeights;
use crate::optimizer::combinations;

/// Picks one candidate per sink, such that all picks agree on shared nodes, with minimal
/// total weighted cost.
///
/// On equal cost the combination found first, in declaration order, wins. `None` if no
/// combination is consistent.
pub(super) fn select_sinks(
    sinks: &[Vec<CandidateRef>],
    weights: &CostWeights,
) -> Option<Vec<CandidateRef>> {
    let mut best: Option<(f64, Vec<CandidateRef>)> = None;

    for combination in combinations(sinks) {
        if merge_branch_plans(combination.iter().map(|c| c.branch_plan())).is_none() {
            continue;
        }

        let cost: f64 = combination
            .iter()
            .map(|c| c.cumulative_cost().weighted(weights))
            .sum();
        if best.as_ref().map_or(true, |(best_cost, _)| cost < *best_cost) {
            best = Some((cost, combination.into_iter().cloned().collect()));
        }
    }

    best.map(|(_, chosen)| chosen)
}

#[cfg(test)]
mod tests {
    use crate::cost::{Cost, CostWeights};
    use crate::optimizer::select::select_sinks;
    use crate::properties::{GlobalProperties, LocalProperties};
    use crate::test_utils::candidate_with_cost;

    fn cost(network: f64) -> Cost {
        Cost::new(network, 0.0, 0.0)
    }

    #[test]
    fn test_first_wins_ties() {
        let first = candidate_with_cost(0, GlobalProperties::random(), LocalProperties::none(), cost(1.0), 0);
        let second = candidate_with_cost(1, GlobalProperties::random(), LocalProperties::none(), cost(1.0), 0);

        let chosen = select_sinks(&[vec![first, second]], &CostWeights::default()).unwrap();
        assert_eq!(0, chosen[0].id());
    }

    #[test]
    fn test_consistent_sinks() {
        let weights = CostWeights::default();
        let cheap_a = candidate_with_cost(0, GlobalProperties::random(), LocalProperties::none(), cost(1.0), 0);
        let costly_a = candidate_with_cost(1, GlobalProperties::random(), LocalProperties::none(), cost(5.0), 1);
        let cheap_b = candidate_with_cost(2, GlobalProperties::random(), LocalProperties::none(), cost(1.0), 1);
        let costly_b = candidate_with_cost(3, GlobalProperties::random(), LocalProperties::none(), cost(2.0), 0);

        let chosen = select_sinks(
            &[vec![cheap_a, costly_a], vec![cheap_b, costly_b]],
            &weights,
        )
        .unwrap();
        assert_eq!(vec![0, 3], chosen.iter().map(|c| c.id()).collect::<Vec<_>>());

        let a = candidate_with_cost(4, GlobalProperties::random(), LocalProperties::none(), cost(1.0), 0);
        let b = candidate_with_cost(5, GlobalProperties::random(), LocalProperties::none(), cost(1.0), 1);
        assert!(select_sinks(&[vec![a], vec![b]], &weights).is_none());
    }
}
