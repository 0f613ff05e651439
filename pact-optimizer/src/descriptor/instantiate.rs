use crate::candidate::{BranchPlan, CandidateId, Channel, PlanCandidate, PlanCandidateBuilder};
use crate::cost::CostEstimator;
use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldSet;
use crate::operator::{Operator, OperatorTrait};
use crate::plan::PlanNodeRef;
use crate::stat::Statistics;

/// Facts about a logical node shared by all of its candidates.
#[derive(Clone, Debug)]
pub struct NodeContext {
    pub node: PlanNodeRef,
    pub parallelism: u32,
    pub statistics: Statistics,
}

impl OperatorDescriptor {
    /// Builds the candidate executing `ctx.node` with this strategy on top of `inputs`.
    ///
    /// What each channel delivers is first restricted to the fields the operator preserves
    /// from that input, then the output properties are derived from it. Unique fields
    /// declared in the node's hints are added last.
    pub fn instantiate(
        &self,
        id: CandidateId,
        ctx: &NodeContext,
        inputs: Vec<Channel>,
        branch_plan: BranchPlan,
        estimator: &CostEstimator,
    ) -> PlanCandidate {
        let operator = ctx.node.operator();

        let empty = FieldSet::empty();
        let retained = |input: usize| operator.preserved_fields(input).unwrap_or(&empty);

        let (mut global, mut local) = match operator {
            Operator::Source(source) => (
                self.compute_global_properties(&[source.global_properties().clone()]),
                self.compute_local_properties(&[source.local_properties().clone()]),
            ),
            Operator::Sink(_) => {
                let globals: Vec<_> = inputs.iter().map(|c| c.global_properties().clone()).collect();
                let locals: Vec<_> = inputs.iter().map(|c| c.local_properties().clone()).collect();
                (
                    self.compute_global_properties(&globals),
                    self.compute_local_properties(&locals),
                )
            }
            _ => {
                let globals: Vec<_> = inputs
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c.global_properties().filter_by_fields(retained(i)))
                    .collect();
                let locals: Vec<_> = inputs
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c.local_properties().filter_by_fields(retained(i)))
                    .collect();
                // Orderings and groupings the driver establishes itself are on first input keys.
                (
                    self.compute_global_properties(&globals),
                    self.compute_local_properties(&locals)
                        .filter_by_fields(retained(0)),
                )
            }
        };

        for unique in ctx.node.hints().unique_fields() {
            global.add_unique_field_combination(unique.clone());
            local.add_unique_fields(unique.clone());
        }

        let input_stats: Vec<Statistics> = match operator {
            Operator::Source(_) => vec![ctx.statistics],
            _ => inputs.iter().map(|c| c.source().statistics()).collect(),
        };
        let node_cost = estimator.driver_cost(self, &input_stats);

        PlanCandidateBuilder::new(id, ctx.node.clone(), self.clone())
            .with_inputs(inputs)
            .with_properties(global, local)
            .with_parallelism(ctx.parallelism)
            .with_statistics(ctx.statistics)
            .with_branch_plan(branch_plan)
            .with_node_cost(node_cost)
            .build()
    }
}
