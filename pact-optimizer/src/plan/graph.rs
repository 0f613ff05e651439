use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::prelude::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};

use crate::error::{CompilerError, OptResult};
use crate::plan::{PlanNodeId, PlanNodeRef};

/// Edges point from a consumer to its inputs, weighted by the input position.
type NodeGraph = StableGraph<PlanNodeRef, usize, Directed, PlanNodeId>;
type GraphNodeId = NodeIndex<PlanNodeId>;

/// The part of a program reachable from its sinks.
#[derive(Default)]
pub struct PlanGraph {
    graph: NodeGraph,
    indices: HashMap<PlanNodeId, GraphNodeId>,
}

impl PlanGraph {
    /// Collects every node reachable from `sinks`, walking inputs with an explicit stack.
    ///
    /// Two distinct nodes sharing an id are rejected.
    pub fn from_sinks(sinks: &[PlanNodeRef]) -> OptResult<Self> {
        let mut plan_graph = PlanGraph::default();
        let mut stack: Vec<PlanNodeRef> = sinks.iter().rev().cloned().collect();
        let mut visited = Vec::new();

        while let Some(node) = stack.pop() {
            if let Some(idx) = plan_graph.indices.get(&node.id()) {
                if !Arc::ptr_eq(&plan_graph.graph[*idx], &node) {
                    bail!(CompilerError::InvalidOperator(format!(
                        "node id {} is used by both {} and {}",
                        node.id(),
                        plan_graph.graph[*idx].name(),
                        node.name()
                    )));
                }
                continue;
            }

            let idx = plan_graph.graph.add_node(node.clone());
            plan_graph.indices.insert(node.id(), idx);
            stack.extend(node.inputs().iter().rev().cloned());
            visited.push(idx);
        }

        for idx in visited {
            let node = plan_graph.graph[idx].clone();
            for (position, input) in node.inputs().iter().enumerate() {
                let input_idx = plan_graph.indices[&input.id()];
                plan_graph.graph.add_edge(idx, input_idx, position);
            }
        }

        Ok(plan_graph)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: PlanNodeId) -> bool {
        self.indices.contains_key(&id)
    }

    /// Number of input slots consuming node `id`.
    pub fn consumer_count(&self, id: PlanNodeId) -> usize {
        self.indices
            .get(&id)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    /// A branching node feeds several consumers, or one consumer several times.
    pub fn is_branching(&self, id: PlanNodeId) -> bool {
        self.consumer_count(id) > 1
    }

    /// Tests whether every consumer of `branch` feeds into `node`.
    ///
    /// Once that holds, the choice made for `branch` is fixed by the candidate of `node` and
    /// needs no tracking further down.
    pub fn closes_branch(&self, branch: PlanNodeId, node: PlanNodeId) -> bool {
        match (self.indices.get(&branch), self.indices.get(&node)) {
            (Some(branch_idx), Some(node_idx)) => self
                .graph
                .neighbors_directed(*branch_idx, Direction::Incoming)
                .all(|consumer| has_path_connecting(&self.graph, *node_idx, consumer, None)),
            _ => false,
        }
    }

    /// Nodes ordered so that every node comes after all of its inputs.
    pub fn topological_order(&self) -> OptResult<Vec<PlanNodeRef>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .rev()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => bail!(CompilerError::InvalidOperator(format!(
                "plan contains a cycle through node {}",
                self.graph[cycle.node_id()].id()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CompilerError;
    use crate::operator::{Cross, DataSink, DataSource, Join};
    use crate::plan::{LogicalPlanBuilder, PlanGraph, PlanNodeBuilder};

    #[test]
    fn test_diamond() {
        let mut builder = LogicalPlanBuilder::new();
        let source = builder.source("src", DataSource::new()).build().unwrap();
        let sink = builder
            .start_from(source.clone())
            .cross("cross", Cross::new(), source.clone())
            .sink("sink")
            .build()
            .unwrap();

        let graph = PlanGraph::from_sinks(&[sink.clone()]).unwrap();
        assert_eq!(3, graph.len());
        assert!(graph.is_branching(source.id()));
        assert!(!graph.is_branching(sink.inputs()[0].id()));

        let order: Vec<_> = graph
            .topological_order()
            .unwrap()
            .iter()
            .map(|n| n.name().to_string())
            .collect();
        assert_eq!(vec!["src", "cross", "sink"], order);
        assert!(graph.closes_branch(source.id(), sink.inputs()[0].id()));
        assert!(graph.closes_branch(source.id(), sink.id()));
    }

    #[test]
    fn test_unreachable_nodes_excluded() {
        let mut builder = LogicalPlanBuilder::new();
        let orphan = builder.source("orphan", DataSource::new()).build().unwrap();
        let sink = builder
            .source("src", DataSource::new())
            .sink("sink")
            .build()
            .unwrap();

        let graph = PlanGraph::from_sinks(&[sink]).unwrap();
        assert_eq!(2, graph.len());
        assert!(!graph.contains(orphan.id()));
    }

    #[test]
    fn test_two_sinks_order() {
        let mut builder = LogicalPlanBuilder::new();
        let left = builder.source("left", DataSource::new()).build().unwrap();
        let right = builder.source("right", DataSource::new()).build().unwrap();
        let join = builder
            .start_from(left)
            .join(
                "join",
                Join::new([0], [0]).unwrap(),
                right,
            )
            .build()
            .unwrap();
        let first = builder.start_from(join.clone()).sink("first").build().unwrap();
        let second = builder.start_from(join.clone()).sink("second").build().unwrap();

        let graph = PlanGraph::from_sinks(&[first.clone(), second.clone()]).unwrap();
        assert!(graph.is_branching(join.id()));

        let order = graph.topological_order().unwrap();
        let position = |name: &str| order.iter().position(|n| n.name() == name).unwrap();
        assert!(position("left") < position("join"));
        assert!(position("right") < position("join"));
        assert!(position("join") < position("first"));
        assert!(position("join") < position("second"));

        assert!(!graph.closes_branch(join.id(), first.id()));
        assert!(!graph.closes_branch(join.id(), second.id()));
    }

    #[test]
    fn test_duplicate_ids() {
        let a = PlanNodeBuilder::new(0, "a", DataSource::new())
            .build_ref()
            .unwrap();
        let b = PlanNodeBuilder::new(0, "b", DataSource::new())
            .build_ref()
            .unwrap();
        let cross = PlanNodeBuilder::new(1, "cross", Cross::new())
            .add_inputs(vec![a, b])
            .build_ref()
            .unwrap();
        let sink = PlanNodeBuilder::new(2, "sink", DataSink::new())
            .add_inputs(vec![cross])
            .build_ref()
            .unwrap();

        let err = PlanGraph::from_sinks(&[sink]).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<CompilerError>(),
            Some(CompilerError::InvalidOperator(_))
        ));
    }
}
