use anyhow::anyhow;

use crate::error::{CompilerError, OptResult};
use crate::hints::CompilerHints;
use crate::operator::{Cross, DataSink, DataSource, Join, Map, Operator, Reduce};
use crate::plan::{PlanNode, PlanNodeBuilder, PlanNodeId, PlanNodeRef, StrategyHints};

enum Root {
    /// Added by this builder, settings may still change.
    Pending(PlanNode),
    Built(PlanNodeRef),
}

/// Builds a data flow program one node at a time.
///
/// Each call appends a node consuming the current root. Node settings such as
/// [`LogicalPlanBuilder::parallelism`] apply to the node added last.
pub struct LogicalPlanBuilder {
    root: Option<Root>,
    next_plan_node_id: PlanNodeId,
    error: Option<anyhow::Error>,
}

impl Default for LogicalPlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicalPlanBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            next_plan_node_id: 0,
            error: None,
        }
    }

    fn reset_root(&mut self, new_root: OptResult<PlanNode>) -> &mut Self {
        match new_root {
            Ok(node) => {
                self.root = Some(Root::Pending(node));
                self.next_plan_node_id += 1;
            }
            Err(e) => self.fail(e),
        }
        self
    }

    fn fail(&mut self, e: anyhow::Error) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    fn take_root(&mut self, operator: &str) -> Option<PlanNodeRef> {
        match self.root.take() {
            Some(Root::Pending(node)) => Some(node.into()),
            Some(Root::Built(node)) => Some(node),
            None => {
                self.fail(anyhow!(CompilerError::InvalidOperator(format!(
                    "{} has no input",
                    operator
                ))));
                None
            }
        }
    }

    fn add_node<S, O>(&mut self, name: S, operator: O, extra_input: Option<PlanNodeRef>) -> &mut Self
    where
        S: Into<String>,
        O: Into<Operator>,
    {
        let name = name.into();
        let input = match self.take_root(&name) {
            Some(input) => input,
            None => return self,
        };

        let node = PlanNodeBuilder::new(self.next_plan_node_id, name, operator)
            .add_inputs(std::iter::once(input).chain(extra_input))
            .build();
        self.reset_root(node)
    }

    /// Starts a new branch from a source.
    pub fn source<S: Into<String>>(&mut self, name: S, source: DataSource) -> &mut Self {
        let node = PlanNodeBuilder::new(self.next_plan_node_id, name, source).build();
        self.reset_root(node)
    }

    /// Continues from a node built earlier, e.g. to consume it twice.
    pub fn start_from(&mut self, node: PlanNodeRef) -> &mut Self {
        self.root = Some(Root::Built(node));
        self
    }

    pub fn map<S: Into<String>>(&mut self, name: S, map: Map) -> &mut Self {
        self.add_node(name, map, None)
    }

    pub fn reduce<S: Into<String>>(&mut self, name: S, reduce: Reduce) -> &mut Self {
        self.add_node(name, reduce, None)
    }

    /// Joins the current root, as first input, with `right`.
    pub fn join<S: Into<String>>(&mut self, name: S, join: Join, right: PlanNodeRef) -> &mut Self {
        self.add_node(name, join, Some(right))
    }

    pub fn cross<S: Into<String>>(&mut self, name: S, cross: Cross, right: PlanNodeRef) -> &mut Self {
        self.add_node(name, cross, Some(right))
    }

    pub fn sink<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.add_node(name, DataSink::new(), None)
    }

    pub fn parallelism(&mut self, parallelism: u32) -> &mut Self {
        if let Some(Root::Pending(root)) = self.root.as_mut() {
            root.parallelism = Some(parallelism);
        }
        self
    }

    pub fn hints(&mut self, hints: CompilerHints) -> &mut Self {
        if let Some(Root::Pending(root)) = self.root.as_mut() {
            root.hints = hints;
        }
        self
    }

    pub fn strategy_hints(&mut self, strategy_hints: StrategyHints) -> &mut Self {
        if let Some(Root::Pending(root)) = self.root.as_mut() {
            root.strategy_hints = strategy_hints;
        }
        self
    }

    /// Consume current root, but not rest state, e.g. plan node id.
    ///
    /// This is useful for building multi input plans, e.g. join.
    pub fn build(&mut self) -> OptResult<PlanNodeRef> {
        if let Some(e) = self.error.take() {
            self.root = None;
            return Err(e);
        }

        match self.root.take() {
            Some(Root::Pending(node)) => Ok(node.into()),
            Some(Root::Built(node)) => Ok(node),
            None => Err(anyhow!(CompilerError::EmptyPlan)),
        }
    }
}
