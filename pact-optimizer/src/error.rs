use thiserror::Error;

use crate::plan::PlanNodeId;

pub type OptResult<T> = anyhow::Result<T>;

/// Errors raised while building or optimizing a plan.
///
/// They travel inside [`anyhow::Error`], so callers interested in the kind should
/// `downcast_ref::<CompilerError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Invalid value {value} for compiler hint {name}, must be >= 0")]
    InvalidHint { name: &'static str, value: f64 },

    #[error("Cache file {name} already exists, registered with path {existing}")]
    DuplicateCacheFile { name: String, existing: String },

    #[error("No feasible physical plan for node {node} ({name}), unmet requirements: {requirements}")]
    NoFeasibleCandidate {
        node: PlanNodeId,
        name: String,
        requirements: String,
    },

    #[error("Invalid parallelism {parallelism} for node {node}")]
    InvalidParallelism { node: PlanNodeId, parallelism: u32 },

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Plan has no data sinks")]
    EmptyPlan,

    #[error("Invalid optimizer config: {0}")]
    InvalidConfig(String),
}
