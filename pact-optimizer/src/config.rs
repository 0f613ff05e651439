use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateId;
use crate::cost::CostWeights;
use crate::error::{CompilerError, OptResult};

/// Settings of the optimizer.
///
/// ```yaml
/// default_parallelism: 4
/// cost_weights:
///   network: 10.0
///   disk: 1.0
///   cpu: 1.0
/// heuristic_record_count: 1000000.0
/// heuristic_record_width: 100.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Parallelism of nodes declaring none, when the plan has no default either.
    pub default_parallelism: u32,
    pub cost_weights: CostWeights,
    /// Record count assumed when no estimate is known.
    pub heuristic_record_count: f64,
    /// Record width in bytes assumed when no estimate is known.
    pub heuristic_record_width: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_parallelism: 1,
            cost_weights: CostWeights::default(),
            heuristic_record_count: 1_000_000.0,
            heuristic_record_width: 100.0,
        }
    }
}

impl OptimizerConfig {
    pub fn from_yaml_str(yaml: &str) -> OptResult<Self> {
        let config: OptimizerConfig = serde_yaml::from_str(yaml)
            .map_err(|e| CompilerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OptResult<()> {
        if self.default_parallelism == 0 {
            bail!(CompilerError::InvalidConfig(
                "default_parallelism must be positive".to_string()
            ));
        }
        if !self.cost_weights.is_valid() {
            bail!(CompilerError::InvalidConfig(format!(
                "invalid cost weights {:?}",
                self.cost_weights
            )));
        }
        for (name, value) in [
            ("heuristic_record_count", self.heuristic_record_count),
            ("heuristic_record_width", self.heuristic_record_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!(CompilerError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Context for optimization. Includes configuration and id generation.
#[derive(Clone, Debug, Default)]
pub struct OptimizerContext {
    config: OptimizerConfig,
    next_candidate_id: CandidateId,
}

impl OptimizerContext {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            next_candidate_id: 0,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn next_candidate_id(&mut self) -> CandidateId {
        let id = self.next_candidate_id;
        self.next_candidate_id += 1;
        id
    }
}
