use crate::candidate::{LocalStrategy, ShipStrategy};
use crate::config::OptimizerConfig;
use crate::cost::{Cost, CostWeights};
use crate::descriptor::OperatorDescriptor;
use crate::stat::Statistics;

/// Estimates the cost of channels and drivers from output statistics.
///
/// Unknown statistics are replaced by the heuristic defaults of the config, so that a plan
/// without hints is never considered free.
#[derive(Clone, Debug, PartialEq)]
pub struct CostEstimator {
    weights: CostWeights,
    heuristic_records: f64,
    heuristic_width: f64,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

impl CostEstimator {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            weights: config.cost_weights,
            heuristic_records: config.heuristic_record_count,
            heuristic_width: config.heuristic_record_width,
        }
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    fn records(&self, stat: &Statistics) -> f64 {
        stat.records().or(self.heuristic_records)
    }

    fn bytes(&self, stat: &Statistics) -> f64 {
        stat.bytes()
            .value()
            .unwrap_or_else(|| self.records(stat) * stat.avg_width().or(self.heuristic_width))
    }

    /// Cost of moving the records described by `stat` to `target_parallelism` partitions.
    pub fn ship_cost(&self, ship: &ShipStrategy, stat: &Statistics, target_parallelism: u32) -> Cost {
        match ship {
            ShipStrategy::Forward => Cost::zero(),
            ShipStrategy::PartitionHash(_) | ShipStrategy::PartitionRandom => {
                Cost::new(self.bytes(stat), 0.0, 0.0)
            }
            // Range boundaries are found by sampling the input first.
            ShipStrategy::PartitionRange { .. } => {
                Cost::new(self.bytes(stat), 0.0, self.records(stat))
            }
            ShipStrategy::Broadcast => {
                Cost::new(self.bytes(stat) * f64::from(target_parallelism), 0.0, 0.0)
            }
        }
    }

    pub fn local_cost(&self, local: &LocalStrategy, stat: &Statistics) -> Cost {
        match local {
            LocalStrategy::None => Cost::zero(),
            LocalStrategy::Sort(_) | LocalStrategy::CombiningSort(_) => {
                let n = self.records(stat);
                let cpu = if n > 1.0 { n * n.log2() } else { 0.0 };
                Cost::new(0.0, self.bytes(stat), cpu)
            }
        }
    }

    /// Cost of running the driver itself, `inputs` being the statistics of each input.
    ///
    /// A source is charged for reading its own output.
    pub fn driver_cost(&self, descriptor: &OperatorDescriptor, inputs: &[Statistics]) -> Cost {
        let records: Vec<f64> = inputs.iter().map(|s| self.records(s)).collect();
        let total_records: f64 = records.iter().sum();
        let build_bytes = |idx: usize| inputs.get(idx).map(|s| self.bytes(s)).unwrap_or(0.0);

        match descriptor {
            OperatorDescriptor::SourceScan
            | OperatorDescriptor::SinkForward
            | OperatorDescriptor::MapForward
            | OperatorDescriptor::SortedReduce { .. } => Cost::new(0.0, 0.0, total_records),
            OperatorDescriptor::RepartitionHashJoin { .. }
            | OperatorDescriptor::BroadcastHashJoinFirst { .. } => {
                Cost::new(0.0, build_bytes(0), total_records)
            }
            OperatorDescriptor::BroadcastHashJoinSecond { .. } => {
                Cost::new(0.0, build_bytes(1), total_records)
            }
            OperatorDescriptor::SortMergeJoin { .. } => Cost::new(0.0, 0.0, total_records),
            OperatorDescriptor::CartesianProduct => {
                Cost::new(0.0, 0.0, records.iter().product())
            }
        }
    }
}
