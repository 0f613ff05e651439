//! Output size estimation.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::operator::Operator;
use crate::plan::PlanNode;
use crate::hints::Estimate;

/// Estimated size of the data set produced by an operator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Statistics {
    records: Estimate,
    bytes: Estimate,
}

impl Statistics {
    pub fn new(records: Estimate, bytes: Estimate) -> Self {
        Self { records, bytes }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Estimate {
        self.records
    }

    pub fn bytes(&self) -> Estimate {
        self.bytes
    }

    /// Average record width, unknown for an empty data set.
    pub fn avg_width(&self) -> Estimate {
        match (self.records, self.bytes) {
            (Estimate::Known(records), Estimate::Known(bytes)) if records > 0.0 => {
                Estimate::Known(bytes / records)
            }
            _ => Estimate::Unknown,
        }
    }

    /// Estimates the output of `node` from the statistics of its inputs.
    pub fn estimate(node: &PlanNode, inputs: &[Statistics]) -> Statistics {
        let hints = node.hints();
        let input_records = |idx: usize| {
            inputs
                .get(idx)
                .map(|s| s.records)
                .unwrap_or(Estimate::Unknown)
        };

        let calls = match node.operator() {
            Operator::Source(source) => {
                return Statistics::new(source.estimated_records(), source.estimated_bytes());
            }
            Operator::Sink(_) => return inputs.first().copied().unwrap_or_default(),
            Operator::Map(_) => input_records(0),
            Operator::Reduce(reduce) => {
                let per_key = hints.avg_records_per_distinct_fields(reduce.keys());
                let from_groups = match (input_records(0), per_key) {
                    (Estimate::Known(records), Estimate::Known(avg)) if avg > 0.0 => {
                        Estimate::Known(records / avg)
                    }
                    _ => Estimate::Unknown,
                };
                hints.distinct_count(reduce.keys()).or_else(from_groups)
            }
            Operator::Join(_) => input_records(0).zip_with(input_records(1), f64::max),
            Operator::Cross(_) => input_records(0).zip_with(input_records(1), |a, b| a * b),
        };

        let records = calls.zip_with(hints.avg_records_emitted_per_call(), |c, e| c * e);

        let inherited_width = match inputs {
            [single] => single.avg_width(),
            [first, second] => first.avg_width().zip_with(second.avg_width(), |a, b| a + b),
            _ => Estimate::Unknown,
        };
        let width = hints.avg_bytes_per_record().or_else(inherited_width);

        Statistics::new(records, records.zip_with(width, |r, w| r * w))
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "records: {}, bytes: {}", self.records, self.bytes)
    }
}
