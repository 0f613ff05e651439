//! Defines cost model.
//!
//! Costs only rank candidates which are all valid, they never decide whether a plan is
//! correct. A [`Cost`] keeps network, disk and cpu apart, and candidates are compared by the
//! weighted sum of the three.

mod estimator;
pub use estimator::*;

use std::fmt::{Display, Formatter};

use derive_more::{Add, AddAssign};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Add, AddAssign, Serialize)]
pub struct Cost {
    /// Bytes sent over the network.
    network: f64,
    /// Bytes written to and read from disk.
    disk: f64,
    cpu: f64,
}

impl Cost {
    pub fn new(network: f64, disk: f64, cpu: f64) -> Self {
        Self { network, disk, cpu }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn network(&self) -> f64 {
        self.network
    }

    pub fn disk(&self) -> f64 {
        self.disk
    }

    pub fn cpu(&self) -> f64 {
        self.cpu
    }

    pub fn weighted(&self, weights: &CostWeights) -> f64 {
        self.network * weights.network + self.disk * weights.disk + self.cpu * weights.cpu
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "network: {:.1}, disk: {:.1}, cpu: {:.1}",
            self.network, self.disk, self.cpu
        )
    }
}

/// Relative weight of each cost component.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub network: f64,
    pub disk: f64,
    pub cpu: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            network: 10.0,
            disk: 1.0,
            cpu: 1.0,
        }
    }
}

impl CostWeights {
    pub fn is_valid(&self) -> bool {
        [self.network, self.disk, self.cpu]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::cost::{Cost, CostWeights};

    #[test]
    fn test_cost_arithmetic() {
        let mut cost = Cost::new(1.0, 2.0, 3.0) + Cost::new(1.0, 0.0, 1.0);
        assert_eq!(Cost::new(2.0, 2.0, 4.0), cost);

        cost += Cost::zero();
        assert_eq!(Cost::new(2.0, 2.0, 4.0), cost);

        assert_eq!(26.0, cost.weighted(&CostWeights::default()));
    }

    #[test]
    fn test_weights_validation() {
        assert!(CostWeights::default().is_valid());
        assert!(!CostWeights {
            network: -1.0,
            ..CostWeights::default()
        }
        .is_valid());
    }
}
