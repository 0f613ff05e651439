//! ## Background
//!
//! A data flow program is a dag of second order functions (map, reduce, join, cross) between
//! data sources and data sinks. Each function can be executed in several ways, e.g. a join by
//! hash partitioning both inputs on the keys, or by replicating the smaller input to every
//! partition of the other. The optimizer picks one way per node, together with how records
//! are shipped between nodes, such that the estimated cost of the whole program is minimal.
//!
//! The search is bottom-up, in the style of [1]: nodes are visited in topological order, and
//! for every node all candidates built on top of the surviving input candidates are kept,
//! unless another candidate delivers at least as useful properties for less cost. Candidates
//! with interesting properties survive even when they are not the cheapest, since a consumer
//! further down may need them.
//!
//! ## Design
//!
//! * [`plan`] Logical programs, their graph and the optimized physical plan.
//! * [`operator`] Logical operators and the user hints attached to them.
//! * [`properties`] Global (partitioning) and local (ordering, grouping) data properties.
//! * [`descriptor`] Physical strategies of operators and the properties they need.
//! * [`candidate`] Physical alternatives, the channels between them, and pruning.
//! * [`cost`] Cost vectors and their estimation.
//! * [`optimizer`] Enumeration and sink selection.
//!
//! ## Reference
//!
//! 1. Selinger, P. Griffiths, et al. "Access path selection in a relational database management
//! system." Readings in Artificial Intelligence and Databases. Morgan Kaufmann, 1989. 511-522.
//! 2. Battré, D., Ewen, S., Hueske, F., Kao, O., Markl, V. and Warneke, D., 2010. Nephele/PACTs:
//! a programming model and execution framework for web-scale analytical processing. In
//! Proceedings of the 1st ACM symposium on Cloud computing (pp. 119-130).

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod candidate;
pub mod config;
pub mod cost;
pub mod descriptor;
pub mod error;
pub mod fields;
pub mod hints;
pub mod operator;
pub mod optimizer;
pub mod plan;
pub mod properties;
pub mod stat;

#[cfg(test)]
mod test_utils;
