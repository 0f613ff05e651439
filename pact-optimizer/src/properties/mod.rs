//! Physical properties of intermediate data sets.
//!
//! Currently we have two kinds of properties: [`GlobalProperties`] describe how records are
//! distributed across parallel partitions, and [`LocalProperties`] describe ordering and
//! grouping inside each partition. Both come in a delivered form, attached to plan candidates,
//! and a requested form ([`RequestedGlobalProperties`], [`RequestedLocalProperties`]), which
//! operator strategies impose on their inputs.
//!
//! The delivered properties form a lattice ordered by [`GlobalProperties::is_at_least_as_strong_as`]:
//! full replication is the top element and random partitioning the bottom one.

use std::collections::BTreeSet;
use std::fmt::Debug;

mod distribution;
pub use distribution::*;
mod order;
pub use order::*;
mod local;
pub use local::*;
mod requested;
pub use requested::*;

use crate::fields::FieldSet;

pub trait RequestedProperty: Debug {
    type Delivered;

    /// A trivial request constrains nothing and is met by any delivered property.
    fn is_trivial(&self) -> bool;

    /// Tests whether delivered properties satisfy self.
    fn is_met_by(&self, delivered: &Self::Delivered) -> bool;
}

/// Tests whether `delivered` satisfies `requested`.
pub fn satisfies<R: RequestedProperty>(requested: &R, delivered: &R::Delivered) -> bool {
    requested.is_met_by(delivered)
}

/// Every unique combination of `other` is implied by a combination of `this`.
///
/// A field set that is unique makes every superset of it unique as well.
pub(crate) fn unique_sets_cover(this: &BTreeSet<FieldSet>, other: &BTreeSet<FieldSet>) -> bool {
    other
        .iter()
        .all(|o| this.iter().any(|t| t.is_subset_of(o)))
}
