use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;
use serde::Serialize;

use crate::fields::{FieldId, FieldList, FieldSet};

/// Sort direction of one field.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize)]
pub enum Order {
    Ascending,
    Descending,
}

/// Ordering of one field.
#[derive(Copy, Clone, Hash, Debug, Eq, PartialEq, Serialize)]
pub struct FieldOrder {
    pub field: FieldId,
    pub order: Order,
}

/// Lexicographic ordering on a list of fields, each with its own direction.
#[derive(Clone, Default, Hash, Eq, PartialEq, Serialize)]
pub struct Ordering {
    orders: Vec<FieldOrder>,
}

impl Ordering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ascending ordering on `fields`, in list order.
    pub fn ascending(fields: &FieldList) -> Self {
        Self {
            orders: fields
                .iter()
                .map(|field| FieldOrder {
                    field,
                    order: Order::Ascending,
                })
                .collect(),
        }
    }

    pub fn append(mut self, field: FieldId, order: Order) -> Self {
        self.orders.push(FieldOrder { field, order });
        self
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[FieldOrder] {
        &self.orders
    }

    pub fn fields(&self) -> FieldList {
        self.orders.iter().map(|o| o.field).collect()
    }

    pub fn field_set(&self) -> FieldSet {
        self.orders.iter().map(|o| o.field).collect()
    }

    /// Tests whether `self` equals `other` truncated to the length of `self`.
    pub fn is_prefix_of(&self, other: &Ordering) -> bool {
        self.len() <= other.len() && self.orders.iter().zip(&other.orders).all(|(a, b)| a == b)
    }

    /// The set of the first `len` fields, `None` if the ordering is shorter.
    pub fn prefix_field_set(&self, len: usize) -> Option<FieldSet> {
        if len > self.len() {
            return None;
        }
        Some(self.orders[..len].iter().map(|o| o.field).collect())
    }

    /// Longest prefix consisting of retained fields only.
    pub fn retained_prefix(&self, retained: &FieldSet) -> Option<Ordering> {
        let orders = self
            .orders
            .iter()
            .take_while(|o| retained.contains(o.field))
            .copied()
            .collect::<Vec<_>>();
        if orders.is_empty() {
            None
        } else {
            Some(Ordering { orders })
        }
    }
}

impl Debug for Ordering {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let orders = self.orders.iter().format_with(", ", |o, f| match o.order {
            Order::Ascending => f(&format_args!("{}:asc", o.field)),
            Order::Descending => f(&format_args!("{}:desc", o.field)),
        });
        write!(f, "[{}]", orders)
    }
}

impl Display for Ordering {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}
