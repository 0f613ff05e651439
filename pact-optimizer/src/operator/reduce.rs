use std::fmt::Formatter;

use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldSet;
use crate::operator::OperatorTrait;

/// Group at a time function on a set of key fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Reduce {
    keys: FieldSet,
    combinable: bool,
    preserved: Option<FieldSet>,
}

impl Reduce {
    pub fn new<F: Into<FieldSet>>(keys: F) -> Self {
        Self {
            keys: keys.into(),
            combinable: false,
            preserved: None,
        }
    }

    /// Marks the function as able to pre-aggregate groups before shipping.
    pub fn combinable(mut self) -> Self {
        self.combinable = true;
        self
    }

    pub fn with_preserved_fields<F: Into<FieldSet>>(mut self, fields: F) -> Self {
        self.preserved = Some(fields.into());
        self
    }

    pub fn keys(&self) -> &FieldSet {
        &self.keys
    }

    pub fn is_combinable(&self) -> bool {
        self.combinable
    }
}

impl OperatorTrait for Reduce {
    fn arity(&self) -> usize {
        1
    }

    fn descriptors(&self) -> Vec<OperatorDescriptor> {
        vec![OperatorDescriptor::SortedReduce {
            keys: self.keys.clone(),
            combinable: self.combinable,
        }]
    }

    fn preserved_fields(&self, _input: usize) -> Option<&FieldSet> {
        self.preserved.as_ref()
    }

    fn display_fields(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("keys", &self.keys)
            .field("combinable", &self.combinable)
            .finish()
    }
}
