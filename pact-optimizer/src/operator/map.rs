use std::fmt::Formatter;

use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldSet;
use crate::operator::OperatorTrait;

/// Record at a time function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    preserved: Option<FieldSet>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares fields the function copies unchanged from input to output.
    pub fn with_preserved_fields<F: Into<FieldSet>>(mut self, fields: F) -> Self {
        self.preserved = Some(fields.into());
        self
    }
}

impl OperatorTrait for Map {
    fn arity(&self) -> usize {
        1
    }

    fn descriptors(&self) -> Vec<OperatorDescriptor> {
        vec![OperatorDescriptor::MapForward]
    }

    fn preserved_fields(&self, _input: usize) -> Option<&FieldSet> {
        self.preserved.as_ref()
    }

    fn display_fields(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.preserved {
            Some(fields) => write!(f, " {{ preserved: {} }}", fields),
            None => Ok(()),
        }
    }
}
