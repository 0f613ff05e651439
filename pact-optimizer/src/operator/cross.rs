use std::fmt::Formatter;

use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldSet;
use crate::operator::OperatorTrait;

/// Cartesian product of two inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cross {
    preserved: [Option<FieldSet>; 2],
}

impl Cross {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preserved_fields<F: Into<FieldSet>>(mut self, input: usize, fields: F) -> Self {
        if let Some(slot) = self.preserved.get_mut(input) {
            *slot = Some(fields.into());
        }
        self
    }
}

impl OperatorTrait for Cross {
    fn arity(&self) -> usize {
        2
    }

    fn descriptors(&self) -> Vec<OperatorDescriptor> {
        vec![OperatorDescriptor::CartesianProduct]
    }

    fn preserved_fields(&self, input: usize) -> Option<&FieldSet> {
        self.preserved.get(input).and_then(|p| p.as_ref())
    }

    fn display_fields(&self, _f: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}
