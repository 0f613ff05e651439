use std::fmt::Formatter;

use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldSet;
use crate::operator::OperatorTrait;

/// Consumes the records of its single input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSink {}

impl DataSink {
    pub fn new() -> Self {
        Self {}
    }
}

impl OperatorTrait for DataSink {
    fn arity(&self) -> usize {
        1
    }

    fn descriptors(&self) -> Vec<OperatorDescriptor> {
        vec![OperatorDescriptor::SinkForward]
    }

    fn preserved_fields(&self, _input: usize) -> Option<&FieldSet> {
        None
    }

    fn display_fields(&self, _f: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}
