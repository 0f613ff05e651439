use std::fmt::Formatter;

use crate::descriptor::OperatorDescriptor;
use crate::error::OptResult;
use crate::fields::FieldSet;
use crate::hints::Estimate;
use crate::operator::OperatorTrait;
use crate::properties::{GlobalProperties, LocalProperties};

/// Reads records from outside the data flow.
///
/// A source may declare how its output is already partitioned or sorted, e.g. a file that
/// was written by an earlier job, so downstream operators can avoid a reshuffle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSource {
    global_props: GlobalProperties,
    local_props: LocalProperties,
    estimated_records: Estimate,
    estimated_bytes: Estimate,
}

impl DataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global_properties(mut self, global_props: GlobalProperties) -> Self {
        self.global_props = global_props;
        self
    }

    pub fn with_local_properties(mut self, local_props: LocalProperties) -> Self {
        self.local_props = local_props;
        self
    }

    pub fn with_statistics(mut self, records: f64, bytes: f64) -> OptResult<Self> {
        self.estimated_records = Estimate::checked("estimated_records", records)?;
        self.estimated_bytes = Estimate::checked("estimated_bytes", bytes)?;
        Ok(self)
    }

    pub fn global_properties(&self) -> &GlobalProperties {
        &self.global_props
    }

    pub fn local_properties(&self) -> &LocalProperties {
        &self.local_props
    }

    pub fn estimated_records(&self) -> Estimate {
        self.estimated_records
    }

    pub fn estimated_bytes(&self) -> Estimate {
        self.estimated_bytes
    }
}

impl OperatorTrait for DataSource {
    fn arity(&self) -> usize {
        0
    }

    fn descriptors(&self) -> Vec<OperatorDescriptor> {
        vec![OperatorDescriptor::SourceScan]
    }

    fn preserved_fields(&self, _input: usize) -> Option<&FieldSet> {
        None
    }

    fn display_fields(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("records", &self.estimated_records)
            .field("bytes", &self.estimated_bytes)
            .finish()
    }
}
