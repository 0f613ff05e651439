use std::fmt::Formatter;

use anyhow::bail;

use crate::descriptor::OperatorDescriptor;
use crate::error::{CompilerError, OptResult};
use crate::fields::{FieldList, FieldSet};
use crate::operator::OperatorTrait;

/// Equi-join of two inputs.
///
/// The i-th field of `left_keys` is compared with the i-th field of `right_keys`.
#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    left_keys: FieldList,
    right_keys: FieldList,
    preserved: [Option<FieldSet>; 2],
}

impl Join {
    pub fn new<L: Into<FieldList>, R: Into<FieldList>>(
        left_keys: L,
        right_keys: R,
    ) -> OptResult<Self> {
        let (left_keys, right_keys) = (left_keys.into(), right_keys.into());
        if left_keys.is_empty() || left_keys.len() != right_keys.len() {
            bail!(CompilerError::InvalidOperator(format!(
                "join keys {} and {} must be non empty and of equal length",
                left_keys, right_keys
            )));
        }

        Ok(Self {
            left_keys,
            right_keys,
            preserved: [None, None],
        })
    }

    /// Declares fields of input `input` copied unchanged into the output.
    pub fn with_preserved_fields<F: Into<FieldSet>>(mut self, input: usize, fields: F) -> Self {
        if let Some(slot) = self.preserved.get_mut(input) {
            *slot = Some(fields.into());
        }
        self
    }

    pub fn left_keys(&self) -> &FieldList {
        &self.left_keys
    }

    pub fn right_keys(&self) -> &FieldList {
        &self.right_keys
    }
}

impl OperatorTrait for Join {
    fn arity(&self) -> usize {
        2
    }

    fn descriptors(&self) -> Vec<OperatorDescriptor> {
        let (left, right) = (self.left_keys.clone(), self.right_keys.clone());
        vec![
            OperatorDescriptor::RepartitionHashJoin {
                left: left.clone(),
                right: right.clone(),
            },
            OperatorDescriptor::SortMergeJoin {
                left: left.clone(),
                right: right.clone(),
            },
            OperatorDescriptor::BroadcastHashJoinFirst {
                left: left.clone(),
                right: right.clone(),
            },
            OperatorDescriptor::BroadcastHashJoinSecond { left, right },
        ]
    }

    fn preserved_fields(&self, input: usize) -> Option<&FieldSet> {
        self.preserved.get(input).and_then(|p| p.as_ref())
    }

    fn display_fields(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("left_keys", &self.left_keys)
            .field("right_keys", &self.right_keys)
            .finish()
    }
}
