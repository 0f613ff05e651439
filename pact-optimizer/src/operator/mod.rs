//! Logical operators of a data flow program.
//!
//! Each operator knows how many inputs it consumes, which fields it forwards unchanged from
//! each input, and which physical strategies ([`OperatorDescriptor`]s) can execute it.
mod source;
pub use source::*;
mod sink;
pub use sink::*;
mod map;
pub use map::*;
mod reduce;
pub use reduce::*;
mod join;
pub use join::*;
mod cross;
pub use cross::*;

use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

use crate::descriptor::OperatorDescriptor;
use crate::fields::FieldSet;

#[enum_dispatch(Operator)]
pub trait OperatorTrait {
    /// Number of inputs.
    fn arity(&self) -> usize;

    /// Physical strategies able to execute this operator, in declaration order.
    fn descriptors(&self) -> Vec<OperatorDescriptor>;

    /// Fields of input `input` copied unchanged into the output.
    ///
    /// `None` means the operator declared nothing, and no input property survives.
    fn preserved_fields(&self, input: usize) -> Option<&FieldSet>;

    fn display_fields(&self, f: &mut Formatter<'_>) -> std::fmt::Result;
}

#[derive(Clone, Debug, PartialEq, EnumAsInner, AsRefStr)]
#[enum_dispatch]
pub enum Operator {
    Source(DataSource),
    Sink(DataSink),
    Map(Map),
    Reduce(Reduce),
    Join(Join),
    Cross(Cross),
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())?;
        self.display_fields(f)
    }
}
