//! Compiled row predicates.
//!
//! The planner hands cursors boxed [`Function`]s. A function is initialised
//! once per binding with the symbol tables of the frames it will see, then
//! evaluated per row.

mod compare;
mod logic;
mod symbol;

use std::fmt;

use common_error::QuarryResult;
use quarry_storage::{Record, SymbolTableSource};

use crate::executor::ExecutionContext;

pub use compare::{ColumnCompare, CompareOp, Operand};
pub use logic::{And, BoolConstant, Not, Or};
pub use symbol::SymbolEquals;

/// A boolean function over the current row.
///
/// `Display` renders the expression as it appears in plans.
pub trait Function: fmt::Display + Send {
    /// Resolve anything that depends on the bound frames, e.g. symbol keys.
    fn init(&mut self, _symbols: &dyn SymbolTableSource, _ctx: &ExecutionContext) -> QuarryResult<()> {
        Ok(())
    }

    /// Evaluate against `record`. Comparisons involving null are false.
    fn get_bool(&self, record: &dyn Record) -> bool;

    /// Re-arm per-iteration state.
    fn to_top(&mut self) {}

    /// Whether the result does not depend on the row.
    fn is_constant(&self) -> bool {
        false
    }
}
