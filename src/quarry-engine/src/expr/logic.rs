//! Boolean constants and connectives.

use std::fmt;

use common_error::QuarryResult;
use quarry_storage::{Record, SymbolTableSource};

use crate::executor::ExecutionContext;
use crate::expr::Function;

/// `true` or `false` for every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolConstant(pub bool);

impl Function for BoolConstant {
    fn get_bool(&self, _record: &dyn Record) -> bool {
        self.0
    }

    fn is_constant(&self) -> bool {
        true
    }
}

impl fmt::Display for BoolConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short-circuit conjunction.
pub struct And {
    left: Box<dyn Function>,
    right: Box<dyn Function>,
}

impl And {
    pub fn new(left: Box<dyn Function>, right: Box<dyn Function>) -> Self {
        Self { left, right }
    }
}

impl Function for And {
    fn init(&mut self, symbols: &dyn SymbolTableSource, ctx: &ExecutionContext) -> QuarryResult<()> {
        self.left.init(symbols, ctx)?;
        self.right.init(symbols, ctx)
    }

    fn get_bool(&self, record: &dyn Record) -> bool {
        self.left.get_bool(record) && self.right.get_bool(record)
    }

    fn to_top(&mut self) {
        self.left.to_top();
        self.right.to_top();
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }
}

impl fmt::Display for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.left, self.right)
    }
}

/// Short-circuit disjunction.
pub struct Or {
    left: Box<dyn Function>,
    right: Box<dyn Function>,
}

impl Or {
    pub fn new(left: Box<dyn Function>, right: Box<dyn Function>) -> Self {
        Self { left, right }
    }
}

impl Function for Or {
    fn init(&mut self, symbols: &dyn SymbolTableSource, ctx: &ExecutionContext) -> QuarryResult<()> {
        self.left.init(symbols, ctx)?;
        self.right.init(symbols, ctx)
    }

    fn get_bool(&self, record: &dyn Record) -> bool {
        self.left.get_bool(record) || self.right.get_bool(record)
    }

    fn to_top(&mut self) {
        self.left.to_top();
        self.right.to_top();
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }
}

impl fmt::Display for Or {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} or {})", self.left, self.right)
    }
}

/// Negation.
pub struct Not {
    arg: Box<dyn Function>,
}

impl Not {
    pub fn new(arg: Box<dyn Function>) -> Self {
        Self { arg }
    }
}

impl Function for Not {
    fn init(&mut self, symbols: &dyn SymbolTableSource, ctx: &ExecutionContext) -> QuarryResult<()> {
        self.arg.init(symbols, ctx)
    }

    fn get_bool(&self, record: &dyn Record) -> bool {
        !self.arg.get_bool(record)
    }

    fn to_top(&mut self) {
        self.arg.to_top();
    }

    fn is_constant(&self) -> bool {
        self.arg.is_constant()
    }
}

impl fmt::Display for Not {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not {}", self.arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_storage::{FrameRecord, SymbolTables};
    use std::sync::Arc;

    fn empty() -> FrameRecord {
        FrameRecord::new(Arc::new(SymbolTables::default()))
    }

    fn t() -> Box<dyn Function> {
        Box::new(BoolConstant(true))
    }

    fn f() -> Box<dyn Function> {
        Box::new(BoolConstant(false))
    }

    #[test]
    fn test_connectives() {
        let r = empty();
        assert!(And::new(t(), t()).get_bool(&r));
        assert!(!And::new(t(), f()).get_bool(&r));
        assert!(Or::new(f(), t()).get_bool(&r));
        assert!(!Or::new(f(), f()).get_bool(&r));
        assert!(Not::new(f()).get_bool(&r));
        assert!(Not::new(Box::new(And::new(t(), f()))).get_bool(&r));
    }

    #[test]
    fn test_constant_folding_flags() {
        assert!(And::new(t(), f()).is_constant());
        assert!(Not::new(t()).is_constant());
    }

    #[test]
    fn test_display() {
        let expr = And::new(t(), Box::new(Or::new(f(), Box::new(Not::new(t())))));
        assert_eq!(expr.to_string(), "true and (false or not true)");
    }
}
