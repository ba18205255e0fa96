//! Symbol equality.

use std::fmt;

use common_error::QuarryResult;
use quarry_storage::{Record, SymbolTableSource};

use crate::executor::ExecutionContext;
use crate::expr::Function;

/// `column = 'text'` on a symbol column.
///
/// The text is resolved to a key at `init`, so rows are compared by key.
/// If the text is not in the column's symbol table no row matches.
#[derive(Debug, Clone)]
pub struct SymbolEquals {
    name: String,
    column: usize,
    value: String,
    key: Option<i32>,
}

impl SymbolEquals {
    pub fn new(name: impl Into<String>, column: usize, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column,
            value: value.into(),
            key: None,
        }
    }

    /// Key resolved by the last `init`.
    pub fn key(&self) -> Option<i32> {
        self.key
    }
}

impl Function for SymbolEquals {
    fn init(&mut self, symbols: &dyn SymbolTableSource, _ctx: &ExecutionContext) -> QuarryResult<()> {
        self.key = symbols
            .symbol_table(self.column)
            .and_then(|table| table.key_of(&self.value));
        Ok(())
    }

    fn get_bool(&self, record: &dyn Record) -> bool {
        self.key
            .is_some_and(|key| record.get_int(self.column) == Some(key))
    }
}

impl fmt::Display for SymbolEquals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = '{}'", self.name, self.value)
    }
}
