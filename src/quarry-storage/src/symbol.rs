//! Symbol tables for dictionary-encoded columns.

use std::collections::HashMap;
use std::sync::Arc;

/// Dictionary of one symbol column: dense `i32` keys to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    values: Vec<String>,
    keys: HashMap<String, i32>,
}

impl SymbolTable {
    /// Create an empty symbol table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from values; keys are assigned in order.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for value in values {
            table.intern(value);
        }
        table
    }

    /// Key for `value`, adding it if absent.
    pub fn intern(&mut self, value: impl Into<String>) -> i32 {
        let value = value.into();
        if let Some(&key) = self.keys.get(&value) {
            return key;
        }
        let key = i32::try_from(self.values.len()).unwrap_or(i32::MAX);
        self.keys.insert(value.clone(), key);
        self.values.push(value);
        key
    }

    /// Key for `value`, if present.
    pub fn key_of(&self, value: &str) -> Option<i32> {
        self.keys.get(value).copied()
    }

    /// Text for `key`, if present.
    pub fn value_of(&self, key: i32) -> Option<&str> {
        usize::try_from(key)
            .ok()
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Symbol tables of a table, indexed by column.
#[derive(Debug, Clone, Default)]
pub struct SymbolTables {
    tables: Vec<Option<Arc<SymbolTable>>>,
}

impl SymbolTables {
    /// Create from per-column entries (`None` for non-symbol columns).
    pub fn new(tables: Vec<Option<Arc<SymbolTable>>>) -> Self {
        Self { tables }
    }

    /// Symbol table of `column`, if it is a symbol column.
    pub fn get(&self, column: usize) -> Option<&Arc<SymbolTable>> {
        self.tables.get(column).and_then(Option::as_ref)
    }
}

/// Anything that can hand out the symbol tables of its columns: frame
/// cursors, join slave cursors, record sources.
pub trait SymbolTableSource {
    /// Symbol table of `column`, or `None` if the column is not a symbol.
    fn symbol_table(&self, column: usize) -> Option<Arc<SymbolTable>>;
}

impl SymbolTableSource for SymbolTables {
    fn symbol_table(&self, column: usize) -> Option<Arc<SymbolTable>> {
        self.get(column).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_assigns_dense_keys() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern("AAPL"), 0);
        assert_eq!(table.intern("MSFT"), 1);
        assert_eq!(table.intern("AAPL"), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lookup_both_ways() {
        let table = SymbolTable::from_values(["a", "b", "c"]);
        assert_eq!(table.key_of("b"), Some(1));
        assert_eq!(table.key_of("z"), None);
        assert_eq!(table.value_of(2), Some("c"));
        assert_eq!(table.value_of(3), None);
        assert_eq!(table.value_of(-1), None);
    }

    #[test]
    fn test_symbol_tables_by_column() {
        let tables = SymbolTables::new(vec![
            None,
            Some(Arc::new(SymbolTable::from_values(["x"]))),
        ]);
        assert!(tables.symbol_table(0).is_none());
        assert_eq!(tables.symbol_table(1).unwrap().key_of("x"), Some(0));
        assert!(tables.symbol_table(5).is_none());
    }
}
