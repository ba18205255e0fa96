//! Materialized query results.

use quarry_storage::{RowId, Value};

/// One row of a drained cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    row_id: RowId,
    values: Vec<Value>,
}

impl ResultRow {
    pub fn new(row_id: RowId, values: Vec<Value>) -> Self {
        Self { row_id, values }
    }

    /// Storage address the row was read from.
    pub fn row_id(&self) -> RowId {
        self.row_id
    }

    /// Projected values in projection order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Rows of a fully drained cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    rows: Vec<ResultRow>,
}

impl QueryResult {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column across all rows.
    pub fn column(&self, index: usize) -> Vec<Value> {
        self.rows
            .iter()
            .map(|r| r.values.get(index).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}
