//! In-memory table and its builder.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int32Builder, Int64Builder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use common_error::{QuarryError, QuarryResult};

use crate::frame::ScanDirection;
use crate::symbol::{SymbolTable, SymbolTables};
use crate::types::{ColumnType, Value};

use super::cursor::MemoryPageFrameCursor;

const DEFAULT_MAX_FRAME_ROWS: usize = 1_000_000;

/// Partitioned table whose partitions are Arrow record batches.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: SchemaRef,
    column_types: Vec<ColumnType>,
    partitions: Arc<Vec<RecordBatch>>,
    symbols: Arc<SymbolTables>,
    max_frame_rows: usize,
    fail_on_frame: Option<usize>,
}

impl MemoryTable {
    /// Start building a table column by column.
    pub fn builder() -> MemoryTableBuilder {
        MemoryTableBuilder::new()
    }

    /// Table schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Logical type of each column.
    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    /// Index of the column named `name`.
    pub fn column_index(&self, name: &str) -> QuarryResult<usize> {
        self.schema
            .index_of(name)
            .map_err(|_| QuarryError::column_not_found(name))
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Total rows across partitions.
    pub fn row_count(&self) -> u64 {
        self.partitions.iter().map(|p| p.num_rows() as u64).sum()
    }

    /// Symbol tables of all columns.
    pub fn symbol_tables(&self) -> Arc<SymbolTables> {
        Arc::clone(&self.symbols)
    }

    /// Split partitions into frames of at most `rows` rows.
    #[must_use]
    pub fn with_max_frame_rows(mut self, rows: usize) -> Self {
        self.max_frame_rows = rows.max(1);
        self
    }

    /// Make every cursor fail when asked for its `n`-th frame (0-based).
    #[must_use]
    pub fn fail_on_frame(mut self, n: usize) -> Self {
        self.fail_on_frame = Some(n);
        self
    }

    /// Open a frame cursor.
    pub fn cursor(&self, direction: ScanDirection) -> MemoryPageFrameCursor {
        self.cursor_capped(direction, self.max_frame_rows)
    }

    /// Open a frame cursor whose frames hold at most `max_rows` rows, on top
    /// of the table's own frame limit.
    pub fn cursor_capped(
        &self,
        direction: ScanDirection,
        max_rows: usize,
    ) -> MemoryPageFrameCursor {
        MemoryPageFrameCursor::new(
            Arc::clone(&self.partitions),
            Arc::clone(&self.symbols),
            direction,
            self.max_frame_rows.min(max_rows).max(1),
            self.fail_on_frame,
        )
    }
}

/// Builder for [`MemoryTable`].
#[derive(Debug, Default)]
pub struct MemoryTableBuilder {
    names: Vec<String>,
    types: Vec<ColumnType>,
    symbols: Vec<Option<SymbolTable>>,
    partitions: Vec<RecordBatch>,
    max_frame_rows: Option<usize>,
}

impl MemoryTableBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. Columns must be declared before any partition.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.names.push(name.into());
        self.types.push(column_type);
        self.symbols.push(match column_type {
            ColumnType::Symbol => Some(SymbolTable::new()),
            _ => None,
        });
        self
    }

    /// Upper bound on rows per frame.
    #[must_use]
    pub fn max_frame_rows(mut self, rows: usize) -> Self {
        self.max_frame_rows = Some(rows);
        self
    }

    fn schema(&self) -> SchemaRef {
        let fields = self
            .names
            .iter()
            .zip(&self.types)
            .map(|(name, ty)| Field::new(name, ty.arrow_type(), true))
            .collect::<Vec<_>>();
        Arc::new(Schema::new(fields))
    }

    /// Append a partition given row-major values. Partitions are appended
    /// oldest first.
    pub fn partition(mut self, rows: Vec<Vec<Value>>) -> QuarryResult<Self> {
        let width = self.types.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(QuarryError::storage(format!(
                "row {bad} has {} values, table has {width} columns",
                rows[bad].len()
            )));
        }

        let mut columns = Vec::with_capacity(width);
        for col in 0..width {
            let column_type = self.types[col];
            let values = rows.iter().map(|r| &r[col]);
            let array = match column_type {
                ColumnType::Symbol => {
                    let table = self.symbols[col].get_or_insert_with(SymbolTable::new);
                    build_symbol(values, table, &self.names[col])?
                }
                _ => build_column(values, column_type, &self.names[col])?,
            };
            columns.push(array);
        }

        let batch = RecordBatch::try_new(self.schema(), columns)?;
        self.partitions.push(batch);
        Ok(self)
    }

    /// Finish the table.
    pub fn build(self) -> QuarryResult<MemoryTable> {
        if self.names.is_empty() {
            return Err(QuarryError::storage("table has no columns"));
        }
        let schema = self.schema();
        let symbols = self
            .symbols
            .into_iter()
            .map(|s| s.map(Arc::new))
            .collect::<Vec<_>>();

        Ok(MemoryTable {
            schema,
            column_types: self.types,
            partitions: Arc::new(self.partitions),
            symbols: Arc::new(SymbolTables::new(symbols)),
            max_frame_rows: self.max_frame_rows.unwrap_or(DEFAULT_MAX_FRAME_ROWS).max(1),
            fail_on_frame: None,
        })
    }
}

fn mismatch(column: &str, expected: ColumnType, value: &Value) -> QuarryError {
    QuarryError::type_error(format!(
        "column {column} expects {expected}, got {value}"
    ))
}

fn build_symbol<'a>(
    values: impl Iterator<Item = &'a Value>,
    table: &mut SymbolTable,
    column: &str,
) -> QuarryResult<ArrayRef> {
    let mut builder = Int32Builder::new();
    for value in values {
        match value {
            Value::Null => builder.append_null(),
            Value::Symbol(s) => builder.append_value(table.intern(s.as_str())),
            other => return Err(mismatch(column, ColumnType::Symbol, other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_column<'a>(
    values: impl Iterator<Item = &'a Value>,
    column_type: ColumnType,
    column: &str,
) -> QuarryResult<ArrayRef> {
    macro_rules! build {
        ($builder:ty, $($pat:pat => $val:expr),+) => {{
            let mut builder = <$builder>::new();
            for value in values {
                match value {
                    Value::Null => builder.append_null(),
                    $($pat => builder.append_value($val),)+
                    other => return Err(mismatch(column, column_type, other)),
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }};
    }

    let array = match column_type {
        ColumnType::Bool => build!(BooleanBuilder, Value::Bool(v) => *v),
        ColumnType::Int => build!(Int32Builder, Value::Int(v) => *v),
        ColumnType::Long => build!(Int64Builder, Value::Long(v) => *v, Value::Int(v) => i64::from(*v)),
        ColumnType::Double => build!(Float64Builder, Value::Double(v) => *v),
        ColumnType::Timestamp => build!(
            TimestampMicrosecondBuilder,
            Value::Timestamp(v) => *v,
            Value::Long(v) => *v
        ),
        ColumnType::Symbol => {
            return Err(QuarryError::internal("symbol columns are built separately"));
        }
    };
    Ok(array)
}
