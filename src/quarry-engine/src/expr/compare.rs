//! Column versus constant comparisons.

use std::cmp::Ordering;
use std::fmt;

use quarry_storage::Record;

use crate::expr::Function;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Apply to the ordering of `column` relative to the constant.
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        })
    }
}

/// Typed constant; also selects the column getter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Int(i32),
    Long(i64),
    Double(f64),
    Timestamp(i64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) | Self::Timestamp(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

/// `column <op> constant`.
#[derive(Debug, Clone)]
pub struct ColumnCompare {
    name: String,
    column: usize,
    op: CompareOp,
    operand: Operand,
}

impl ColumnCompare {
    /// Compare `column` against `operand`.
    pub fn new(name: impl Into<String>, column: usize, op: CompareOp, operand: Operand) -> Self {
        Self {
            name: name.into(),
            column,
            op,
            operand,
        }
    }

    /// Compare a `LONG` column.
    pub fn long(name: impl Into<String>, column: usize, op: CompareOp, value: i64) -> Self {
        Self::new(name, column, op, Operand::Long(value))
    }

    /// Compare a `DOUBLE` column.
    pub fn double(name: impl Into<String>, column: usize, op: CompareOp, value: f64) -> Self {
        Self::new(name, column, op, Operand::Double(value))
    }

    fn ordering(&self, record: &dyn Record) -> Option<Ordering> {
        match self.operand {
            Operand::Int(v) => record.get_int(self.column).map(|x| x.cmp(&v)),
            Operand::Long(v) => record.get_long(self.column).map(|x| x.cmp(&v)),
            Operand::Timestamp(v) => record.get_timestamp(self.column).map(|x| x.cmp(&v)),
            Operand::Double(v) => record
                .get_double(self.column)
                .and_then(|x| x.partial_cmp(&v)),
        }
    }
}

impl Function for ColumnCompare {
    fn get_bool(&self, record: &dyn Record) -> bool {
        self.ordering(record).is_some_and(|ord| self.op.matches(ord))
    }
}

impl fmt::Display for ColumnCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.op, self.operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_storage::{ColumnType, FrameRecord, MemoryTable, PageFrameCursor, ScanDirection, Value};

    fn record(values: Vec<Value>, types: &[ColumnType]) -> FrameRecord {
        let mut builder = MemoryTable::builder();
        for (i, ty) in types.iter().enumerate() {
            builder = builder.column(format!("c{i}"), *ty);
        }
        let table = builder.partition(vec![values]).unwrap().build().unwrap();
        let mut frames = table.cursor(ScanDirection::Forward);
        let frame = frames.next().unwrap().unwrap();
        let mut record = FrameRecord::new(table.symbol_tables());
        record.of(&frame);
        record
    }

    #[test]
    fn test_compare_ops() {
        let r = record(vec![Value::Long(5)], &[ColumnType::Long]);
        assert!(ColumnCompare::long("c0", 0, CompareOp::Eq, 5).get_bool(&r));
        assert!(ColumnCompare::long("c0", 0, CompareOp::Ne, 4).get_bool(&r));
        assert!(ColumnCompare::long("c0", 0, CompareOp::Lt, 6).get_bool(&r));
        assert!(ColumnCompare::long("c0", 0, CompareOp::Le, 5).get_bool(&r));
        assert!(ColumnCompare::long("c0", 0, CompareOp::Gt, 4).get_bool(&r));
        assert!(ColumnCompare::long("c0", 0, CompareOp::Ge, 5).get_bool(&r));
        assert!(!ColumnCompare::long("c0", 0, CompareOp::Gt, 5).get_bool(&r));
    }

    #[test]
    fn test_null_and_nan_are_false() {
        let r = record(
            vec![Value::Null, Value::Double(f64::NAN)],
            &[ColumnType::Long, ColumnType::Double],
        );
        assert!(!ColumnCompare::long("c0", 0, CompareOp::Ne, 1).get_bool(&r));
        assert!(!ColumnCompare::double("c1", 1, CompareOp::Ne, 1.0).get_bool(&r));
    }

    #[test]
    fn test_other_operands() {
        let r = record(
            vec![Value::Int(3), Value::Timestamp(1_000), Value::Double(2.5)],
            &[ColumnType::Int, ColumnType::Timestamp, ColumnType::Double],
        );
        assert!(ColumnCompare::new("c0", 0, CompareOp::Eq, Operand::Int(3)).get_bool(&r));
        assert!(
            ColumnCompare::new("c1", 1, CompareOp::Lt, Operand::Timestamp(2_000)).get_bool(&r)
        );
        assert!(ColumnCompare::double("c2", 2, CompareOp::Ge, 2.5).get_bool(&r));
        // getter follows the operand type
        assert!(!ColumnCompare::long("c0", 0, CompareOp::Eq, 3).get_bool(&r));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ColumnCompare::double("price", 2, CompareOp::Le, 1.5).to_string(),
            "price <= 1.5"
        );
    }
}
