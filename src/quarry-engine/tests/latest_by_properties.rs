//! Property tests: latest-by cursors agree with a naive newest-first scan.

use common_config::EngineConfig;
use proptest::prelude::*;
use quarry_storage::{ColumnType, MemoryTable, RowId, ScanDirection, Value};

use quarry_engine::expr::{ColumnCompare, CompareOp, Function};
use quarry_engine::executor::{EngineResources, QueryBinding, SecurityContext};
use quarry_engine::table::{LatestByValueCursorFactory, SymbolColumn, SymbolKey};

type Row = (Option<u8>, i64);

fn symbol_name(i: u8) -> String {
    format!("s{i}")
}

fn build_table(partitions: &[Vec<Row>], max_frame_rows: usize) -> MemoryTable {
    let mut builder = MemoryTable::builder()
        .column("sym", ColumnType::Symbol)
        .column("v", ColumnType::Long)
        .max_frame_rows(max_frame_rows);
    for partition in partitions {
        let rows = partition
            .iter()
            .map(|(sym, v)| {
                let sym = sym.map_or(Value::Null, |s| Value::symbol(symbol_name(s)));
                vec![sym, Value::Long(*v)]
            })
            .collect();
        builder = builder.partition(rows).unwrap();
    }
    builder.build().unwrap()
}

/// Newest partition first, highest row first.
fn oracle(partitions: &[Vec<Row>], target: u8, below: Option<i64>) -> Option<(RowId, i64)> {
    for (p, partition) in partitions.iter().enumerate().rev() {
        for (r, (sym, v)) in partition.iter().enumerate().rev() {
            if *sym == Some(target) && below.is_none_or(|limit| *v < limit) {
                return Some((RowId::new(p, r as u64), *v));
            }
        }
    }
    None
}

fn partitions_strategy() -> impl Strategy<Value = Vec<Vec<Row>>> {
    let row = (prop::option::weighted(0.9, 0u8..3), -50i64..50);
    prop::collection::vec(prop::collection::vec(row, 0..8), 1..5)
}

proptest! {
    #[test]
    fn test_latest_by_matches_oracle(
        partitions in partitions_strategy(),
        target in 0u8..4,
        below in prop::option::of(-50i64..50),
        max_frame_rows in 1usize..4,
    ) {
        let table = build_table(&partitions, max_frame_rows);
        let mut ctx = EngineResources::new(EngineConfig::default())
            .unwrap()
            .new_context();
        ctx.bind(QueryBinding::new(SecurityContext::read_only("prop")));

        let filter = below.map(|limit| {
            Box::new(ColumnCompare::long("v", 1, CompareOp::Lt, limit)) as Box<dyn Function>
        });
        let mut factory = LatestByValueCursorFactory::new(
            SymbolColumn::new(0, "sym"),
            SymbolKey::Deferred(symbol_name(target)),
            filter,
        );
        let cursor = factory
            .get_cursor(Box::new(table.cursor(ScanDirection::Backward)), &ctx)
            .unwrap();

        let expected = oracle(&partitions, target, below);
        for _ in 0..2 {
            match expected {
                Some((row_id, v)) => {
                    prop_assert!(cursor.has_next().unwrap());
                    prop_assert_eq!(cursor.record().row_id(), row_id);
                    prop_assert_eq!(cursor.record().get_long(1), Some(v));
                    prop_assert!(!cursor.has_next().unwrap());
                }
                None => prop_assert!(!cursor.has_next().unwrap()),
            }
            cursor.to_top();
        }
    }
}
