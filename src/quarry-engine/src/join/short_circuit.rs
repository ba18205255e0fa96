//! Symbol short circuits.
//!
//! A join on symbol columns can skip probing the slave side for a master
//! row whose symbol text does not exist in the slave column's symbol
//! table: no slave row can match it.

use std::collections::HashMap;
use std::sync::Arc;

use common_display::{Describe, PlanSink};
use quarry_storage::{Record, SymbolTable, SymbolTableSource};

/// Cheap pre-check that can prove a master row has no slave match.
///
/// `true` means "no match is possible"; `false` only means absence could
/// not be proven.
pub trait SymbolShortCircuit: Describe + Send {
    /// Rebind to the slave-side symbol tables.
    fn of(&mut self, slave: &dyn SymbolTableSource);

    /// Whether `master` certainly has no match.
    fn is_short_circuit(&mut self, master: &dyn Record) -> bool;
}

// ============================================================================
// Single column
// ============================================================================

/// Short circuit over one master/slave symbol column pair.
///
/// Results are cached per master key; the cache is dropped on rebind.
#[derive(Debug)]
pub struct SingleSymbolShortCircuit {
    master_column: usize,
    slave_column: usize,
    slave_table: Option<Arc<SymbolTable>>,
    cache: HashMap<i32, bool>,
}

impl SingleSymbolShortCircuit {
    pub fn new(master_column: usize, slave_column: usize) -> Self {
        Self {
            master_column,
            slave_column,
            slave_table: None,
            cache: HashMap::new(),
        }
    }

    /// Number of cached master keys.
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }
}

impl SymbolShortCircuit for SingleSymbolShortCircuit {
    fn of(&mut self, slave: &dyn SymbolTableSource) {
        self.slave_table = slave.symbol_table(self.slave_column);
        self.cache.clear();
    }

    fn is_short_circuit(&mut self, master: &dyn Record) -> bool {
        let Some(slave_table) = self.slave_table.as_deref() else {
            return false;
        };
        let Some(master_key) = master.get_int(self.master_column) else {
            return false;
        };
        let master_column = self.master_column;
        *self.cache.entry(master_key).or_insert_with(|| {
            master
                .get_sym(master_column)
                .is_some_and(|text| slave_table.key_of(text).is_none())
        })
    }
}

impl Describe for SingleSymbolShortCircuit {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("Symbol short circuit")
            .attr("master", self.master_column)
            .attr("slave", self.slave_column);
    }
}

// ============================================================================
// No-op
// ============================================================================

/// Never short-circuits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSymbolShortCircuit;

impl SymbolShortCircuit for NoopSymbolShortCircuit {
    fn of(&mut self, _slave: &dyn SymbolTableSource) {}

    fn is_short_circuit(&mut self, _master: &dyn Record) -> bool {
        false
    }
}

impl Describe for NoopSymbolShortCircuit {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("No short circuit");
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Ordered chain: short-circuits at the first member that does.
pub struct ChainedSymbolShortCircuit {
    members: Vec<Box<dyn SymbolShortCircuit>>,
}

impl ChainedSymbolShortCircuit {
    pub fn new(members: Vec<Box<dyn SymbolShortCircuit>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl SymbolShortCircuit for ChainedSymbolShortCircuit {
    fn of(&mut self, slave: &dyn SymbolTableSource) {
        for member in &mut self.members {
            member.of(slave);
        }
    }

    fn is_short_circuit(&mut self, master: &dyn Record) -> bool {
        self.members.iter_mut().any(|m| m.is_short_circuit(master))
    }
}

impl Describe for ChainedSymbolShortCircuit {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("Symbol short circuit chain");
        for member in &self.members {
            sink.child(|child| member.describe(child));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use quarry_storage::{
        ColumnType, FrameRecord, MemoryTable, PageFrameCursor, ScanDirection, SymbolTables,
        Value,
    };

    use super::*;

    fn master() -> (MemoryTable, FrameRecord) {
        let table = MemoryTable::builder()
            .column("sym", ColumnType::Symbol)
            .partition(vec![
                vec![Value::symbol("AAPL")],
                vec![Value::symbol("TSLA")],
                vec![Value::Null],
            ])
            .unwrap()
            .build()
            .unwrap();
        let frame = table
            .cursor(ScanDirection::Forward)
            .next()
            .unwrap()
            .unwrap();
        let mut record = FrameRecord::new(table.symbol_tables());
        record.of(&frame);
        (table, record)
    }

    fn slave() -> SymbolTables {
        SymbolTables::new(vec![
            None,
            Some(Arc::new(SymbolTable::from_values(["AAPL", "MSFT"]))),
        ])
    }

    #[test]
    fn test_single_short_circuit() {
        let (_table, mut record) = master();
        let mut sc = SingleSymbolShortCircuit::new(0, 1);

        // unbound: cannot prove anything
        assert!(!sc.is_short_circuit(&record));

        sc.of(&slave());
        assert!(!sc.is_short_circuit(&record));
        record.set_row_index(1);
        assert!(sc.is_short_circuit(&record));
        record.set_row_index(2);
        assert!(!sc.is_short_circuit(&record));
        assert_eq!(sc.cached_keys(), 2);

        sc.of(&slave());
        assert_eq!(sc.cached_keys(), 0);
    }

    #[test]
    fn test_non_symbol_slave_column() {
        let (_table, mut record) = master();
        let mut sc = SingleSymbolShortCircuit::new(0, 0);
        sc.of(&slave());
        record.set_row_index(1);
        assert!(!sc.is_short_circuit(&record));
    }

    struct Counting {
        answer: bool,
        calls: Arc<AtomicUsize>,
    }

    impl SymbolShortCircuit for Counting {
        fn of(&mut self, _slave: &dyn SymbolTableSource) {}

        fn is_short_circuit(&mut self, _master: &dyn Record) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    impl Describe for Counting {
        fn describe(&self, sink: &mut PlanSink) {
            sink.type_("Counting").attr("answer", self.answer);
        }
    }

    fn counting(answer: bool) -> (Box<dyn SymbolShortCircuit>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Counting {
                answer,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    #[test]
    fn test_chain_stops_at_first_true() {
        let (_table, record) = master();
        let (a, a_calls) = counting(false);
        let (b, b_calls) = counting(true);
        let (c, c_calls) = counting(false);
        let mut chain = ChainedSymbolShortCircuit::new(vec![a, b, c]);

        assert!(chain.is_short_circuit(&record));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chain_all_false() {
        let (_table, record) = master();
        let (a, _) = counting(false);
        let (b, _) = counting(false);
        let mut chain = ChainedSymbolShortCircuit::new(vec![a, b, Box::new(NoopSymbolShortCircuit)]);
        assert!(!chain.is_short_circuit(&record));
        assert!(!ChainedSymbolShortCircuit::new(Vec::new()).is_short_circuit(&record));
    }

    #[test]
    fn test_chain_rebinds_members() {
        let (_table, mut record) = master();
        let mut chain = ChainedSymbolShortCircuit::new(vec![
            Box::new(NoopSymbolShortCircuit),
            Box::new(SingleSymbolShortCircuit::new(0, 1)),
        ]);
        chain.of(&slave());
        record.set_row_index(1);
        assert!(chain.is_short_circuit(&record));
        assert_eq!(
            common_display::explain(&chain),
            "Symbol short circuit chain\n├─ No short circuit\n└─ Symbol short circuit (master: 0, slave: 1)\n"
        );
    }
}
