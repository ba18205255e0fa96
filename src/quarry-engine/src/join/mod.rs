//! Join support.

mod short_circuit;

pub use short_circuit::{
    ChainedSymbolShortCircuit, NoopSymbolShortCircuit, SingleSymbolShortCircuit,
    SymbolShortCircuit,
};
