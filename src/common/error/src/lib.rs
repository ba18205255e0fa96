//! Error types and result aliases for Quarry.
//!
//! Every crate in the workspace reports failures through [`QuarryError`].
//! Cancellation and timeouts are ordinary variants of that enum so they
//! travel through cursor calls with `?` like any other error, but
//! [`QuarryError::is_interruption`] lets the driving layer tell them apart.

mod error;

pub use error::{QuarryError, QuarryResult};
