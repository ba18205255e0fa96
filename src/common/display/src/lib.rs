//! Display utilities for Quarry.
//!
//! Cursors, filters and short circuits describe themselves into a
//! [`PlanSink`], which renders the collected nodes as an indented tree for
//! plan inspection.

mod sink;
mod tree;

pub use sink::{Describe, PlanNode, PlanSink, explain};
pub use tree::{DisplayTree, TreeNode};

/// Format a value for display with optional truncation.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
