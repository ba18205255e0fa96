//! Plan sink used by `describe` hooks.

use std::fmt;

use crate::tree::{DisplayTree, TreeNode};
use crate::truncate_string;

const MAX_ATTR_LEN: usize = 120;

/// Anything that can render its algorithm choice into a plan.
pub trait Describe {
    /// Write this node (and its children) into the sink.
    fn describe(&self, sink: &mut PlanSink);
}

/// One rendered plan node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanNode {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<PlanNode>,
}

impl PlanNode {
    /// Node type, e.g. `Row backward scan`.
    pub fn kind(&self) -> &str {
        &self.name
    }

    /// Attribute value by key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child nodes in insertion order.
    pub fn child_nodes(&self) -> &[PlanNode] {
        &self.children
    }
}

impl TreeNode for PlanNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        self.children.iter().map(|c| c as &dyn TreeNode).collect()
    }

    fn details(&self) -> Option<String> {
        if self.attrs.is_empty() {
            return None;
        }
        let rendered = self
            .attrs
            .iter()
            .map(|(k, v)| format!("{k}: {}", truncate_string(v, MAX_ATTR_LEN)))
            .collect::<Vec<_>>()
            .join(", ");
        Some(rendered)
    }
}

/// Collects plan nodes emitted by `describe` calls.
///
/// The sink always has a current node; `child` opens a nested node for the
/// duration of the closure.
#[derive(Debug)]
pub struct PlanSink {
    stack: Vec<PlanNode>,
}

impl PlanSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            stack: vec![PlanNode::default()],
        }
    }

    fn current(&mut self) -> &mut PlanNode {
        // the root is never popped
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Set the type of the current node.
    pub fn type_(&mut self, name: impl Into<String>) -> &mut Self {
        self.current().name = name.into();
        self
    }

    /// Add an attribute to the current node.
    pub fn attr(&mut self, key: impl Into<String>, value: impl fmt::Display) -> &mut Self {
        let value = value.to_string();
        self.current().attrs.push((key.into(), value));
        self
    }

    /// Describe a child node.
    pub fn child(&mut self, f: impl FnOnce(&mut PlanSink)) -> &mut Self {
        self.stack.push(PlanNode::default());
        f(self);
        if let Some(node) = self.stack.pop() {
            self.current().children.push(node);
        }
        self
    }

    /// Describe `value` as a child node.
    pub fn describe_child(&mut self, value: &dyn Describe) -> &mut Self {
        self.child(|sink| value.describe(sink))
    }

    /// Finish and return the root node.
    pub fn into_root(mut self) -> PlanNode {
        self.stack.truncate(1);
        self.stack.pop().unwrap_or_default()
    }

    /// Render the plan as text.
    pub fn render(self) -> String {
        let root = self.into_root();
        DisplayTree::new(&root).to_string()
    }
}

impl Default for PlanSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a single describable value.
pub fn explain(value: &dyn Describe) -> String {
    let mut sink = PlanSink::new();
    value.describe(&mut sink);
    sink.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scan;

    impl Describe for Scan {
        fn describe(&self, sink: &mut PlanSink) {
            sink.type_("Frame forward scan").attr("on", "trades");
        }
    }

    struct Filter;

    impl Describe for Filter {
        fn describe(&self, sink: &mut PlanSink) {
            sink.type_("Filter").attr("filter", "price > 10");
            sink.describe_child(&Scan);
        }
    }

    #[test]
    fn test_plan_sink_render() {
        let output = explain(&Filter);
        assert_eq!(
            output,
            "Filter (filter: price > 10)\n└─ Frame forward scan (on: trades)\n"
        );
    }

    #[test]
    fn test_plan_sink_root_access() {
        let mut sink = PlanSink::new();
        Filter.describe(&mut sink);
        let root = sink.into_root();

        assert_eq!(root.kind(), "Filter");
        assert_eq!(root.attr("filter"), Some("price > 10"));
        assert_eq!(root.child_nodes().len(), 1);
        assert_eq!(root.child_nodes()[0].attr("on"), Some("trades"));
    }
}
