//! Tree display utilities for query plans.

use std::fmt;

/// A node in a display tree.
pub trait TreeNode {
    /// Get the display name of this node.
    fn name(&self) -> &str;

    /// Get child nodes.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Get additional details to display.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Helper for displaying tree structures.
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree.
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self { root }
    }

    fn fmt_line(f: &mut fmt::Formatter<'_>, node: &dyn TreeNode) -> fmt::Result {
        write!(f, "{}", node.name())?;
        if let Some(details) = node.details() {
            write!(f, " ({details})")?;
        }
        writeln!(f)
    }

    fn fmt_node(
        f: &mut fmt::Formatter<'_>,
        node: &dyn TreeNode,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };
        write!(f, "{prefix}{connector}")?;
        Self::fmt_line(f, node)?;

        let children = node.children();
        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });

        for (i, child) in children.iter().enumerate() {
            Self::fmt_node(f, *child, &child_prefix, i == children.len() - 1)?;
        }

        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::fmt_line(f, self.root)?;

        let children = self.root.children();
        for (i, child) in children.iter().enumerate() {
            Self::fmt_node(f, *child, "", i == children.len() - 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        name: String,
        details: Option<String>,
        children: Vec<TestNode>,
    }

    impl TestNode {
        fn leaf(name: &str) -> Self {
            Self {
                name: name.to_string(),
                details: None,
                children: vec![],
            }
        }
    }

    impl TreeNode for TestNode {
        fn name(&self) -> &str {
            &self.name
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }

        fn details(&self) -> Option<String> {
            self.details.clone()
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            name: "Root".to_string(),
            details: Some("k=v".to_string()),
            children: vec![TestNode::leaf("Child1"), TestNode::leaf("Child2")],
        };

        let output = DisplayTree::new(&tree).to_string();
        assert_eq!(output, "Root (k=v)\n├─ Child1\n└─ Child2\n");
    }

    #[test]
    fn test_display_nested_prefix() {
        let tree = TestNode {
            name: "Root".to_string(),
            details: None,
            children: vec![TestNode {
                name: "Mid".to_string(),
                details: None,
                children: vec![TestNode::leaf("Leaf")],
            }],
        };

        let output = DisplayTree::new(&tree).to_string();
        assert_eq!(output, "Root\n└─ Mid\n   └─ Leaf\n");
    }
}
