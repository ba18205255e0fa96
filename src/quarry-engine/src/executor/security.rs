//! Principal and bind variables of one query.

use std::collections::HashMap;

use common_error::{QuarryError, QuarryResult};
use quarry_storage::Value;

/// What a principal may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Nothing; every statement is rejected.
    None,
    /// `SELECT` only.
    Read,
    /// Reads and writes.
    ReadWrite,
}

/// Identity of the query's principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    principal: String,
    permission: Permission,
}

impl SecurityContext {
    /// Context that denies everything. Used for unbound slots.
    pub fn deny_all() -> Self {
        Self {
            principal: String::new(),
            permission: Permission::None,
        }
    }

    /// Read-only principal.
    pub fn read_only(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            permission: Permission::Read,
        }
    }

    /// Read-write principal.
    pub fn read_write(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            permission: Permission::ReadWrite,
        }
    }

    /// Principal name; empty for [`deny_all`](Self::deny_all).
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Granted permission.
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Check that the principal may run a `SELECT`.
    pub fn authorize_select(&self) -> QuarryResult<()> {
        match self.permission {
            Permission::None => Err(QuarryError::permission_denied(format!(
                "principal '{}' may not read",
                self.principal
            ))),
            Permission::Read | Permission::ReadWrite => Ok(()),
        }
    }
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self::deny_all()
    }
}

/// Positional (`$1`) and named (`:name`) bind variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindVariables {
    indexed: Vec<Value>,
    named: HashMap<String, Value>,
}

impl BindVariables {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the variable at zero-based `index`, padding with nulls.
    pub fn set_indexed(&mut self, index: usize, value: Value) {
        if self.indexed.len() <= index {
            self.indexed.resize(index + 1, Value::Null);
        }
        self.indexed[index] = value;
    }

    /// Set a named variable.
    pub fn set_named(&mut self, name: impl Into<String>, value: Value) {
        self.named.insert(name.into(), value);
    }

    /// Variable at zero-based `index`.
    pub fn indexed(&self, index: usize) -> Option<&Value> {
        self.indexed.get(index)
    }

    /// Named variable.
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// Number of positional variables.
    pub fn indexed_count(&self) -> usize {
        self.indexed.len()
    }

    /// Whether no variable is set.
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.named.is_empty()
    }

    /// Remove all variables.
    pub fn clear(&mut self) {
        self.indexed.clear();
        self.named.clear();
    }
}
