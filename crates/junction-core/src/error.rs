//! Error types for diagram construction and graph operations.
//!
//! Three failure classes live here:
//!
//! - [`ValidationError`] - structural problems with a [`Diagram`](crate::Diagram)
//!   such as duplicate node ids or edges that reference missing nodes.
//! - [`CyclicGraphError`] - an ordering was requested on a graph that
//!   contains a directed cycle.
//! - [`UnsupportedOptionError`] - an option value (direction, format, rule
//!   name, merge strategy) is not part of the closed set the library accepts.

use thiserror::Error;

/// A structural problem with a diagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node `{0}` already exists")]
    DuplicateNode(String),

    #[error("node id must not be empty")]
    EmptyId,

    #[error("node `{0}` does not exist")]
    UnknownNode(String),

    #[error("edge {from} -> {to} references missing node `{missing}`")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },
}

/// A topological ordering was requested on a cyclic graph.
///
/// Names one edge that lies on a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("graph contains a cycle through edge {from} -> {to}")]
pub struct CyclicGraphError {
    from: String,
    to: String,
}

impl CyclicGraphError {
    /// Create a new error for the offending edge.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Source node id of the offending edge.
    pub fn source_id(&self) -> &str {
        &self.from
    }

    /// Target node id of the offending edge.
    pub fn target_id(&self) -> &str {
        &self.to
    }
}

/// An option value outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {option} `{value}` (expected one of: {expected})")]
pub struct UnsupportedOptionError {
    option: &'static str,
    value: String,
    expected: &'static str,
}

impl UnsupportedOptionError {
    /// Create a new error.
    ///
    /// # Arguments
    ///
    /// * `option` - Name of the option, e.g. `"direction"`
    /// * `value` - The rejected value as supplied by the caller
    /// * `expected` - Human readable list of accepted values
    pub fn new(option: &'static str, value: impl Into<String>, expected: &'static str) -> Self {
        Self {
            option,
            value: value.into(),
            expected,
        }
    }

    /// Name of the rejected option.
    pub fn option(&self) -> &'static str {
        self.option
    }

    /// The rejected value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::DuplicateNode("a".to_string()).to_string(),
            "node `a` already exists"
        );
        let err = ValidationError::DanglingEdge {
            from: "a".to_string(),
            to: "b".to_string(),
            missing: "b".to_string(),
        };
        assert_eq!(err.to_string(), "edge a -> b references missing node `b`");
    }

    #[test]
    fn test_cyclic_error_names_edge() {
        let err = CyclicGraphError::new("c", "a");
        assert_eq!(err.source_id(), "c");
        assert_eq!(err.target_id(), "a");
        assert_eq!(err.to_string(), "graph contains a cycle through edge c -> a");
    }

    #[test]
    fn test_unsupported_option_display() {
        let err = UnsupportedOptionError::new("direction", "diagonal", "TD, LR, BT, RL");
        assert_eq!(err.option(), "direction");
        assert_eq!(err.value(), "diagonal");
        assert_eq!(
            err.to_string(),
            "unsupported direction `diagonal` (expected one of: TD, LR, BT, RL)"
        );
    }
}
