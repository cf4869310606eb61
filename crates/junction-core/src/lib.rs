//! Junction Core Types and Operations
//!
//! This crate provides the foundational pieces shared by every Junction
//! front end and back end. It includes:
//!
//! - **Diagram model**: the graph IR of nodes, edges and metadata ([`diagram`] module)
//! - **Graph operations**: reachability, paths, cycles, ordering and simplification ([`graph`] module)
//! - **Formats**: output format identifiers and layout directions ([`format`] module)
//! - **Shapes**: per-format node-type and edge-type vocabularies ([`shape`] module)
//! - **Escaping**: per-format label quoting and its inverse ([`escape`] module)
//! - **Validation**: rule-based diagram validation and linting ([`validate`] module)
//! - **Diff**: structural comparison, merging and version history ([`diff`] module)
//! - **Errors**: validation, cycle and option errors ([`error`] module)

pub mod diagram;
pub mod diff;
pub mod error;
pub mod escape;
pub mod format;
pub mod graph;
pub mod shape;
pub mod validate;

pub use diagram::{Diagram, Edge, EdgeType, Node, NodeType};
