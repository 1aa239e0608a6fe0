//! Graph module for module dependency modeling.
//!
//! This module provides the [`DependencyGraph`] struct, built once per scan by
//! a [`GraphBuilder`], and cycle detection over it.
//!
//! # Example
//!
//! ```rust
//! use archnav::graph::GraphBuilder;
//! use archnav::parser::Language;
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_module("app.py", Language::Python);
//! builder.add_module("db.py", Language::Python);
//! builder.add_import("app.py", "db.py");
//!
//! let graph = builder.build();
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

mod cycles;
mod dependency_graph;

pub use cycles::Cycle;
pub use dependency_graph::{directory_depth, DependencyEdge, DependencyGraph, GraphBuilder, Module};
