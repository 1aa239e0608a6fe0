//! archnav - module dependency graph and architecture metrics
//!
//! This crate reconstructs a project's internal module-dependency graph from
//! Go, Python, TypeScript and JavaScript sources and derives architecture
//! signals from it: circular dependencies, fanout, directory depth, import
//! path complexity and dead exports.

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod export;
pub mod graph;
pub mod parser;
pub mod resolver;

pub use analysis::{analyze_project, analyze_workspace, AnalysisOptions, ArchitectureMetrics};
