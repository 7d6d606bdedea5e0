//! Test utilities shared by the integration tests.
//!
//! Provides graph fixture builders, an in-memory path probe and a temporary
//! workspace that lays out a graph file on disk.

pub mod graph;
pub mod probe;
pub mod workspace;

pub use graph::graph_yaml;
pub use probe::SetProbe;
pub use workspace::Workspace;
