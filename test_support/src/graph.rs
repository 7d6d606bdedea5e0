//! Helpers for constructing build graph fixtures in tests.

use mheader::ast::BuildGraph;

/// Prefix the provided graph body with the standard version header.
#[must_use]
pub fn graph_yaml(body: &str) -> String {
    format!("graph_version: \"1.0.0\"\n{body}")
}

/// Parse a graph body prefixed with the version header.
///
/// # Panics
///
/// Panics when the fixture is not a valid graph.
#[must_use]
pub fn parse_graph(body: &str) -> BuildGraph {
    mheader::graph::from_str(&graph_yaml(body)).expect("fixture graph parses")
}
