//! Regression tests for build graph parse diagnostics.
//!
//! Diagnostics must name the location of the problem and, for common
//! mistakes, carry a hint.

use mheader::ast::BuildGraph;
use mheader::graph::{self, GraphError, map_yaml_error};
use miette::Diagnostic;
use rstest::rstest;

fn diagnostic(src: &str) -> Box<dyn Diagnostic + Send + Sync> {
    let err = serde_saphyr::from_str::<BuildGraph>(src).expect_err("graph must not parse");
    map_yaml_error(err, src, "build-graph.yml")
}

#[rstest]
#[case(
    "graph_version: \"1.0.0\"\nprojects:\n\t- name: p\n",
    "line 3",
    "Use spaces for indentation"
)]
#[case(
    concat!(
        "graph_version: \"1.0.0\"\n",
        "projects:\n",
        "  - name: p\n",
        "    source_dir: /src\n",
        "    binary_dir: /b\n",
        "    targets:\n",
        "      - { name: app, kind: program }\n",
    ),
    "unknown variant",
    "snake_case"
)]
#[case(
    concat!(
        "graph_version: \"1.0.0\"\n",
        "projects:\n",
        "  - source_dir: /src\n",
        "    binary_dir: /b\n",
    ),
    "missing field",
    "Every project needs name"
)]
#[case(
    "graph_version: \"1.0.0\"\nprojetcs: []\n",
    "unknown field",
    "Check the spelling"
)]
fn diagnostics_carry_location_and_hint(
    #[case] src: &str,
    #[case] message: &str,
    #[case] hint: &str,
) {
    let report = diagnostic(src);
    let text = report.to_string();
    assert!(text.starts_with("YAML parse error at line "), "{text}");
    assert!(text.contains(message), "{text}");
    let help = report.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains(hint), "help was: {help}");
    assert_eq!(
        report.code().map(|c| c.to_string()).as_deref(),
        Some("mheader::graph::yaml")
    );
}

#[rstest]
fn parse_errors_wrap_the_yaml_diagnostic() {
    let err = graph::from_str("projects: [").expect_err("truncated graph");
    assert!(matches!(err, GraphError::Parse { .. }));
    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("mheader::graph::parse")
    );
    assert!(err.diagnostic_source().is_some());
}

#[rstest]
fn empty_graph_is_rejected() {
    assert!(matches!(graph::from_str(""), Err(GraphError::Parse { .. })));
}
