//! Build graph loading.
//!
//! The graph is a YAML document parsed straight into [`BuildGraph`]. Parse
//! failures are reported as [`GraphError::Parse`] diagnostics that point at
//! the offending location, and graphs written for an unsupported format
//! version are rejected before translation starts.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

mod diagnostics;
mod hints;

pub use diagnostics::map_yaml_error;

use std::fs;

use anyhow::{Context, Result};
use camino::Utf8Path;
use miette::Diagnostic;
use semver::Version;
use thiserror::Error;

use crate::ast::BuildGraph;

/// Major version of the graph format understood by this crate.
pub const SUPPORTED_MAJOR: u64 = 1;

/// Name used in diagnostics for graphs parsed from memory.
const INLINE_NAME: &str = "build graph";

/// Errors raised while loading a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The YAML could not be parsed into a graph.
    #[error("build graph parse error")]
    #[diagnostic(code(mheader::graph::parse))]
    Parse {
        /// The underlying YAML diagnostic.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },

    /// The graph declares a format version this crate cannot read.
    #[error("build graph version {found} is not supported")]
    #[diagnostic(
        code(mheader::graph::version),
        help("regenerate the graph with a format version 1.x exporter")
    )]
    UnsupportedVersion {
        /// The declared version.
        found: Version,
    },
}

/// Parse `yaml` into a [`BuildGraph`], naming it `name` in diagnostics.
///
/// # Errors
///
/// Returns [`GraphError`] when parsing fails or the version is unsupported.
pub fn from_str_named(yaml: &str, name: &str) -> Result<BuildGraph, GraphError> {
    let graph: BuildGraph = serde_saphyr::from_str(yaml).map_err(|err| GraphError::Parse {
        source: map_yaml_error(err, yaml, name),
    })?;
    if graph.graph_version.major != SUPPORTED_MAJOR {
        return Err(GraphError::UnsupportedVersion {
            found: graph.graph_version,
        });
    }
    Ok(graph)
}

/// Parse a graph held in memory.
///
/// # Errors
///
/// Returns [`GraphError`] when parsing fails or the version is unsupported.
pub fn from_str(yaml: &str) -> Result<BuildGraph, GraphError> {
    from_str_named(yaml, INLINE_NAME)
}

/// Load a graph from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a valid
/// graph.
pub fn from_path(path: &Utf8Path) -> Result<BuildGraph> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read build graph {path}"))?;
    Ok(from_str_named(&data, path.as_str())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Dependency, OutputDecl, TargetKind};
    use rstest::rstest;

    const GRAPH: &str = r#"
graph_version: "1.2.0"
configurations: [Release]
generator:
  hide_prefixes: [/opt/sdk]
projects:
  - name: demo
    source_dir: /src
    binary_dir: /build
    list_files: [/src/CMakeLists.txt]
    targets:
      - name: core
        kind: static_library
        languages:
          C:
            include_dirs: [include]
            defines: [CORE=1]
            flags: -std=c11
        sources:
          - path: /src/core.c
            language: C
      - name: app
        kind: executable
        dependencies:
          - core
          - target: codegen
            link: false
        sources:
          - path: /build/gen/version.h
            generated: true
            custom_step:
              command_lines: [[python, gen.py]]
              outputs:
                - /build/gen/version.h
                - path: /build/gen/stamp
                  symbolic: true
"#;

    #[rstest]
    fn parses_a_complete_graph() {
        let graph = from_str(GRAPH).expect("graph parses");
        assert_eq!(graph.configurations, ["Release"]);
        assert_eq!(graph.generator.hide_prefixes, ["/opt/sdk"]);
        let project = &graph.projects[0];
        assert_eq!(project.targets[0].kind, TargetKind::StaticLibrary);
        let app = &project.targets[1];
        assert_eq!(
            app.dependencies,
            [
                Dependency::Name("core".into()),
                Dependency::Detailed {
                    target: "codegen".into(),
                    link: false,
                },
            ]
        );
        let step = app.sources[0].custom_step.as_ref().expect("custom step");
        assert_eq!(step.command_lines, [["python", "gen.py"]]);
        assert!(!step.outputs[0].is_symbolic());
        assert!(matches!(step.outputs[1], OutputDecl::Detailed { symbolic: true, .. }));
    }

    #[rstest]
    fn rejects_unknown_keys() {
        let yaml = "graph_version: \"1.0.0\"\nprojcts: []\n";
        assert!(matches!(from_str(yaml), Err(GraphError::Parse { .. })));
    }

    #[rstest]
    fn rejects_newer_major_versions() {
        let yaml = "graph_version: \"2.0.0\"\n";
        let err = from_str(yaml).expect_err("version 2 is unsupported");
        assert!(matches!(err, GraphError::UnsupportedVersion { .. }));
        assert_eq!(err.to_string(), "build graph version 2.0.0 is not supported");
    }
}
