//! Error types for the runner module.
//!
//! Kept in a submodule so the derive-macro lint suppression stays narrow.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The build graph does not exist at the expected path.
    #[error("build graph {} not found", path.display())]
    #[diagnostic(
        code(mheader::runner::graph_not_found),
        help("pass --graph or run from the directory holding build-graph.yml")
    )]
    GraphNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// A path supplied on the command line is not valid UTF-8.
    #[error("path {} is not valid UTF-8", path.display())]
    #[diagnostic(code(mheader::runner::non_utf8_path))]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// `print --project` named a project the graph does not declare.
    #[error("project '{name}' is not part of the build graph")]
    #[diagnostic(code(mheader::runner::unknown_project))]
    UnknownProject {
        /// The requested project.
        name: String,
    },
}
