//! MHeader description generator.
//!
//! This library translates a build graph into the nested, line-oriented
//! MHeader description format: one `%Target` subtree per buildable target,
//! with source files grouped by directory, per-file build settings and custom
//! build steps, dependency edges and per-language compile blocks. Paths that
//! are produced by the build itself are emitted as late-bound expressions so
//! the consuming tool resolves them when it runs.
//!
//! The pipeline is: [`graph`] loads the YAML graph into [`ast`] types,
//! [`translate`] walks it with the help of [`outputs`] and [`command`], and
//! writes into a [`registry::Registry`] that renders itself through
//! [`escape`]. The [`runner`] ties these together for the binary.

pub mod ast;
pub mod cli;
pub mod command;
pub mod config;
pub mod escape;
pub mod graph;
pub mod outputs;
pub mod probe;
pub mod registry;
pub mod runner;
pub mod translate;
