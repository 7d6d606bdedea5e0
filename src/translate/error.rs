//! Errors that abort translation.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Fatal conditions raised while turning the graph into descriptions.
#[derive(Debug, Error, Diagnostic)]
pub enum TranslateError {
    /// A source or target language has no compile type mapping.
    #[error("language '{language}' used by target '{target}' is not recognised")]
    #[diagnostic(
        code(mheader::translate::unknown_language),
        help("add a mapping for '{language}' to the generator languages")
    )]
    UnknownLanguage {
        /// The unmapped language.
        language: String,
        /// Target using it.
        target: String,
    },

    /// A custom step has several command lines and joining is disabled.
    #[error("custom step for '{file}' in target '{target}' declares {count} command lines; only one is supported")]
    #[diagnostic(
        code(mheader::translate::multiple_command_lines),
        help("merge the commands or enable join_command_lines")
    )]
    MultipleCommandLines {
        /// Target owning the step.
        target: String,
        /// File the step is attached to.
        file: Utf8PathBuf,
        /// Number of command lines found.
        count: usize,
    },

    /// The graph lists more than one active configuration.
    #[error("{count} build configurations are active; exactly one is supported")]
    #[diagnostic(
        code(mheader::translate::multiple_configurations),
        help("generate a separate graph per configuration")
    )]
    MultipleConfigurations {
        /// Number of configurations listed.
        count: usize,
    },

    /// A dependency names a target that is not part of the graph.
    #[error("target '{target}' depends on unknown target '{dependency}'")]
    #[diagnostic(code(mheader::translate::unknown_dependency))]
    UnknownDependency {
        /// Target declaring the dependency.
        target: String,
        /// The missing dependency.
        dependency: String,
    },
}
