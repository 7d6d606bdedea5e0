//! Build graph structures.
//!
//! These types mirror the YAML document that describes an already resolved
//! build graph: projects containing targets, targets owning source files, and
//! source files optionally carrying a custom build step. They are
//! deserialised with `serde-saphyr`.
//!
//! ```rust
//! use mheader::ast::{BuildGraph, TargetKind};
//!
//! let yaml = concat!(
//!     "graph_version: \"1.0.0\"\n",
//!     "projects:\n",
//!     "  - name: demo\n",
//!     "    source_dir: /src\n",
//!     "    binary_dir: /build\n",
//!     "    targets:\n",
//!     "      - name: app\n",
//!     "        kind: executable\n",
//! );
//! let graph: BuildGraph = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(graph.projects[0].targets[0].kind, TargetKind::Executable);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorSection;

/// Top-level build graph document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildGraph {
    /// Semantic version of the graph format.
    pub graph_version: Version,

    /// Active build configurations. At most one is supported.
    #[serde(default)]
    pub configurations: Vec<String>,

    /// Generator settings stored alongside the graph.
    #[serde(default)]
    pub generator: GeneratorSection,

    /// Projects in emission order.
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// A project, emitted as one description file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    /// Project name, also the stem of the description file.
    pub name: String,
    /// Root of the project's sources.
    pub source_dir: Utf8PathBuf,
    /// Directory the description and auxiliary lists are written to.
    pub binary_dir: Utf8PathBuf,
    /// Build scripts consulted while producing the graph.
    #[serde(default)]
    pub list_files: Vec<Utf8PathBuf>,
    /// Targets in enumeration order.
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// The kind of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A program.
    Executable,
    /// An archive of objects.
    StaticLibrary,
    /// A shared library that is linked against.
    SharedLibrary,
    /// A loadable module.
    ModuleLibrary,
    /// A bag of objects folded into the targets that depend on it.
    ObjectLibrary,
    /// A target that only runs commands.
    Utility,
    /// A usage-requirements-only library with no sources of its own.
    InterfaceLibrary,
    /// A pseudo target provided by the host build tool.
    Global,
}

impl TargetKind {
    /// Prefix of the target's name in the description, or `None` for kinds
    /// that are never emitted as targets.
    #[must_use]
    pub const fn name_prefix(self) -> Option<&'static str> {
        match self {
            Self::Executable => Some("Exe_"),
            Self::StaticLibrary | Self::ObjectLibrary => Some("Lib_"),
            Self::SharedLibrary | Self::ModuleLibrary => Some("Dll_"),
            Self::Utility => Some("Tool_"),
            Self::InterfaceLibrary | Self::Global => None,
        }
    }

    /// Type tag written as `Target.Type`.
    #[must_use]
    pub const fn type_tag(self) -> Option<&'static str> {
        match self {
            Self::Executable => Some("ConsoleExecutable"),
            Self::StaticLibrary | Self::ObjectLibrary => Some("StaticLibrary"),
            Self::SharedLibrary => Some("SharedDynamicLibrary"),
            Self::ModuleLibrary => Some("DynamicLibrary"),
            Self::Utility => Some("Tool"),
            Self::InterfaceLibrary | Self::Global => None,
        }
    }

    /// Static and object libraries, whose linked dependencies are only
    /// visible transitively.
    #[must_use]
    pub const fn is_static_like(self) -> bool {
        matches!(self, Self::StaticLibrary | Self::ObjectLibrary)
    }
}

/// A buildable unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Target name, unique across the graph.
    pub name: String,
    /// Target kind.
    pub kind: TargetKind,
    /// Source directory, defaulting to the project's.
    #[serde(default)]
    pub source_dir: Option<Utf8PathBuf>,
    /// Binary directory, defaulting to the project's.
    #[serde(default)]
    pub binary_dir: Option<Utf8PathBuf>,
    /// File produced by the target, if any.
    #[serde(default)]
    pub artifact: Option<Utf8PathBuf>,
    /// Compile settings per source language.
    #[serde(default)]
    pub languages: IndexMap<String, LanguageSettings>,
    /// Source files in enumeration order.
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    /// Direct dependencies.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Target {
    /// The target's source directory, falling back to the project's.
    #[must_use]
    pub fn source_dir<'a>(&'a self, project: &'a Project) -> &'a Utf8Path {
        self.source_dir.as_deref().unwrap_or(&project.source_dir)
    }

    /// The target's binary directory, falling back to the project's.
    #[must_use]
    pub fn binary_dir<'a>(&'a self, project: &'a Project) -> &'a Utf8Path {
        self.binary_dir.as_deref().unwrap_or(&project.binary_dir)
    }
}

/// Compile settings a target applies to one language.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageSettings {
    /// Header search paths in precedence order.
    #[serde(default)]
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Preprocessor definitions.
    #[serde(default)]
    pub defines: Vec<String>,
    /// Raw compiler flags.
    #[serde(default)]
    pub flags: String,
}

/// An edge to another target, either a bare name or a mapping.
///
/// ```yaml
/// dependencies:
///   - core
///   - target: codegen
///     link: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Dependency {
    /// A linked dependency.
    Name(String),
    /// A dependency with explicit link behaviour.
    Detailed {
        /// Name of the dependency target.
        target: String,
        /// Whether the dependency is linked into the dependent.
        #[serde(default = "default_true")]
        link: bool,
    },
}

const fn default_true() -> bool {
    true
}

impl Dependency {
    /// Name of the target depended upon.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Name(target) | Self::Detailed { target, .. } => target,
        }
    }

    /// Whether the dependency is linked.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        match self {
            Self::Name(_) => true,
            Self::Detailed { link, .. } => *link,
        }
    }
}

/// A file belonging to a target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: Utf8PathBuf,
    /// Source language, absent for files that are not compiled.
    #[serde(default)]
    pub language: Option<String>,
    /// The file is produced during the build.
    #[serde(default)]
    pub generated: bool,
    /// The file is only included by other files.
    #[serde(default)]
    pub header_only: bool,
    /// Set for object files contributed by an object library; such entries
    /// are skipped.
    #[serde(default)]
    pub object_library: Option<String>,
    /// Preprocessor definitions for this file.
    #[serde(default)]
    pub compile_definitions: Vec<String>,
    /// Preprocessor definitions per configuration name.
    #[serde(default)]
    pub config_definitions: IndexMap<String, Vec<String>>,
    /// Extra compiler flags for this file.
    #[serde(default)]
    pub compile_flags: Option<String>,
    /// Custom step producing or consuming this file.
    #[serde(default)]
    pub custom_step: Option<CustomStep>,
}

impl SourceFile {
    /// The language used to pick a compile type. Header-only files have
    /// none.
    #[must_use]
    pub fn effective_language(&self) -> Option<&str> {
        if self.header_only {
            return None;
        }
        self.language.as_deref().filter(|lang| !lang.is_empty())
    }

    /// Definitions registered for `config`, matched case-insensitively.
    pub fn definitions_for<'a>(&'a self, config: &'a str) -> impl Iterator<Item = &'a String> {
        self.config_definitions
            .iter()
            .filter(move |(name, _)| name.eq_ignore_ascii_case(config))
            .flat_map(|(_, defines)| defines)
    }
}

/// A command attached to a source file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CustomStep {
    /// Command lines, each an argument vector.
    #[serde(default)]
    pub command_lines: Vec<Vec<String>>,
    /// Files or targets the step depends on.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Files the step produces.
    #[serde(default)]
    pub outputs: Vec<OutputDecl>,
    /// Files the step produces as a side effect.
    #[serde(default)]
    pub byproducts: Vec<OutputDecl>,
    /// Directory the step runs in, defaulting to the target's binary
    /// directory.
    #[serde(default)]
    pub working_directory: Option<Utf8PathBuf>,
    /// Dependency file written by the step.
    #[serde(default)]
    pub depfile: Option<Utf8PathBuf>,
}

/// Prefix of output entries that only create a directory.
pub const DIRECTORY_MARKER: &str = "/DIR:";

/// An output entry, either a bare path or a mapping with flags.
///
/// ```yaml
/// outputs:
///   - /build/gen/version.h
///   - path: /build/stamp
///     symbolic: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OutputDecl {
    /// A produced file.
    Path(String),
    /// A produced file with flags.
    Detailed {
        /// Path of the output.
        path: String,
        /// Symbolic outputs never exist on disk.
        #[serde(default)]
        symbolic: bool,
    },
}

impl OutputDecl {
    /// The declared path text.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Detailed { path, .. } => path,
        }
    }

    /// Whether the output is symbolic.
    #[must_use]
    pub const fn is_symbolic(&self) -> bool {
        matches!(self, Self::Detailed { symbolic: true, .. })
    }

    /// The directory named by a `/DIR:` entry.
    #[must_use]
    pub fn created_directory(&self) -> Option<&str> {
        self.path().strip_prefix(DIRECTORY_MARKER)
    }
}
