//! Translation of a build graph into per-project descriptions.
//!
//! Each project is handled in two passes. The collection pass registers every
//! output declared by the project's custom steps with an [`OutputTracker`];
//! the emission pass then builds one `%Target` subtree per emitted target. As
//! collection finishes before emission starts, a reference to an output of a
//! target that appears later in the project is still recognised.
//!
//! # Examples
//!
//! ```
//! use mheader::ast::BuildGraph;
//! use mheader::config::GeneratorConfig;
//! use mheader::probe::DiskProbe;
//! use mheader::translate::Translator;
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
//! let config = GeneratorConfig::default();
//! let translation = Translator::new(&graph, &config, DiskProbe::default())
//!     .and_then(|translator| translator.translate())
//!     .expect("translate");
//! let text = translation.projects[0].registry.to_string();
//! assert!(text.starts_with("%Target \"Exe_app\"\n"));
//! ```

mod collect;
mod custom;
mod emit;
mod error;
mod files;
pub mod flags;

pub use collect::is_emitted;
pub use error::TranslateError;

use std::collections::{BTreeSet, HashMap};

use camino::Utf8PathBuf;
use tracing::debug;

use crate::ast::{BuildGraph, Project, Target};
use crate::config::GeneratorConfig;
use crate::outputs::{OutputTracker, PathValue, escape_expression_marker};
use crate::probe::PathProbe;
use crate::registry::Registry;

/// Configuration assumed when the graph names none.
pub const DEFAULT_CONFIGURATION: &str = "Debug";

/// Extension of every description file.
pub const HEADER_EXTENSION: &str = "MHeader";

/// The description of one project plus its bookkeeping lists.
#[derive(Debug)]
pub struct ProjectDescription {
    /// Project name.
    pub name: String,
    /// Where the description is written.
    pub header_path: Utf8PathBuf,
    /// The description itself.
    pub registry: Registry,
    /// Build scripts consulted, sorted and de-duplicated.
    pub list_files: Vec<Utf8PathBuf>,
    /// Every output declared by the project's custom steps, sorted.
    pub outputs: Vec<Utf8PathBuf>,
}

/// Result of translating a whole graph.
#[derive(Debug)]
pub struct Translation {
    /// Descriptions in graph order.
    pub projects: Vec<ProjectDescription>,
    /// Tracked outputs across all projects, sorted.
    pub tracked_outputs: Vec<Utf8PathBuf>,
    /// Files that must exist as empty placeholders before the consuming
    /// tool runs, sorted.
    pub placeholders: Vec<Utf8PathBuf>,
}

/// A target together with the project declaring it.
#[derive(Debug, Clone, Copy)]
struct Owner<'a> {
    project: &'a Project,
    target: &'a Target,
}

/// Walks a [`BuildGraph`] and produces a [`Translation`].
#[derive(Debug)]
pub struct Translator<'a, P> {
    graph: &'a BuildGraph,
    config: &'a GeneratorConfig,
    probe: P,
    configuration: &'a str,
    launcher: Option<Vec<String>>,
    targets: HashMap<&'a str, Owner<'a>>,
}

impl<'a, P: PathProbe> Translator<'a, P> {
    /// Prepare a translator for `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::MultipleConfigurations`] when the graph
    /// lists more than one configuration.
    pub fn new(
        graph: &'a BuildGraph,
        config: &'a GeneratorConfig,
        probe: P,
    ) -> Result<Self, TranslateError> {
        let configuration = match graph.configurations.as_slice() {
            [] => DEFAULT_CONFIGURATION,
            [only] => only.as_str(),
            many => return Err(TranslateError::MultipleConfigurations { count: many.len() }),
        };
        let targets = graph
            .projects
            .iter()
            .flat_map(|project| {
                project
                    .targets
                    .iter()
                    .map(move |target| (target.name.as_str(), Owner { project, target }))
            })
            .collect();
        Ok(Self {
            graph,
            config,
            probe,
            configuration,
            launcher: config.launcher_args(),
            targets,
        })
    }

    /// The configuration definitions are resolved for.
    #[must_use]
    pub const fn configuration(&self) -> &str {
        self.configuration
    }

    /// Translate every project of the graph.
    ///
    /// # Errors
    ///
    /// Returns the first [`TranslateError`] encountered; no partial result is
    /// produced.
    pub fn translate(&self) -> Result<Translation, TranslateError> {
        let mut tracker = OutputTracker::new(self.config.transient_root.clone());
        let mut placeholders = BTreeSet::new();
        let mut projects = Vec::with_capacity(self.graph.projects.len());

        for project in &self.graph.projects {
            collect::register_project_outputs(&mut tracker, project, &self.targets);
            let mut emitter = ProjectEmitter {
                translator: self,
                project,
                tracker: &tracker,
                placeholders: &mut placeholders,
                registry: Registry::new(),
            };
            for target in project.targets.iter().filter(|target| is_emitted(target)) {
                emitter.emit_target(Owner { project, target })?;
            }
            let registry = emitter.registry;
            let list_files: BTreeSet<Utf8PathBuf> = project.list_files.iter().cloned().collect();
            debug!(project = %project.name, "translated project");
            projects.push(ProjectDescription {
                name: project.name.clone(),
                header_path: project
                    .binary_dir
                    .join(format!("{}.{HEADER_EXTENSION}", project.name)),
                registry,
                list_files: list_files.into_iter().collect(),
                outputs: tracker.declared_outputs(&project.name),
            });
        }

        Ok(Translation {
            projects,
            tracked_outputs: tracker.tracked_outputs(),
            placeholders: placeholders.into_iter().collect(),
        })
    }

    fn lookup(&self, dependent: &Target, name: &str) -> Result<Owner<'a>, TranslateError> {
        self.targets
            .get(name)
            .copied()
            .ok_or_else(|| TranslateError::UnknownDependency {
                target: dependent.name.clone(),
                dependency: name.to_owned(),
            })
    }

    fn compile_type(&self, owner: Owner<'_>, language: &str) -> Result<&'a str, TranslateError> {
        self.config
            .compile_type(language)
            .ok_or_else(|| TranslateError::UnknownLanguage {
                language: language.to_owned(),
                target: owner.target.name.clone(),
            })
    }
}

/// Translate `graph` in one call.
///
/// # Errors
///
/// Returns any [`TranslateError`] raised while translating.
pub fn translate<P: PathProbe>(
    graph: &BuildGraph,
    config: &GeneratorConfig,
    probe: P,
) -> Result<Translation, TranslateError> {
    Translator::new(graph, config, probe)?.translate()
}

/// Emission state for one project.
struct ProjectEmitter<'t, 'a, P> {
    translator: &'t Translator<'a, P>,
    project: &'a Project,
    tracker: &'t OutputTracker,
    placeholders: &'t mut BTreeSet<Utf8PathBuf>,
    registry: Registry,
}

impl<P> ProjectEmitter<'_, '_, P> {
    fn project_name(&self) -> &str {
        &self.project.name
    }

    /// Prepare free text for an interpolated value: `@` is doubled and
    /// embedded tracked outputs become path expressions.
    fn interpolated(&self, text: &str) -> String {
        let marked = escape_expression_marker(text);
        self.tracker
            .rewrite_embedded(self.project_name(), &marked)
            .into_owned()
    }
}

/// Join path values into a `;` separated interpolated list.
fn join_paths(values: impl IntoIterator<Item = PathValue>) -> String {
    use itertools::Itertools as _;

    values
        .into_iter()
        .map(|value| match value {
            PathValue::Literal(path) => escape_expression_marker(&path).into_owned(),
            dynamic @ PathValue::Dynamic(_) => dynamic.render().into_owned(),
        })
        .join(";")
}
