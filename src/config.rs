//! Generator settings.
//!
//! [`GeneratorConfig`] gathers everything the translator needs to know about
//! the host environment: path prefixes to rewrite or hide, the transient
//! output root, the language to compile-type mapping and the rule launcher.
//! It is resolved once from the layered [`Cli`] values and then handed to the
//! translator by reference.
//!
//! [`GeneratorSection`] is the graph file's `generator` section. It is not
//! used directly; it becomes one layer of the merge.

use crate::cli::{self, Cli};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use itertools::Itertools;
use ortho_config::OrthoResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Group label prefix applied when none is configured.
pub const DEFAULT_GROUP_PREFIX: &str = "External";

/// The graph file's `generator` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct GeneratorSection {
    /// Extra hide prefixes.
    pub hide_prefixes: Vec<String>,
    /// Extra prefix substitutions.
    pub replace_prefixes: IndexMap<String, String>,
    /// Transient output root.
    pub transient_root: Option<Utf8PathBuf>,
    /// Extra or replaced language mappings.
    pub languages: IndexMap<String, String>,
    /// Rule launcher.
    pub rule_launcher: Option<String>,
    /// Group label prefix.
    pub group_prefix: Option<String>,
    /// Join multiple command lines of one step.
    pub join_command_lines: Option<bool>,
}

fn mapping_list(map: &IndexMap<String, String>) -> Value {
    map.iter()
        .map(|(from, to)| Value::from(format!("{from}={to}")))
        .collect()
}

impl GeneratorSection {
    /// Render the section as a configuration layer holding only the values
    /// it sets.
    #[must_use]
    pub fn to_layer(&self) -> Value {
        let mut layer = Map::new();
        if !self.hide_prefixes.is_empty() {
            layer.insert("hide_prefixes".into(), Value::from(self.hide_prefixes.clone()));
        }
        if !self.replace_prefixes.is_empty() {
            layer.insert("replace_prefixes".into(), mapping_list(&self.replace_prefixes));
        }
        if let Some(root) = &self.transient_root {
            layer.insert("transient_root".into(), Value::from(root.as_str()));
        }
        if !self.languages.is_empty() {
            layer.insert("languages".into(), mapping_list(&self.languages));
        }
        if let Some(launcher) = &self.rule_launcher {
            layer.insert("rule_launcher".into(), Value::from(launcher.as_str()));
        }
        if let Some(prefix) = &self.group_prefix {
            layer.insert("group_prefix".into(), Value::from(prefix.as_str()));
        }
        if let Some(join) = self.join_command_lines {
            layer.insert("join_command_lines".into(), Value::from(join));
        }
        Value::Object(layer)
    }
}

/// Settings consumed by the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path prefixes stripped from displayed file paths. A file under the
    /// first prefix has its top group protected from pruning.
    pub hide_prefixes: Vec<String>,
    /// Literal prefix substitutions applied to displayed file paths, first
    /// match wins.
    pub replace_prefixes: IndexMap<String, String>,
    /// Directory under which generated outputs are late-bound.
    pub transient_root: Option<Utf8PathBuf>,
    /// Source language to compile type.
    pub languages: IndexMap<String, String>,
    /// Command prepended to every custom step.
    pub rule_launcher: Option<String>,
    /// Prefix of every `Target.Group` label.
    pub group_prefix: String,
    /// Join multiple command lines of one step with ` && ` instead of
    /// rejecting them.
    pub join_command_lines: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from(&Cli::default())
    }
}

/// Later mappings for the same key replace earlier ones in place.
fn mapping_table(mappings: &[cli::Mapping]) -> IndexMap<String, String> {
    mappings
        .iter()
        .map(|mapping| (mapping.from.clone(), mapping.to.clone()))
        .collect()
}

impl From<&Cli> for GeneratorConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            hide_prefixes: cli.hide_prefixes.iter().unique().cloned().collect(),
            replace_prefixes: mapping_table(&cli.replace_prefixes),
            transient_root: cli.transient_root.as_deref().map(Utf8PathBuf::from),
            languages: mapping_table(&cli.languages),
            rule_launcher: cli.rule_launcher.clone(),
            group_prefix: cli
                .group_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_GROUP_PREFIX.to_owned()),
            join_command_lines: cli.join_command_lines,
        }
    }
}

impl GeneratorConfig {
    /// Layer a graph's `generator` section over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an [`ortho_config::OrthoError`] when the layers cannot be
    /// merged.
    pub fn from_section(section: &GeneratorSection) -> OrthoResult<Self> {
        let merged = cli::compose_layers(Some(section.to_layer()), None, None)?;
        Ok(Self::from(&merged))
    }

    /// Compile type for a source language.
    #[must_use]
    pub fn compile_type(&self, language: &str) -> Option<&str> {
        self.languages.get(language).map(String::as_str)
    }

    /// The rule launcher split into arguments, or `None` when unset, blank or
    /// not splittable.
    #[must_use]
    pub fn launcher_args(&self) -> Option<Vec<String>> {
        let launcher = self.rule_launcher.as_deref()?.trim();
        if launcher.is_empty() {
            return None;
        }
        shlex::split(launcher).filter(|args| !args.is_empty())
    }
}
