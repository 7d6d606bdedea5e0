//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands, and the
//! layering of generator settings. Settings are merged with `ortho_config`
//! from, lowest precedence first, the built-in defaults, the graph's
//! `generator` section, `MHEADER_*` environment variables and command-line
//! flags. List settings append across layers; scalars replace.
//!
//! The module only depends on `clap`, `serde`, `serde_json`, `ortho_config`
//! and the standard library so the build script can render a manual page
//! from it.

use clap::parser::ValueSource;
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use ortho_config::declarative::LayerComposition;
use ortho_config::{MergeComposer, OrthoConfig, OrthoError, OrthoResult, sanitize_value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Fields that take part in configuration layering.
const LAYERED_FIELDS: [&str; 10] = [
    "graph",
    "directory",
    "verbose",
    "hide_prefixes",
    "replace_prefixes",
    "transient_root",
    "languages",
    "rule_launcher",
    "group_prefix",
    "join_command_lines",
];

/// Source languages mapped to compile types out of the box.
const DEFAULT_LANGUAGES: [(&str, &str); 5] = [
    ("C", "C"),
    ("CXX", "C++"),
    ("OBJC", "ObjC"),
    ("OBJCXX", "ObjC++"),
    ("ASM", "Assembler"),
];

/// A `FROM=TO` pair, used for prefix replacements and language mappings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mapping {
    /// Text being mapped.
    pub from: String,
    /// Replacement.
    pub to: String,
}

impl Mapping {
    /// Pair `from` with `to`.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl FromStr for Mapping {
    type Err = String;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        match entry.split_once('=') {
            Some((from, to)) if !from.is_empty() => Ok(Self::new(from, to)),
            _ => Err(format!("expected FROM=TO, got '{entry}'")),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.from, self.to)
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entry = String::deserialize(deserializer)?;
        entry.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a `FROM=TO` mapping entry.
///
/// # Errors
///
/// Returns a message when the entry has no `=` or an empty `FROM`.
pub fn parse_mapping(entry: &str) -> Result<Mapping, String> {
    entry.parse()
}

/// Translate a build graph into MHeader descriptions.
#[derive(Debug, Parser, Serialize, Deserialize, OrthoConfig)]
#[command(name = "mheader", author, version, about, long_about = None)]
#[ortho_config(prefix = "MHEADER")]
pub struct Cli {
    /// Path to the build graph to translate.
    #[arg(short, long, value_name = "FILE", default_value = "build-graph.yml")]
    #[ortho_config(default = default_graph_path())]
    pub graph: PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    #[ortho_config(default = false)]
    pub verbose: bool,

    /// Path prefix hidden from the group hierarchy. The first prefix also
    /// protects its top group from pruning.
    #[arg(
        long = "hide-prefix",
        value_name = "PREFIX",
        env = "MHEADER_HIDE_PREFIXES",
        value_delimiter = ';'
    )]
    #[ortho_config(merge_strategy = "append")]
    pub hide_prefixes: Vec<String>,

    /// Replace a path prefix in the group hierarchy.
    #[arg(
        long = "replace-prefix",
        value_name = "FROM=TO",
        env = "MHEADER_REPLACE_PREFIXES",
        value_delimiter = ';',
        value_parser = parse_mapping
    )]
    #[ortho_config(merge_strategy = "append")]
    pub replace_prefixes: Vec<Mapping>,

    /// Directory whose outputs are referenced through late-bound paths.
    #[arg(long, value_name = "DIR", env = "MHEADER_TRANSIENT_ROOT")]
    pub transient_root: Option<String>,

    /// Map a source language to a compile type.
    #[arg(
        long = "language",
        value_name = "LANG=TYPE",
        env = "MHEADER_LANGUAGES",
        value_delimiter = ';',
        value_parser = parse_mapping
    )]
    #[ortho_config(merge_strategy = "append", default = default_languages())]
    pub languages: Vec<Mapping>,

    /// Command prepended to every custom step.
    #[arg(long, value_name = "COMMAND", env = "MHEADER_RULE_LAUNCHER")]
    pub rule_launcher: Option<String>,

    /// Prefix of every target's group label.
    #[arg(long, value_name = "PREFIX", env = "MHEADER_GROUP_PREFIX")]
    pub group_prefix: Option<String>,

    /// Join multiple command lines of one custom step with `&&`.
    #[arg(long)]
    #[ortho_config(default = false)]
    pub join_command_lines: bool,

    /// Optional subcommand to execute; defaults to `generate` when omitted.
    ///
    /// Layering ignores this field; CLI parsing supplies it.
    #[serde(skip)]
    #[command(subcommand)]
    #[ortho_config(skip_cli)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Generate(GenerateArgs::default()));
        }
        self
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            graph: default_graph_path(),
            directory: None,
            verbose: false,
            hide_prefixes: Vec::new(),
            replace_prefixes: Vec::new(),
            transient_root: None,
            languages: default_languages(),
            rule_launcher: None,
            group_prefix: None,
            join_command_lines: false,
            command: None,
        }
        .with_default_command()
    }
}

/// Arguments accepted by the `generate` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct GenerateArgs {
    /// Write every tracked output, across all projects, to this file.
    ///
    /// Use `-` to write to stdout.
    #[arg(long, value_name = "FILE")]
    pub outputs_list: Option<PathBuf>,

    /// Write every synthesised placeholder file to this file.
    ///
    /// Use `-` to write to stdout.
    #[arg(long, value_name = "FILE")]
    pub protected_list: Option<PathBuf>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Commands {
    /// Write every project's description and bookkeeping lists (default).
    Generate(GenerateArgs),

    /// Print descriptions to stdout without writing any file.
    Print {
        /// Only print the description of this project.
        #[arg(long, value_name = "NAME")]
        project: Option<String>,
    },

    /// Print every tracked output path, one per line.
    Outputs,
}

fn default_graph_path() -> PathBuf {
    PathBuf::from("build-graph.yml")
}

fn default_languages() -> Vec<Mapping> {
    DEFAULT_LANGUAGES
        .iter()
        .map(|(language, compile_type)| Mapping::new(*language, *compile_type))
        .collect()
}

/// Parse `args`, applying the default command.
///
/// Returns the parsed values together with the [`ArgMatches`] needed to
/// tell command-line values from environment values when layering.
///
/// # Errors
///
/// Returns the clap error when the arguments are invalid.
pub fn parse_from<I, T>(args: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = Cli::command();
    let matches = command.try_get_matches_from_mut(args)?;
    // Clone matches before from_arg_matches_mut consumes the values.
    let matches_for_merge = matches.clone();
    let mut matches_for_parse = matches;
    let cli = Cli::from_arg_matches_mut(&mut matches_for_parse)
        .map_err(|err| err.with_cmd(&command))?;
    Ok((cli.with_default_command(), matches_for_merge))
}

/// The layered fields of `cli` whose values came from `source`.
fn layer_from_matches(
    cli: &Cli,
    matches: &ArgMatches,
    source: ValueSource,
) -> OrthoResult<Value> {
    let Value::Object(mut map) = sanitize_value(cli)? else {
        return Err(Arc::new(OrthoError::Validation {
            key: String::from("cli"),
            message: String::from("expected parsed CLI values to serialize to an object"),
        }));
    };
    map.retain(|field, _| {
        LAYERED_FIELDS.contains(&field.as_str()) && matches.value_source(field) == Some(source)
    });
    Ok(Value::Object(map))
}

/// Return `true` when a layer carries no values.
fn is_empty_value(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// Merge the default, graph, environment and command-line layers.
///
/// `graph` is the graph's `generator` section rendered as a layer.
///
/// # Errors
///
/// Returns an [`OrthoError`] if a layer cannot be built or merged.
pub fn compose_layers(
    graph: Option<Value>,
    environment: Option<Value>,
    cli: Option<Value>,
) -> OrthoResult<Cli> {
    let mut errors = Vec::new();
    let mut composer = MergeComposer::with_capacity(4);

    match sanitize_value(&Cli::default()) {
        Ok(value) => composer.push_defaults(value),
        Err(err) => errors.push(err),
    }
    if let Some(value) = graph.filter(|value| !is_empty_value(value)) {
        composer.push_file(value, None);
    }
    if let Some(value) = environment.filter(|value| !is_empty_value(value)) {
        composer.push_environment(value);
    }
    if let Some(value) = cli.filter(|value| !is_empty_value(value)) {
        composer.push_cli(value);
    }

    let composition = LayerComposition::new(composer.layers(), errors);
    composition.into_merge_result(Cli::merge_from_layers)
}

/// Merge the graph's settings under the parsed CLI values.
///
/// # Errors
///
/// Returns an [`OrthoError`] if layer composition or merging fails.
pub fn merge_with_graph(
    cli: &Cli,
    matches: &ArgMatches,
    graph: Option<Value>,
) -> OrthoResult<Cli> {
    let environment = layer_from_matches(cli, matches, ValueSource::EnvVariable)?;
    let overrides = layer_from_matches(cli, matches, ValueSource::CommandLine)?;
    let mut merged = compose_layers(graph, Some(environment), Some(overrides))?;
    merged.command.clone_from(&cli.command);
    Ok(merged)
}
