//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the graph, layers the configuration, runs the translation and then
//! either writes the results to disk or prints them.

mod error;
mod file_io;
mod path_helpers;

pub use error::RunnerError;

use crate::cli::{self, Cli, Commands, GenerateArgs};
use crate::config::GeneratorConfig;
use crate::probe::DiskProbe;
use crate::translate::{ProjectDescription, Translation};
use crate::ast::BuildGraph;
use crate::{graph, translate};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::ArgMatches;
use std::path::Path;
use tracing::{debug, info};

use file_io::{create_placeholder, is_stdout_path, render_lines, write_file, write_stdout};
use path_helpers::{resolve_graph_path, resolve_graph_relative, resolve_output_path, utf8_path};

/// Suffix of the per-project list of consulted build scripts.
pub const DEPENDENCIES_SUFFIX: &str = "dependencies";
/// Suffix of the per-project list of declared outputs.
pub const OUTPUTS_SUFFIX: &str = "outputs";

/// Execute the parsed [`Cli`] command.
///
/// `matches` tells command-line and environment values apart when the
/// graph's generator settings are layered underneath them.
///
/// # Errors
///
/// Returns an error if the graph cannot be loaded or translated, or if an
/// output cannot be written.
pub fn run(cli: &Cli, matches: &ArgMatches) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Generate(GenerateArgs::default()));
    let translation = load_and_translate(cli, matches)?;
    match command {
        Commands::Generate(args) => handle_generate(cli, &args, &translation),
        Commands::Print { project } => handle_print(&translation, project.as_deref()),
        Commands::Outputs => write_stdout(&render_lines(&translation.tracked_outputs)),
    }
}

/// Layer the graph's generator section under the CLI and environment
/// values.
///
/// # Errors
///
/// Returns an error when the layers cannot be merged.
pub fn generator_config(
    cli: &Cli,
    matches: &ArgMatches,
    graph: &BuildGraph,
) -> Result<GeneratorConfig> {
    let merged = cli::merge_with_graph(cli, matches, Some(graph.generator.to_layer()))
        .context("failed to merge generator configuration layers")?;
    Ok(GeneratorConfig::from(&merged))
}

/// File existence check rooted at `-C/--directory` when one is given.
fn disk_probe(cli: &Cli) -> Result<DiskProbe, RunnerError> {
    match &cli.directory {
        Some(dir) => Ok(DiskProbe::rooted_at(utf8_path(dir.clone())?)),
        None => Ok(DiskProbe::default()),
    }
}

fn load_and_translate(cli: &Cli, matches: &ArgMatches) -> Result<Translation> {
    let graph_path = resolve_graph_path(cli)?;
    let graph = graph::from_path(&graph_path)?;
    debug!(
        path = %graph_path,
        version = %graph.graph_version,
        projects = graph.projects.len(),
        "loaded build graph"
    );
    let config = generator_config(cli, matches, &graph)?;
    translate::translate(&graph, &config, disk_probe(cli)?)
        .with_context(|| format!("failed to translate build graph {graph_path}"))
}

fn handle_generate(cli: &Cli, args: &GenerateArgs, translation: &Translation) -> Result<()> {
    for project in &translation.projects {
        write_project(cli, project)?;
    }
    for placeholder in &translation.placeholders {
        create_placeholder(&resolve_graph_relative(cli, placeholder))?;
    }
    if let Some(path) = &args.outputs_list {
        write_list(cli, path, &translation.tracked_outputs)?;
    }
    if let Some(path) = &args.protected_list {
        write_list(cli, path, &translation.placeholders)?;
    }
    info!(
        projects = translation.projects.len(),
        placeholders = translation.placeholders.len(),
        "generation complete"
    );
    Ok(())
}

fn write_project(cli: &Cli, project: &ProjectDescription) -> Result<()> {
    let header = resolve_graph_relative(cli, &project.header_path);
    write_file(&header, &project.registry.to_string())
        .with_context(|| format!("failed to write description of project {}", project.name))?;
    write_file(
        &sibling(&header, DEPENDENCIES_SUFFIX),
        &render_lines(&project.list_files),
    )?;
    write_file(&sibling(&header, OUTPUTS_SUFFIX), &render_lines(&project.outputs))?;
    Ok(())
}

/// `<header>.<suffix>` next to `header`.
fn sibling(header: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{header}.{suffix}"))
}

fn write_list(cli: &Cli, path: &Path, entries: &[Utf8PathBuf]) -> Result<()> {
    let content = render_lines(entries);
    if is_stdout_path(path) {
        return write_stdout(&content);
    }
    let resolved = utf8_path(resolve_output_path(cli, path).into_owned())?;
    write_file(&resolved, &content)?;
    Ok(())
}

fn handle_print(translation: &Translation, only: Option<&str>) -> Result<()> {
    let mut selected = translation
        .projects
        .iter()
        .filter(|project| only.is_none_or(|name| project.name == name))
        .peekable();
    if selected.peek().is_none()
        && let Some(name) = only
    {
        return Err(RunnerError::UnknownProject {
            name: name.to_owned(),
        }
        .into());
    }
    let mut out = String::new();
    for project in selected {
        out.push_str(&project.registry.to_string());
    }
    write_stdout(&out)
}

#[cfg(test)]
mod tests;
