//! Path resolution helpers for the runner module.
//!
//! Centralises graph and output path logic so the main runner module stays
//! focused on command dispatch.

use crate::cli::Cli;
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::RunnerError;

/// Convert a command-line path into a UTF-8 path.
///
/// # Errors
///
/// Returns [`RunnerError::NonUtf8Path`] when `path` is not valid UTF-8.
pub(super) fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf, RunnerError> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| RunnerError::NonUtf8Path { path })
}

/// Determine the graph path respecting the CLI's directory option.
///
/// # Errors
///
/// Returns an error when the path is not valid UTF-8 or does not exist.
pub(super) fn resolve_graph_path(cli: &Cli) -> Result<Utf8PathBuf> {
    let resolved = resolve_output_path(cli, &cli.graph);
    let path = utf8_path(resolved.into_owned())?;
    if !path.as_std_path().is_file() {
        return Err(RunnerError::GraphNotFound {
            path: path.into_std_path_buf(),
        }
        .into());
    }
    Ok(path)
}

/// Resolve a path relative to the CLI working directory.
///
/// `-C/--directory` behaves like a working directory change for every
/// filesystem path supplied on the command line. When `path` is relative
/// and a directory has been configured, the returned path is
/// `directory/path`.
#[must_use]
pub(super) fn resolve_output_path<'a>(cli: &Cli, path: &'a Path) -> Cow<'a, Path> {
    if path.is_relative() {
        cli.directory
            .as_ref()
            .map_or_else(|| Cow::Borrowed(path), |dir| Cow::Owned(dir.join(path)))
    } else {
        Cow::Borrowed(path)
    }
}

/// Resolve a path taken from the graph the same way as a command-line path.
#[must_use]
pub(super) fn resolve_graph_relative<'a>(cli: &Cli, path: &'a Utf8Path) -> Cow<'a, Utf8Path> {
    match (&cli.directory, path.is_relative()) {
        (Some(dir), true) => Utf8Path::from_path(dir)
            .map_or(Cow::Borrowed(path), |base| Cow::Owned(base.join(path))),
        _ => Cow::Borrowed(path),
    }
}
