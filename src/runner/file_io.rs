//! File creation helpers for the runner.
//!
//! Descriptions and lists are written through a temporary file in the
//! destination directory and persisted over the target. Placeholders are
//! created through capability-based directory handles.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Return `true` when `path` is the sentinel for "write to stdout".
#[must_use]
pub(super) fn is_stdout_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Render `lines` one per line with a trailing newline.
pub(super) fn render_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().fold(String::new(), |mut out, line| {
        out.push_str(line.as_ref());
        out.push('\n');
        out
    })
}

/// Write `content` to `path` unless it already holds exactly that content.
///
/// Returns whether the file was written.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or persisted.
pub(super) fn write_file(path: &Utf8Path, content: &str) -> Result<bool> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        debug!(path = %path, "file unchanged");
        return Ok(false);
    }
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {parent}"))?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {parent}"))?;
    {
        let handle = tmp.as_file_mut();
        handle
            .write_all(content.as_bytes())
            .with_context(|| format!("failed to write {path}"))?;
        handle
            .flush()
            .with_context(|| format!("failed to flush {path}"))?;
    }
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to persist {path}"))?;
    info!("Wrote {path}");
    Ok(true)
}

/// Open the nearest existing ancestor of `path` and return it with the
/// remaining relative path.
fn derive_dir_and_relative(path: &Utf8Path) -> Result<(Dir, Utf8PathBuf)> {
    if path.is_relative() {
        let dir = Dir::open_ambient_dir(".", ambient_authority())
            .context("failed to open the working directory")?;
        return Ok((dir, path.to_owned()));
    }
    let mut ancestors = path.ancestors();
    ancestors.next();
    let (base, dir) = ancestors
        .find_map(|candidate| {
            Dir::open_ambient_dir(candidate, ambient_authority())
                .ok()
                .map(|dir| (candidate.to_owned(), dir))
        })
        .ok_or_else(|| anyhow!("no existing ancestor directory for {path}"))?;
    let relative = path
        .strip_prefix(&base)
        .with_context(|| format!("failed to derive a relative path for {path}"))?
        .to_owned();
    Ok((dir, relative))
}

/// Create an empty file at `path`, with any missing parent directories.
/// Existing files are left untouched.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created.
pub(super) fn create_placeholder(path: &Utf8Path) -> Result<()> {
    let (dir, relative) = derive_dir_and_relative(path)?;
    if let Some(parent) = relative.parent().filter(|p| !p.as_str().is_empty()) {
        dir.create_dir_all(parent)
            .with_context(|| format!("failed to create placeholder directory for {path}"))?;
    }
    if dir.exists(&relative) {
        return Ok(());
    }
    dir.write(&relative, b"")
        .with_context(|| format!("failed to create placeholder {path}"))?;
    debug!(path = %path, "created placeholder");
    Ok(())
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

/// Write `content` to stdout. A closed pipe is not an error.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub(super) fn write_stdout(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(content.as_bytes()).and_then(|()| stdout.flush()) {
        Err(err) if !is_broken_pipe(&err) => Err(err).context("failed to write to stdout"),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use rstest::rstest;

    fn temp_root() -> Result<(tempfile::TempDir, Utf8PathBuf)> {
        let dir = tempfile::tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow!("non UTF-8 temp dir {}", path.display()))?;
        Ok((dir, root))
    }

    #[rstest]
    #[case(&[], "")]
    #[case(&["a"], "a\n")]
    #[case(&["a", "b"], "a\nb\n")]
    fn lines_end_with_newline(#[case] lines: &[&str], #[case] expected: &str) {
        assert_eq!(render_lines(lines), expected);
    }

    #[rstest]
    fn write_file_creates_parents_and_skips_unchanged() -> Result<()> {
        let (_guard, root) = temp_root()?;
        let path = root.join("nested/out/demo.MHeader");
        ensure!(write_file(&path, "%Target \"Exe_a\"\n")?, "first write");
        ensure!(fs::read_to_string(&path)? == "%Target \"Exe_a\"\n");
        ensure!(!write_file(&path, "%Target \"Exe_a\"\n")?, "unchanged rewrite");
        ensure!(write_file(&path, "changed\n")?, "changed rewrite");
        ensure!(fs::read_to_string(&path)? == "changed\n");
        Ok(())
    }

    #[rstest]
    fn placeholder_is_empty_and_preserves_existing_files() -> Result<()> {
        let (_guard, root) = temp_root()?;
        let fresh = root.join("gen/deep/missing.h");
        create_placeholder(&fresh)?;
        ensure!(fs::metadata(&fresh)?.len() == 0, "placeholder must be empty");

        let existing = root.join("kept.h");
        fs::write(&existing, "content")?;
        create_placeholder(&existing)?;
        ensure!(fs::read_to_string(&existing)? == "content");
        Ok(())
    }

    #[rstest]
    #[case("-", true)]
    #[case("out.txt", false)]
    fn dash_means_stdout(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_stdout_path(Path::new(path)), expected);
    }
}
