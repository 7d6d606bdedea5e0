//! Placement of files in the group hierarchy and their per-file settings.

use std::collections::BTreeSet;

use camino::Utf8Path;
use itertools::Itertools as _;

use super::collect::absolute;
use super::flags::parse_compile_flags;
use super::{Owner, ProjectEmitter, TranslateError};
use crate::ast::SourceFile;
use crate::config::GeneratorConfig;
use crate::outputs::looks_dynamic;
use crate::probe::PathProbe;
use crate::registry::{NodeId, kind};

/// A file path as shown in the group hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct DisplayPath {
    pub(super) text: String,
    /// The path was shortened by the first hide prefix.
    pub(super) protected: bool,
}

/// Apply prefix replacement, then prefix hiding, to `path`.
pub(super) fn display_path(config: &GeneratorConfig, path: &str) -> DisplayPath {
    let mut text = config
        .replace_prefixes
        .iter()
        .find_map(|(from, to)| path.strip_prefix(from.as_str()).map(|rest| format!("{to}{rest}")))
        .unwrap_or_else(|| path.to_owned());
    let mut protected = false;
    for (position, prefix) in config.hide_prefixes.iter().enumerate() {
        if let Some(rest) = text.strip_prefix(prefix.as_str()) {
            protected = position == 0;
            text = rest.strip_prefix('/').unwrap_or(rest).to_owned();
            break;
        }
    }
    DisplayPath { text, protected }
}

/// Length of the leading `@(...)` expression of `text`, if any.
fn expression_len(text: &str) -> Option<usize> {
    if !looks_dynamic(text) {
        return None;
    }
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    for (index, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if quoted => escaped = true,
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Directory segments of a display path. A leading expression is kept whole
/// even when it contains separators.
pub(super) fn directory_segments(display: &str) -> Vec<&str> {
    let directory = display.rsplit_once('/').map_or("", |(dir, _)| dir);
    let (head, rest) = match expression_len(directory) {
        Some(len) => directory.split_at(len),
        None => ("", directory),
    };
    std::iter::once(head)
        .chain(rest.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect()
}

impl<'a, P: PathProbe> ProjectEmitter<'_, 'a, P> {
    /// Create the group chain for `path` under `parent` and append its
    /// `%File` entry.
    fn add_file_in_group(&mut self, parent: NodeId, path: &Utf8Path) -> NodeId {
        let config = self.translator.config;
        let display = display_path(config, path.as_str());
        let mut at = parent;
        for (depth, segment) in directory_segments(&display.text).into_iter().enumerate() {
            at = self.registry.add_unique_child(at, kind::GROUP, segment);
            let group = self.registry.node_mut(at);
            group.raw_value = looks_dynamic(segment);
            if depth == 0 && display.protected {
                group.protected = true;
            }
        }
        let value = self.tracker.path_value(&self.project.name, path);
        self.registry.add_path_child(at, kind::FILE, &value)
    }

    fn file_compile_type(
        &self,
        owner: Owner<'_>,
        file: &SourceFile,
    ) -> Result<Option<&'a str>, TranslateError> {
        file.effective_language()
            .map(|language| self.translator.compile_type(owner, language))
            .transpose()
    }

    /// Add every file of `owner` beneath `target_node`.
    pub(super) fn add_files(
        &mut self,
        target_node: NodeId,
        owner: Owner<'_>,
    ) -> Result<(), TranslateError> {
        let source_dir = owner.target.source_dir(owner.project);
        for file in &owner.target.sources {
            if file.object_library.is_some() {
                continue;
            }
            let path = absolute(source_dir, &file.path);
            let compile_type = self.file_compile_type(owner, file)?;
            let node = self.add_file_in_group(target_node, &path);
            tracing::debug!(target_name = %owner.target.name, file = %path, "added file");

            if let Some(step) = &file.custom_step {
                self.add_custom_step(node, owner, &path, step, compile_type)?;
            } else if file.generated {
                self.registry.add_child(node, "Compile.AllowNonExisting", "true");
                if let Some(compile_type) = compile_type {
                    self.registry.add_child(node, "Compile.Type", compile_type);
                }
            } else {
                self.registry
                    .add_child(node, "Compile.Type", compile_type.unwrap_or("None"));
                let defines = self.file_defines(file);
                if !defines.is_empty() {
                    self.registry.add_child(
                        node,
                        "Compile.PreprocessorDefines",
                        format!("{};@(Compile.PreprocessorDefines)", defines.iter().join(";")),
                    );
                }
            }
        }
        Ok(())
    }

    fn file_defines(&self, file: &SourceFile) -> BTreeSet<String> {
        let from_flags = file
            .compile_flags
            .as_deref()
            .map(parse_compile_flags)
            .unwrap_or_default()
            .defines;
        file.compile_definitions
            .iter()
            .chain(file.definitions_for(self.translator.configuration))
            .chain(&from_flags)
            .map(|define| self.interpolated(define))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(hide: &[&str], replace: &[(&str, &str)]) -> GeneratorConfig {
        GeneratorConfig {
            hide_prefixes: hide.iter().map(|p| (*p).to_owned()).collect(),
            replace_prefixes: replace
                .iter()
                .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
                .collect(),
            ..GeneratorConfig::default()
        }
    }

    #[rstest]
    #[case(&[], &[], "/src/a/b.c", "/src/a/b.c", false)]
    #[case(&["/src"], &[], "/src/a/b.c", "a/b.c", true)]
    #[case(&["/other", "/src"], &[], "/src/a/b.c", "a/b.c", false)]
    #[case(&[], &[("/b/out", "@(Builtin.Generated)")], "/b/out/x/y.h", "@(Builtin.Generated)/x/y.h", false)]
    #[case(&["Gen"], &[("/b/out", "Gen")], "/b/out/y.h", "y.h", true)]
    fn display_paths(
        #[case] hide: &[&str],
        #[case] replace: &[(&str, &str)],
        #[case] path: &str,
        #[case] text: &str,
        #[case] protected: bool,
    ) {
        let shown = display_path(&config(hide, replace), path);
        assert_eq!(shown.text, text);
        assert_eq!(shown.protected, protected);
    }

    #[rstest]
    #[case("a/b/x.c", &["a", "b"])]
    #[case("/abs/x.c", &["abs"])]
    #[case("x.c", &[])]
    #[case("@(Builtin.Generated)/x/y.h", &["@(Builtin.Generated)", "x"])]
    #[case("@('/b/out'->MakeAbsolute())/y.h", &["@('/b/out'->MakeAbsolute())"])]
    fn segments(#[case] display: &str, #[case] expected: &[&str]) {
        assert_eq!(directory_segments(display), expected);
    }
}
