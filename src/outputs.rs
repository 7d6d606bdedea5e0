//! Tracking of files produced beneath the transient output directory.
//!
//! Files generated by custom build steps do not exist when the description is
//! written, and the directory they land in is only materialised by the
//! consuming tool. References to them are therefore emitted as late-bound
//! expressions that the tool resolves at evaluation time. The tracker is
//! filled for a whole project before any target of that project is emitted,
//! so a reference to an output of a target that has not been visited yet is
//! still recognised.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use mheader::outputs::{OutputTracker, PathValue};
//!
//! let mut tracker = OutputTracker::new(Some("/build/out".into()));
//! tracker.register_output("demo", "/build/out/gen.h");
//! let value = tracker.path_value("demo", Utf8Path::new("/build/out/gen.h"));
//! assert!(value.is_dynamic());
//! assert_eq!(value.render(), "@('/build/out/gen.h'->MakeAbsolute())");
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Opening of every dynamic path expression.
const PATH_EXPRESSION_OPEN: &str = "@('";
/// Closing of every dynamic path expression.
const PATH_EXPRESSION_CLOSE: &str = "'->MakeAbsolute())";
/// Marker that introduces an expression evaluated by the consuming tool.
const EXPRESSION_OPEN: &str = "@(";

/// A path as it should appear in the description.
///
/// A `Dynamic` path is resolved to an absolute path by the consuming tool and
/// is emitted without quoting; a `Literal` path is an ordinary string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathValue {
    /// Emitted as a quoted string.
    Literal(String),
    /// Emitted as a late-bound absolute-path expression.
    Dynamic(String),
}

impl PathValue {
    /// Wrap `path` as a literal.
    #[must_use]
    pub fn literal(path: impl Into<String>) -> Self {
        Self::Literal(path.into())
    }

    /// Wrap `path` as a late-bound value.
    #[must_use]
    pub fn dynamic(path: impl Into<String>) -> Self {
        Self::literal(path).into_dynamic()
    }

    /// Convert to the late-bound form. Already dynamic values are returned
    /// unchanged.
    #[must_use]
    pub fn into_dynamic(self) -> Self {
        match self {
            Self::Literal(path) => Self::Dynamic(path),
            dynamic @ Self::Dynamic(_) => dynamic,
        }
    }

    /// Returns `true` for late-bound values.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// The underlying path text.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Literal(path) | Self::Dynamic(path) => path,
        }
    }

    /// Text written to the description for this value.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Literal(path) => Cow::Borrowed(path),
            Self::Dynamic(path) => Cow::Owned(dynamic_expression(path)),
        }
    }

    /// Consume the value, returning the text written to the description.
    #[must_use]
    pub fn into_rendered(self) -> String {
        match self {
            Self::Literal(path) => path,
            Self::Dynamic(path) => dynamic_expression(&path),
        }
    }
}

/// Build the expression that resolves `path` to an absolute path when the
/// description is evaluated.
#[must_use]
fn dynamic_expression(path: &str) -> String {
    let mut out = String::with_capacity(
        path.len() + PATH_EXPRESSION_OPEN.len() + PATH_EXPRESSION_CLOSE.len(),
    );
    out.push_str(PATH_EXPRESSION_OPEN);
    for ch in path.chars() {
        if matches!(ch, '\\' | '\'') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push_str(PATH_EXPRESSION_CLOSE);
    out
}

/// Returns `true` when `text` starts with an expression evaluated by the
/// consuming tool, for example a prefix replacement such as
/// `@(Builtin.GeneratedDirectory)`.
#[must_use]
pub fn looks_dynamic(text: &str) -> bool {
    text.starts_with(EXPRESSION_OPEN)
}

/// Double every `@` so the consuming tool reads it literally.
#[must_use]
pub fn escape_expression_marker(text: &str) -> Cow<'_, str> {
    if text.contains('@') {
        Cow::Owned(text.replace('@', "@@"))
    } else {
        Cow::Borrowed(text)
    }
}

#[derive(Debug, Default)]
struct ProjectOutputs {
    files: BTreeSet<Utf8PathBuf>,
    directories: BTreeSet<Utf8PathBuf>,
    matcher: OnceCell<Option<Regex>>,
}

/// Per-project registry of declared outputs.
#[derive(Debug, Default)]
pub struct OutputTracker {
    transient_root: Option<Utf8PathBuf>,
    projects: HashMap<String, ProjectOutputs>,
}

impl OutputTracker {
    /// Create a tracker for outputs beneath `transient_root`. Without a root
    /// no path is ever considered tracked.
    #[must_use]
    pub fn new(transient_root: Option<Utf8PathBuf>) -> Self {
        Self {
            transient_root,
            projects: HashMap::new(),
        }
    }

    /// The configured transient output root.
    #[must_use]
    pub fn transient_root(&self) -> Option<&Utf8Path> {
        self.transient_root.as_deref()
    }

    fn project_mut(&mut self, project: &str) -> &mut ProjectOutputs {
        let entry = self.projects.entry(project.to_owned()).or_default();
        entry.matcher = OnceCell::new();
        entry
    }

    /// Record `path` as produced by `project`, along with its directory.
    pub fn register_output(&mut self, project: &str, path: impl Into<Utf8PathBuf>) {
        let path = path.into();
        let outputs = self.project_mut(project);
        if let Some(parent) = path.parent() {
            outputs.directories.insert(parent.to_path_buf());
        }
        outputs.files.insert(path);
    }

    /// Record a directory created as a side effect of a build step.
    pub fn register_directory(&mut self, project: &str, dir: impl Into<Utf8PathBuf>) {
        self.project_mut(project).directories.insert(dir.into());
    }

    fn is_under_root(&self, path: &Utf8Path) -> bool {
        self.transient_root
            .as_deref()
            .is_some_and(|root| path.starts_with(root))
    }

    /// Returns `true` when `path` lies beneath the transient root and was
    /// registered for `project`. Unregistered paths under the root are not
    /// tracked.
    #[must_use]
    pub fn is_tracked(&self, project: &str, path: &Utf8Path) -> bool {
        self.is_under_root(path)
            && self
                .projects
                .get(project)
                .is_some_and(|outputs| outputs.files.contains(path))
    }

    /// Returns `true` when `dir` lies beneath the transient root and is a
    /// registered output directory of `project`.
    #[must_use]
    pub fn is_tracked_directory(&self, project: &str, dir: &Utf8Path) -> bool {
        self.is_under_root(dir)
            && self
                .projects
                .get(project)
                .is_some_and(|outputs| outputs.directories.contains(dir))
    }

    /// Look up a command argument as a tracked output, first as written and
    /// then relative to `working_dir`.
    #[must_use]
    pub fn resolve_argument(
        &self,
        project: &str,
        working_dir: &Utf8Path,
        arg: &str,
    ) -> Option<Utf8PathBuf> {
        let direct = Utf8Path::new(arg);
        if self.is_tracked(project, direct) {
            return Some(direct.to_path_buf());
        }
        let joined = Utf8PathBuf::from(format!("{working_dir}/{arg}"));
        self.is_tracked(project, &joined).then_some(joined)
    }

    /// The description value for `path`: dynamic when tracked.
    #[must_use]
    pub fn path_value(&self, project: &str, path: &Utf8Path) -> PathValue {
        let value = PathValue::literal(path.as_str());
        if self.is_tracked(project, path) {
            value.into_dynamic()
        } else {
            value
        }
    }

    /// The description value for a directory: dynamic when it is an output
    /// directory of `project`.
    #[must_use]
    pub fn directory_value(&self, project: &str, dir: &Utf8Path) -> PathValue {
        let value = PathValue::literal(dir.as_str());
        if self.is_tracked_directory(project, dir) {
            value.into_dynamic()
        } else {
            value
        }
    }

    fn matcher(&self, project: &str) -> Option<&Regex> {
        let outputs = self.projects.get(project)?;
        outputs
            .matcher
            .get_or_init(|| {
                let mut tracked: Vec<&str> = outputs
                    .files
                    .iter()
                    .filter(|path| self.is_under_root(path))
                    .map(|path| path.as_str())
                    .collect();
                if tracked.is_empty() {
                    return None;
                }
                // Longest first so alternation prefers the most specific path.
                tracked.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
                let pattern = tracked
                    .iter()
                    .map(|path| regex::escape(path))
                    .collect::<Vec<_>>()
                    .join("|");
                match Regex::new(&pattern) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        warn!(project, error = %err, "cannot match tracked outputs in text");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Replace every tracked output of `project` embedded in `text` with its
    /// dynamic expression. Occurrences already inside an expression are left
    /// alone, so rewriting is idempotent.
    #[must_use]
    pub fn rewrite_embedded<'a>(&self, project: &str, text: &'a str) -> Cow<'a, str> {
        let Some(matcher) = self.matcher(project) else {
            return Cow::Borrowed(text);
        };
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut changed = false;
        for found in matcher.find_iter(text) {
            out.push_str(text.get(last..found.start()).unwrap_or_default());
            let wrapped = text
                .get(..found.start())
                .is_some_and(|head| head.ends_with(PATH_EXPRESSION_OPEN));
            if wrapped {
                out.push_str(found.as_str());
            } else {
                out.push_str(&dynamic_expression(found.as_str()));
                changed = true;
            }
            last = found.end();
        }
        if !changed {
            return Cow::Borrowed(text);
        }
        out.push_str(text.get(last..).unwrap_or_default());
        Cow::Owned(out)
    }

    /// Every output declared by `project`, sorted.
    #[must_use]
    pub fn declared_outputs(&self, project: &str) -> Vec<Utf8PathBuf> {
        self.projects
            .get(project)
            .map(|outputs| outputs.files.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every tracked output across all projects, sorted and de-duplicated.
    #[must_use]
    pub fn tracked_outputs(&self) -> Vec<Utf8PathBuf> {
        self.projects
            .values()
            .flat_map(|outputs| outputs.files.iter())
            .filter(|path| self.is_under_root(path))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
