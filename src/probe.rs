//! Filesystem queries made during translation.
//!
//! The translator only ever asks whether a path exists. Routing that question
//! through [`PathProbe`] keeps translation free of direct disk access.

use camino::{Utf8Path, Utf8PathBuf};

/// Answers existence queries for paths named by the build graph.
pub trait PathProbe {
    /// Returns `true` when `path` exists.
    fn exists(&self, path: &Utf8Path) -> bool;
}

/// Probe backed by the real filesystem.
///
/// Relative paths resolve against the base directory when one is set and
/// against the process working directory otherwise.
#[derive(Debug, Default, Clone)]
pub struct DiskProbe {
    base: Option<Utf8PathBuf>,
}

impl DiskProbe {
    /// Resolve relative paths against `base`.
    #[must_use]
    pub fn rooted_at(base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl PathProbe for DiskProbe {
    fn exists(&self, path: &Utf8Path) -> bool {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path).exists(),
            _ => path.exists(),
        }
    }
}

impl<P: PathProbe + ?Sized> PathProbe for &P {
    fn exists(&self, path: &Utf8Path) -> bool {
        (**self).exists(path)
    }
}
