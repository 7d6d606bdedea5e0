//! In-memory [`PathProbe`] for translation tests.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use mheader::probe::PathProbe;

/// Probe answering from a fixed set of existing paths.
#[derive(Debug, Default, Clone)]
pub struct SetProbe {
    existing: HashSet<Utf8PathBuf>,
}

impl SetProbe {
    /// A probe for which every path in `paths` exists.
    #[must_use]
    pub fn with<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self {
            existing: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl PathProbe for SetProbe {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.existing.contains(path)
    }
}
