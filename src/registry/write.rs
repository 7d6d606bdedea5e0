//! Serialisation of a [`Registry`] into the description grammar.
//!
//! Nodes are written depth first in insertion order, one entry per line,
//! with children wrapped in braces and indented one tab per level.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter, Write as _};
use std::io;

use super::{NodeId, Registry};
use crate::escape::{continuation_indent, escape_multiline, escape_token};

impl Registry {
    fn write_node(&self, f: &mut Formatter<'_>, id: NodeId, indent: &str) -> fmt::Result {
        let node = self.node(id);
        let key = if node.raw_key {
            Cow::Borrowed(node.key())
        } else {
            escape_token(node.key(), false)
        };

        if !node.value().is_empty() || node.children.is_empty() {
            let prefix = format!("{indent}{key} ");
            f.write_str(&prefix)?;
            if node.raw_value {
                f.write_str(node.value())?;
            } else {
                let continuation = continuation_indent(&prefix);
                f.write_str(&escape_multiline(node.value(), true, &continuation))?;
            }
        } else {
            write!(f, "{indent}{key}")?;
        }
        f.write_char('\n')?;

        if node.children.is_empty() {
            return Ok(());
        }
        writeln!(f, "{indent}{{")?;
        let nested = format!("{indent}\t");
        for child in node.children() {
            self.write_node(f, child, &nested)?;
        }
        writeln!(f, "{indent}}}")
    }

    /// Write the description to `out` in a single pass.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by `out`.
    pub fn write_to(&self, out: &mut impl io::Write) -> io::Result<()> {
        write!(out, "{self}")
    }
}

impl Display for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for child in self.node(self.root()).children() {
            self.write_node(f, child, "")?;
        }
        Ok(())
    }
}
