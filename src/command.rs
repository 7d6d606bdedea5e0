//! Transcription of custom-step command lines.
//!
//! A custom step's argument vectors are flattened into the single string
//! stored as `Custom_CommandLine`. Every argument is processed on its own:
//! `@` is doubled first, arguments that name a file under the project's
//! source root, the target's binary directory or a tracked output become
//! late-bound path expressions, and anything else has embedded tracked
//! outputs rewritten and is quoted only when it contains whitespace.

use std::borrow::Cow;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::escape::escape_token;
use crate::outputs::{OutputTracker, PathValue, escape_expression_marker};

/// Separator placed between joined command lines.
pub const LINE_SEPARATOR: &str = " && ";

/// A step carried more command lines than the host accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("custom step declares {count} command lines; only one is supported")]
pub struct MultipleCommandLines {
    /// Number of command lines declared.
    pub count: usize,
}

/// Paths an argument is compared against while transcribing.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// Project whose outputs are consulted.
    pub project: &'a str,
    /// The project's source root.
    pub source_root: &'a Utf8Path,
    /// The owning target's binary directory.
    pub binary_dir: &'a Utf8Path,
    /// Directory the step runs in, used for relative output lookups.
    pub working_dir: &'a Utf8Path,
    /// Outputs known for the project.
    pub tracker: &'a OutputTracker,
}

impl CommandContext<'_> {
    fn rooted_path(&self, arg: &str) -> Option<Utf8PathBuf> {
        let path = Utf8Path::new(arg);
        let rooted = path.starts_with(self.source_root) || path.starts_with(self.binary_dir);
        if path.is_absolute() && rooted {
            return Some(path.to_path_buf());
        }
        self.tracker
            .resolve_argument(self.project, self.working_dir, arg)
    }

    /// Transcribe one argument.
    #[must_use]
    pub fn argument<'s>(&self, arg: &'s str) -> Cow<'s, str> {
        let marked = escape_expression_marker(arg);
        if let Some(path) = self.rooted_path(&marked) {
            return Cow::Owned(PathValue::dynamic(path.into_string()).into_rendered());
        }
        let changed = match self.tracker.rewrite_embedded(self.project, &marked) {
            Cow::Owned(text) => Some(text),
            Cow::Borrowed(_) => None,
        };
        let rewritten = changed.map_or(marked, Cow::Owned);
        if rewritten.chars().any(char::is_whitespace) {
            Cow::Owned(escape_token(&rewritten, false).into_owned())
        } else {
            rewritten
        }
    }

    /// Transcribe an argument vector into one space separated line.
    #[must_use]
    pub fn line<S: AsRef<str>>(&self, args: &[S]) -> String {
        args.iter()
            .map(|arg| self.argument(arg.as_ref()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Transcribe all command lines of a step.
    ///
    /// `launcher` is prepended to the first line. Returns `Ok(None)` when the
    /// step has no command lines.
    ///
    /// # Errors
    ///
    /// Returns [`MultipleCommandLines`] when more than one line is present
    /// and `join` is `false`.
    pub fn transcribe(
        &self,
        lines: &[Vec<String>],
        launcher: Option<&[String]>,
        join: bool,
    ) -> Result<Option<String>, MultipleCommandLines> {
        if lines.len() > 1 && !join {
            return Err(MultipleCommandLines { count: lines.len() });
        }
        let mut rendered = Vec::with_capacity(lines.len());
        for (index, args) in lines.iter().enumerate() {
            let line = self.line(args);
            match launcher {
                Some(prefix) if index == 0 && !prefix.is_empty() => {
                    let launch = self.line(prefix);
                    if line.is_empty() {
                        rendered.push(launch);
                    } else {
                        rendered.push(format!("{launch} {line}"));
                    }
                }
                _ => rendered.push(line),
            }
        }
        if rendered.is_empty() {
            return Ok(None);
        }
        Ok(Some(rendered.join(LINE_SEPARATOR)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tracker() -> OutputTracker {
        let mut tracker = OutputTracker::new(Some(Utf8PathBuf::from("/b/out")));
        tracker.register_output("p", "/b/out/gen.h");
        tracker
    }

    fn context(tracker: &OutputTracker) -> CommandContext<'_> {
        CommandContext {
            project: "p",
            source_root: Utf8Path::new("/src"),
            binary_dir: Utf8Path::new("/b/tgt"),
            working_dir: Utf8Path::new("/b/out"),
            tracker,
        }
    }

    fn lines(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|line| line.iter().map(|arg| (*arg).to_owned()).collect())
            .collect()
    }

    #[rstest]
    #[case("gcc", "gcc")]
    #[case("-c", "-c")]
    #[case("user@host", "user@@host")]
    #[case("/src/main.c", "@('/src/main.c'->MakeAbsolute())")]
    #[case("/src/a@b.c", "@('/src/a@@b.c'->MakeAbsolute())")]
    #[case("/b/tgt/obj.o", "@('/b/tgt/obj.o'->MakeAbsolute())")]
    #[case("/b/out/gen.h", "@('/b/out/gen.h'->MakeAbsolute())")]
    #[case("gen.h", "@('/b/out/gen.h'->MakeAbsolute())")]
    #[case("/srcfoo/x.c", "/srcfoo/x.c")]
    #[case("-I/b/out/gen.h", "-I@('/b/out/gen.h'->MakeAbsolute())")]
    #[case("a b", "\"a b\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    fn arguments_are_transcribed(tracker: OutputTracker, #[case] arg: &str, #[case] expected: &str) {
        assert_eq!(context(&tracker).argument(arg), expected);
    }

    #[rstest]
    fn single_line_is_space_joined(tracker: OutputTracker) {
        let ctx = context(&tracker);
        let out = ctx
            .transcribe(&lines(&[&["cp", "/src/in.txt", "gen.h"]]), None, false)
            .expect("one line");
        assert_eq!(
            out.as_deref(),
            Some("cp @('/src/in.txt'->MakeAbsolute()) @('/b/out/gen.h'->MakeAbsolute())")
        );
    }

    #[rstest]
    fn multiple_lines_are_rejected_unless_joined(tracker: OutputTracker) {
        let ctx = context(&tracker);
        let two = lines(&[&["a"], &["b"]]);
        assert_eq!(
            ctx.transcribe(&two, None, false),
            Err(MultipleCommandLines { count: 2 })
        );
        assert_eq!(
            ctx.transcribe(&two, None, true).expect("joined").as_deref(),
            Some("a && b")
        );
    }

    #[rstest]
    fn launcher_prefixes_first_line_only(tracker: OutputTracker) {
        let ctx = context(&tracker);
        let launcher = vec!["/src/tools/wrap".to_owned(), "--quiet".to_owned()];
        let out = ctx
            .transcribe(&lines(&[&["a"], &["b"]]), Some(launcher.as_slice()), true)
            .expect("joined");
        assert_eq!(
            out.as_deref(),
            Some("@('/src/tools/wrap'->MakeAbsolute()) --quiet a && b")
        );
    }

    #[rstest]
    fn no_lines_produce_nothing(tracker: OutputTracker) {
        let ctx = context(&tracker);
        assert_eq!(ctx.transcribe(&[], None, false), Ok(None));
    }
}
