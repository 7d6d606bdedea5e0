//! Extraction of settings embedded in raw compiler flags.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `-D`, `-I`, `-O`, `-U`, `-W`, `-f`, `-g` and `-s` style flags,
/// with an optional `=value` or `="quoted value"` suffix.
static FLAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "the pattern is a compile-time literal")]
    Regex::new(r#"(^|[ ])-[DIOUWfgs][^= ]+(="[^"]+"|=[^"][^ ]+)?"#)
        .expect("flag pattern is valid")
});

/// Settings recovered from a flag string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedFlags {
    /// Definitions from `-D` flags, without the prefix.
    pub defines: Vec<String>,
    /// Directories from `-I` flags.
    pub includes: Vec<String>,
    /// The last `-std=` value.
    pub language_standard: Option<String>,
}

/// Scan `flags` for definitions, include directories and the language
/// standard. Other flags are ignored.
#[must_use]
pub fn parse_compile_flags(flags: &str) -> ParsedFlags {
    let mut parsed = ParsedFlags::default();
    for found in FLAG_PATTERN.find_iter(flags) {
        let flag = found.as_str().trim_start_matches(' ');
        if let Some(define) = flag.strip_prefix("-D") {
            parsed.defines.push(define.to_owned());
        } else if let Some(standard) = flag.strip_prefix("-std=") {
            parsed.language_standard = Some(standard.to_owned());
        } else if let Some(dir) = flag.strip_prefix("-I") {
            parsed.includes.push(dir.to_owned());
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", &[], &[], None)]
    #[case("-DFOO -DBAR=10", &["FOO", "BAR=10"], &[], None)]
    #[case("-DSHORT=1", &["SHORT"], &[], None)]
    #[case("-O2 -Wall -std=c11 -g", &[], &[], Some("c11"))]
    #[case("-I/opt/inc -DX", &["X"], &["/opt/inc"], None)]
    #[case("-DMSG=\"hello world\" -DY", &["MSG=\"hello world\"", "Y"], &[], None)]
    #[case("-std=c99 -std=gnu11", &[], &[], Some("gnu11"))]
    #[case("--define=X -D", &[], &[], None)]
    fn flags_are_classified(
        #[case] flags: &str,
        #[case] defines: &[&str],
        #[case] includes: &[&str],
        #[case] standard: Option<&str>,
    ) {
        let parsed = parse_compile_flags(flags);
        assert_eq!(parsed.defines, defines);
        assert_eq!(parsed.includes, includes);
        assert_eq!(parsed.language_standard.as_deref(), standard);
    }
}
