//! Property-based tests for the escaping engine and the description tree.

use camino::Utf8Path;
use mheader::escape::{escape_token, needs_quoting};
use mheader::outputs::{OutputTracker, PathValue};
use mheader::registry::Registry;
use proptest::prelude::*;

/// Reverse the quoting applied by `escape_token`.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        out.push(match chars.next()? {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            other => other,
        });
    }
    Some(out)
}

/// Tokens built only from the bare alphabet.
fn bare_token() -> impl Strategy<Value = String> {
    "[0-9A-Za-z._%&|!+-]{1,24}"
}

proptest! {
    #[test]
    fn bare_tokens_are_untouched(token in bare_token()) {
        prop_assert!(!needs_quoting(&token));
        let escaped = escape_token(&token, false);
        prop_assert_eq!(escaped.as_ref(), token.as_str());
    }

    #[test]
    fn quoting_round_trips(text in any::<String>()) {
        prop_assume!(text != "true" && text != "false");
        let quoted = escape_token(&text, true);
        prop_assert_eq!(unquote(&quoted), Some(text));
    }

    #[test]
    fn quoted_output_is_single_line(text in any::<String>()) {
        let quoted = escape_token(&text, true);
        prop_assert!(!quoted.contains('\n'));
    }

    #[test]
    fn dynamic_conversion_is_idempotent(path in "/[a-z]{1,8}(/[a-z.']{1,8}){0,3}") {
        let once = PathValue::literal(path.clone()).into_dynamic();
        let twice = once.clone().into_dynamic();
        prop_assert_eq!(once.render(), twice.render());
    }

    #[test]
    fn embedded_rewriting_is_idempotent(prefix in "[a-z -]{0,8}", suffix in "[a-z -]{0,8}") {
        let mut tracker = OutputTracker::new(Some("/out".into()));
        tracker.register_output("p", "/out/gen.h");
        let text = format!("{prefix}/out/gen.h{suffix}");
        let once = tracker.rewrite_embedded("p", &text).into_owned();
        let twice = tracker.rewrite_embedded("p", &once).into_owned();
        prop_assert!(once.contains("@('/out/gen.h'->MakeAbsolute())"));
        prop_assert_eq!(once, twice);
        prop_assert!(!tracker.is_tracked("p", Utf8Path::new("/out/other.h")));
    }

    #[test]
    fn unique_children_are_shared(key in bare_token(), first in bare_token(), second in bare_token()) {
        let mut registry = Registry::new();
        let root = registry.root();
        let a = registry.add_unique_child(root, key.as_str(), first.as_str());
        let b = registry.add_unique_child(root, key.as_str(), first.as_str());
        prop_assert_eq!(a, b);
        let c = registry.add_unique_child(root, key.as_str(), second.as_str());
        prop_assert_eq!(a == c, first == second);
    }
}
