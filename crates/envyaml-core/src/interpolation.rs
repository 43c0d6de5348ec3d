//! Placeholder scanning and substitution
//!
//! A placeholder is `{NAME}` where `NAME` is one or more ASCII letters,
//! digits or underscores. Anything else that looks brace-like (`{}`,
//! `{A-B}`, an unclosed `{OPEN`) is plain text.
//!
//! Substitution is a single pass over the matches found in the original
//! string: each resolved placeholder replaces every occurrence of its exact
//! text in the working string. The match list is never recomputed, so a
//! placeholder spelled out by a resolved value is not expanded on its own.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

/// A placeholder occurrence inside a string scalar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Placeholder name without braces
    pub name: String,
    /// Byte range of `{NAME}` in the scanned string
    pub span: Range<usize>,
}

impl Token {
    /// The literal text of the placeholder, braces included
    pub fn literal(&self) -> String {
        format!("{{{}}}", self.name)
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, cannot fail to compile
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap())
}

/// Find every placeholder in `input`, left to right, non-overlapping
pub fn find_tokens(input: &str) -> Vec<Token> {
    token_pattern()
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(Token {
                name: name.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Check if a string contains at least one placeholder
pub fn contains_placeholder(input: &str) -> bool {
    token_pattern().is_match(input)
}

/// Substitute every placeholder in `input` using `lookup`
///
/// `lookup` is called once per match, in scan order. The first failure
/// aborts the substitution and is returned as-is; no partially
/// substituted string escapes.
pub fn substitute<F>(input: &str, mut lookup: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let tokens = find_tokens(input);
    let mut output = input.to_string();

    for token in &tokens {
        let value = lookup(&token.name)?;
        output = output.replace(&token.literal(), &value);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn lookup_from<'a>(
        pairs: &'a [(&'a str, &'a str)],
    ) -> impl FnMut(&str) -> Result<String> + 'a {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
                .ok_or_else(|| Error::env_not_found(name))
        }
    }

    #[test]
    fn test_find_single_token() {
        let tokens = find_tokens("http://{HOST}:9090");
        assert_eq!(
            tokens,
            vec![Token {
                name: "HOST".into(),
                span: 7..13,
            }]
        );
        assert_eq!(tokens[0].literal(), "{HOST}");
    }

    #[test]
    fn test_find_repeated_and_distinct_tokens() {
        let names: Vec<_> = find_tokens("{A}-{B_2}-{A}")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["A", "B_2", "A"]);
    }

    #[test]
    fn test_malformed_tokens_ignored() {
        assert!(find_tokens("{}").is_empty());
        assert!(find_tokens("{A-B}").is_empty());
        assert!(find_tokens("{OPEN").is_empty());
        assert!(find_tokens("CLOSE}").is_empty());
        assert!(find_tokens("${env:VAR}").is_empty());
        assert!(!contains_placeholder("{not a token}"));
    }

    #[test]
    fn test_nested_braces_match_inner() {
        let tokens = find_tokens("{{INNER}}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "INNER");
        assert_eq!(
            substitute("{{INNER}}", lookup_from(&[("INNER", "v")])).unwrap(),
            "{v}"
        );
    }

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let result = substitute("{FOO}-{FOO}", lookup_from(&[("FOO", "x")])).unwrap();
        assert_eq!(result, "x-x");
    }

    #[test]
    fn test_substitute_queries_once_per_match() {
        let mut calls = Vec::new();
        let result = substitute("{A}/{B}/{A}", |name| {
            calls.push(name.to_string());
            Ok(name.to_lowercase())
        })
        .unwrap();

        assert_eq!(result, "a/b/a");
        assert_eq!(calls, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_substitute_does_not_rescan_inserted_text() {
        let result = substitute(
            "{OUTER}",
            lookup_from(&[("OUTER", "{INNER}"), ("INNER", "never")]),
        )
        .unwrap();
        assert_eq!(result, "{INNER}");
    }

    #[test]
    fn test_substitute_inserted_text_can_match_later_literal() {
        // Replacement is textual over the working string: a value that
        // spells a later placeholder is replaced along with it.
        let result = substitute("{A} {B}", lookup_from(&[("A", "{B}"), ("B", "b")])).unwrap();
        assert_eq!(result, "b b");
    }

    #[test]
    fn test_substitute_fails_fast() {
        let mut seen = Vec::new();
        let err = substitute("{OK} {MISSING} {LATER}", |name| {
            seen.push(name.to_string());
            if name == "MISSING" {
                Err(Error::env_not_found(name))
            } else {
                Ok("v".into())
            }
        })
        .unwrap_err();

        assert_eq!(err.token(), Some("MISSING"));
        assert_eq!(seen, vec!["OK", "MISSING"]);
    }

    #[test]
    fn test_substitute_no_tokens() {
        let result = substitute("plain text", |_| unreachable!()).unwrap();
        assert_eq!(result, "plain text");
    }
}
