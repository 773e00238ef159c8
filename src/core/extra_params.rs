// src/core/extra_params.rs

//! The trailing `key=value` grammar shared by the compiler and the matcher.
//!
//! A value is a double-quoted string, a single-quoted string, a brace-delimited literal
//! (passed through untouched, e.g. JSON objects) or a bare run of non-whitespace.

use crate::models::Kwargs;
use lazy_static::lazy_static;
use regex::Regex;

/// Regex source for one value of the catch-all grammar.
pub const VALUE_PATTERN: &str = r#""[\s\S]*?"|'[\s\S]*?'|\{[\s\S]*?\}|\S+"#;

/// Regex source for the whole catch-all segment. It is a single capturing group.
pub const EXTRA_SEGMENT: &str =
    r#"((?:\s+[^\s=]+=(?:"[\s\S]*?"|'[\s\S]*?'|\{[\s\S]*?\}|\S+))*)"#;

lazy_static! {
    static ref PAIR_RE: Regex = Regex::new(
        r#"(?P<key>[^\s=]+)=(?P<value>"[\s\S]*?"|'[\s\S]*?'|\{[\s\S]*?\}|\S+)"#
    )
    .unwrap();
}

/// Strips one pair of matching surrounding quotes, if present.
pub fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Parses the text captured by the catch-all segment into `key -> value` pairs.
/// Later pairs override earlier ones with the same key.
pub fn parse_extra_params(segment: &str) -> Kwargs {
    let mut kwargs = Kwargs::new();
    for caps in PAIR_RE.captures_iter(segment) {
        if let (Some(key), Some(value)) = (caps.name("key"), caps.name("value")) {
            kwargs.insert(
                key.as_str().to_string(),
                Some(unquote(value.as_str()).to_string()),
            );
        }
    }
    kwargs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"hello world\""), "hello world");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("\"mismatched'"), "\"mismatched'");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn test_parse_all_value_kinds() {
        let kwargs = parse_extra_params(
            r#" timeout=30 msg="rolling restart" who='ops team' opts={"force": true}"#,
        );
        assert_eq!(kwargs.len(), 4);
        assert_eq!(kwargs["timeout"].as_deref(), Some("30"));
        assert_eq!(kwargs["msg"].as_deref(), Some("rolling restart"));
        assert_eq!(kwargs["who"].as_deref(), Some("ops team"));
        assert_eq!(kwargs["opts"].as_deref(), Some(r#"{"force": true}"#));
    }

    #[test]
    fn test_quoted_value_may_contain_equals() {
        let kwargs = parse_extra_params(r#" filter="a=b c=d""#);
        assert_eq!(kwargs.len(), 1);
        assert_eq!(kwargs["filter"].as_deref(), Some("a=b c=d"));
    }

    #[test]
    fn test_last_pair_wins() {
        let kwargs = parse_extra_params(" n=1 n=2");
        assert_eq!(kwargs["n"].as_deref(), Some("2"));
    }

    #[test]
    fn test_segment_regex_accepts_only_pairs() {
        let re = Regex::new(&format!("^{}$", EXTRA_SEGMENT)).unwrap();
        assert!(re.is_match(""));
        assert!(re.is_match(" a=1 b=\"two words\""));
        assert!(!re.is_match(" now"));
        assert!(!re.is_match("a=1"));
    }
}
