//! # Compiler
//!
//! Turns one alias representation such as `deploy {{app}} to {{env=staging}}` into an
//! anchored, case-insensitive matcher plus the map of declared arguments and defaults.
//!
//! The compilation is a pure text-generation step: the representation is tokenized into
//! literal text and `{{ ... }}` placeholders, each placeholder becomes a named capture
//! group, and a trailing catch-all segment accepts undeclared `key=value` pairs. No
//! network or registry state is involved, so every rule here is testable in isolation.

use crate::{
    constants::ST2_KEYWORD,
    core::extra_params::{EXTRA_SEGMENT, VALUE_PATTERN},
    models::{CompiledPattern, Kwargs},
};
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

lazy_static! {
    // Captures the raw inner text of a `{{ ... }}` placeholder, newlines included.
    static ref TOKEN_RE: Regex = Regex::new(r"\{\{([\s\S]*?)\}\}").unwrap();
    static ref ARG_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref QUANTIFIER_RE: Regex = Regex::new(r"^\{\d+(?:,\d*)?\}").unwrap();
}

/// Capture used by placeholders that are followed by more template text.
const INTERIOR_CAPTURE: &str = r"[\s\S]+?";

/// Represents the ways a representation can fail to compile.
#[derive(Error, Debug)]
pub enum PatternCompilationError {
    #[error("Unbalanced placeholder delimiters in '{0}'")]
    UnbalancedDelimiters(String),
    #[error("Invalid argument name '{name}' in '{representation}'")]
    InvalidArgumentName { name: String, representation: String },
    #[error("Argument '{name}' is declared more than once in '{representation}'")]
    DuplicateArgument { name: String, representation: String },
    #[error("Representation '{representation}' does not form a valid pattern: {source}")]
    InvalidRegex {
        representation: String,
        #[source]
        source: regex::Error,
    },
}

/// One piece of a tokenized representation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder {
        name: String,
        default: Option<String>,
    },
}

/// Builds the literal lead-in every alias command starts with, e.g. `!st2 `.
pub fn command_prefix(bot_prefix: &str) -> String {
    format!("{}{} ", bot_prefix, ST2_KEYWORD)
}

/// Compiles a representation into a `CompiledPattern` tagged with `action_ref`.
///
/// # Arguments
///
/// * `prefix` - The full command lead-in (see [`command_prefix`]). It is matched literally.
/// * `representation` - The templated alias text.
/// * `action_ref` - The action this pattern resolves to.
pub fn compile_representation(
    prefix: &str,
    representation: &str,
    action_ref: &str,
) -> Result<CompiledPattern, PatternCompilationError> {
    let template = representation.trim_end();
    let segments = tokenize(template)?;

    let mut defaults = Kwargs::new();
    for segment in &segments {
        if let Segment::Placeholder { name, default } = segment {
            if defaults.insert(name.clone(), default.clone()).is_some() {
                return Err(PatternCompilationError::DuplicateArgument {
                    name: name.clone(),
                    representation: representation.to_string(),
                });
            }
        }
    }

    let body = render_body(&segments);

    let source = format!(r"^{}{}{}\s*$", regex::escape(prefix), body, EXTRA_SEGMENT);
    log::trace!("Compiled '{}' into /{}/", representation, source);

    let matcher = RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|e| PatternCompilationError::InvalidRegex {
            representation: representation.to_string(),
            source: e,
        })?;

    // The catch-all segment is appended last, so it always owns the highest group index.
    let extra_group = matcher.captures_len() - 1;

    Ok(CompiledPattern {
        matcher,
        defaults,
        action_ref: action_ref.to_string(),
        representation: representation.to_string(),
        prefix_len: prefix.chars().count(),
        extra_group,
    })
}

/// Splits a representation into literal text and placeholders, in order of appearance.
fn tokenize(template: &str) -> Result<Vec<Segment<'_>>, PatternCompilationError> {
    let mut segments = Vec::new();
    let mut last_index = 0;

    for caps in TOKEN_RE.captures_iter(template) {
        let (Some(full_match), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let literal = template.get(last_index..full_match.start()).unwrap_or("");
        push_literal(&mut segments, literal, template)?;
        segments.push(parse_placeholder(inner.as_str(), template)?);
        last_index = full_match.end();
    }
    push_literal(&mut segments, template.get(last_index..).unwrap_or(""), template)?;

    Ok(segments)
}

/// Pushes literal text, rejecting stray delimiters left over by the tokenizer.
fn push_literal<'a>(
    segments: &mut Vec<Segment<'a>>,
    text: &'a str,
    template: &str,
) -> Result<(), PatternCompilationError> {
    if text.contains("{{") || text.contains("}}") {
        return Err(PatternCompilationError::UnbalancedDelimiters(
            template.to_string(),
        ));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text));
    }
    Ok(())
}

/// Parses the inner text of `{{ name }}` or `{{ name = default }}`.
fn parse_placeholder<'a>(
    inner: &str,
    template: &str,
) -> Result<Segment<'a>, PatternCompilationError> {
    let (name, default) = match inner.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
        None => (inner.trim(), None),
    };

    if !ARG_NAME_RE.is_match(name) {
        return Err(PatternCompilationError::InvalidArgumentName {
            name: name.to_string(),
            representation: template.to_string(),
        });
    }

    Ok(Segment::Placeholder {
        name: name.to_string(),
        default,
    })
}

/// Renders the regex source for the templated part of the pattern.
///
/// Literal text is emitted as regex source, with stray braces escaped. A placeholder followed by more template text
/// captures lazily across anything; the last placeholder captures exactly one
/// catch-all value so a stray trailing word cannot be absorbed into it. Placeholders
/// with a default are lazily optional, together with the whitespace that precedes them.
fn render_body(segments: &[Segment<'_>]) -> String {
    let mut body = String::new();

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(text) => {
                let next_is_optional = matches!(
                    segments.get(i + 1),
                    Some(Segment::Placeholder { default: Some(_), .. })
                );
                let text = if next_is_optional { text.trim_end() } else { text };
                body.push_str(&escape_stray_braces(text));
            }
            Segment::Placeholder { name, default } => {
                let is_trailing = i + 1 == segments.len();
                let capture = if is_trailing {
                    VALUE_PATTERN
                } else {
                    INTERIOR_CAPTURE
                };
                let group = format!("(?P<{}>{})", name, capture);

                if default.is_some() {
                    let lead = match i.checked_sub(1).and_then(|p| segments.get(p)) {
                        Some(Segment::Literal(text))
                            if text.ends_with(char::is_whitespace) =>
                        {
                            r"\s+"
                        }
                        _ => "",
                    };
                    body.push_str(&format!("(?:{}{})??", lead, group));
                } else {
                    body.push_str(&group);
                }
            }
        }
    }

    body
}

/// Escapes `{` and `}` unless they form a `{n}`, `{n,}` or `{n,m}` repetition, so
/// literal text like `json {a}` matches itself.
fn escape_stray_braces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        match c {
            '\\' => {
                // Keep an escape together with what it escapes, including the braced
                // argument of `\p{..}`, `\x{..}` and friends.
                let mut len: usize = rest.chars().take(2).map(char::len_utf8).sum();
                let braced = rest[..len].ends_with(['p', 'P', 'x', 'u']);
                if braced && rest[len..].starts_with('{') {
                    if let Some(close) = rest[len..].find('}') {
                        len += close + 1;
                    }
                }
                out.push_str(&rest[..len]);
                rest = &rest[len..];
            }
            '{' => {
                if let Some(m) = QUANTIFIER_RE.find(rest) {
                    out.push_str(m.as_str());
                    rest = &rest[m.end()..];
                } else {
                    out.push_str(r"\{");
                    rest = &rest[1..];
                }
            }
            '}' => {
                out.push_str(r"\}");
                rest = &rest[1..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    out
}
