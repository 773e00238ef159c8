// src/core/matcher.rs

//! Resolves one inbound line against a registry snapshot.
//!
//! Every pattern is tried. Each match yields a candidate whose arguments are merged in
//! three layers, later layers winning: declared defaults, named captures, then the
//! trailing `key=value` pairs. When several patterns match, the most specific one wins
//! (most literal characters consumed by that match), then the lexically smallest action
//! reference, then the pattern registered first.

use crate::{
    core::extra_params::{parse_extra_params, unquote},
    models::{CompiledPattern, MatchCandidate},
};
use std::{cmp::Reverse, ops::Range};

/// Matches `line` against a single pattern and builds its candidate.
pub fn match_pattern(pattern: &CompiledPattern, line: &str) -> Option<MatchCandidate> {
    match_scored(pattern, line).map(|(candidate, _)| candidate)
}

/// Like [`match_pattern`], also returning the number of literal characters the match
/// consumed: everything after the command prefix that no argument capture or extra
/// `key=value` pair accounts for. Trailing whitespace does not count.
pub fn match_scored(pattern: &CompiledPattern, line: &str) -> Option<(MatchCandidate, usize)> {
    let caps = pattern.matcher.captures(line)?;
    let whole = caps.get(0)?;

    let mut kwargs = pattern.defaults.clone();
    let mut argument_spans: Vec<Range<usize>> = Vec::new();
    for name in pattern.matcher.capture_names().flatten() {
        if let Some(value) = caps.name(name) {
            kwargs.insert(name.to_string(), Some(unquote(value.as_str()).to_string()));
            argument_spans.push(value.range());
        }
    }
    if let Some(extra) = caps.get(pattern.extra_group) {
        kwargs.extend(parse_extra_params(extra.as_str()));
        argument_spans.push(extra.range());
    }

    let consumed = &line[whole.start()..whole.start() + whole.as_str().trim_end().len()];
    let literal = consumed
        .char_indices()
        .filter(|(i, _)| {
            let at = whole.start() + i;
            !argument_spans.iter().any(|span| span.contains(&at))
        })
        .count()
        .saturating_sub(pattern.prefix_len);

    let candidate = MatchCandidate {
        action_ref: pattern.action_ref.clone(),
        kwargs,
    };
    Some((candidate, literal))
}

/// Resolves `line` to at most one candidate.
pub fn resolve(patterns: &[CompiledPattern], line: &str) -> Option<MatchCandidate> {
    let mut matches: Vec<(usize, usize, &CompiledPattern, MatchCandidate)> = patterns
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match_scored(p, line).map(|(c, score)| (i, score, p, c)))
        .collect();

    if matches.len() > 1 {
        log::debug!(
            "'{}' matched {} patterns: {:?}",
            line,
            matches.len(),
            matches
                .iter()
                .map(|(_, _, p, _)| p.representation.as_str())
                .collect::<Vec<_>>()
        );
    }

    matches.sort_by(|(ia, sa, pa, _), (ib, sb, pb, _)| {
        (Reverse(sa), &pa.action_ref, ia).cmp(&(Reverse(sb), &pb.action_ref, ib))
    });

    matches.into_iter().next().map(|(_, _, _, candidate)| candidate)
}
