// src/core/format.rs

//! Reduces the two StackStorm alias format shapes to a single `NormalizedFormat`.

use crate::models::{FormatSpec, NormalizedFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    /// The entry is neither a string nor a `{display, representation}` object.
    #[error("Malformed alias format {raw}: {reason}")]
    Malformed { raw: String, reason: String },
}

impl FormatSpec {
    /// Returns the help label and representations of this format. Non-string
    /// representations are logged and dropped; the format is malformed only when no
    /// string representation is left.
    pub fn normalize(self) -> Result<NormalizedFormat, FormatError> {
        match self {
            FormatSpec::Plain(s) => Ok(NormalizedFormat {
                display: s.clone(),
                representations: vec![s],
            }),
            FormatSpec::Structured {
                display,
                representations,
            } => {
                let representations: Vec<String> = representations
                    .into_iter()
                    .filter_map(|value| match value {
                        serde_json::Value::String(s) => Some(s),
                        other => {
                            log::warn!(
                                "Skipping representation {} of '{}': not a string",
                                other,
                                display
                            );
                            None
                        }
                    })
                    .collect();

                if representations.is_empty() {
                    return Err(FormatError::Malformed {
                        raw: display,
                        reason: "structured format has no string representations".to_string(),
                    });
                }
                Ok(NormalizedFormat {
                    display,
                    representations,
                })
            }
        }
    }
}

/// Parses one raw format entry as fetched from the alias source and normalizes it.
pub fn normalize_format(raw: &serde_json::Value) -> Result<NormalizedFormat, FormatError> {
    let spec: FormatSpec =
        serde_json::from_value(raw.clone()).map_err(|e| FormatError::Malformed {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;
    spec.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_is_display_and_single_representation() {
        let normalized = normalize_format(&json!("deploy {{app}}")).unwrap();
        assert_eq!(normalized.display, "deploy {{app}}");
        assert_eq!(normalized.representations, vec!["deploy {{app}}"]);
    }

    #[test]
    fn test_structured_format_is_taken_verbatim() {
        let raw = json!({
            "display": "restart <service>",
            "representation": ["restart {{service}}", "bounce {{service}}"]
        });
        let normalized = normalize_format(&raw).unwrap();
        assert_eq!(normalized.display, "restart <service>");
        assert_eq!(
            normalized.representations,
            vec!["restart {{service}}", "bounce {{service}}"]
        );
    }

    #[test]
    fn test_unrecognized_shapes_are_malformed() {
        for raw in [json!(42), json!(null), json!(["a"]), json!({"display": "x"})] {
            let err = normalize_format(&raw).unwrap_err();
            assert!(matches!(err, FormatError::Malformed { .. }), "{raw} accepted");
        }
    }

    #[test]
    fn test_structured_without_representations_is_malformed() {
        let raw = json!({"display": "nothing", "representation": []});
        assert!(normalize_format(&raw).is_err());
        let raw = json!({"display": "numbers", "representation": [1, null]});
        assert!(normalize_format(&raw).is_err());
    }

    #[test]
    fn test_non_string_representation_is_dropped_alone() {
        let raw = json!({"display": "restart", "representation": ["restart {{s}}", 42]});
        let normalized = normalize_format(&raw).unwrap();
        assert_eq!(normalized.representations, vec!["restart {{s}}"]);
    }
}
