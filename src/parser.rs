//! Document parsing: turns raw uploaded text into an ordered list of
//! atomic statements.
//!
//! Input provenance is unknown at the boundary (JSON export, YAML outline,
//! bulleted prose), so parsing degrades through decreasingly structured
//! strategies instead of requiring the caller to declare a format. Parsing
//! never fails; the worst case is the whole trimmed input as one statement.

use crate::segmenter::SentenceSegmenter;
use tracing::debug;

/// Parse raw document content into statements.
///
/// Strategies, first success wins: JSON, YAML, line split (more than one
/// non-empty line), sentence segmentation (if a segmenter is supplied),
/// then the whole trimmed input.
pub fn parse_document(raw: &str, segmenter: Option<&dyn SentenceSegmenter>) -> Vec<String> {
    try_json(raw)
        .or_else(|| try_yaml(raw))
        .or_else(|| try_lines(raw))
        .or_else(|| try_sentences(raw, segmenter))
        .unwrap_or_else(|| vec![raw.trim().to_string()])
}

fn try_json(raw: &str) -> Option<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let statements = flatten_root(&value)?;
    debug!("parsed document as JSON ({} statements)", statements.len());
    Some(statements)
}

fn try_yaml(raw: &str) -> Option<Vec<String>> {
    let value: serde_yaml::Value = serde_yaml::from_str(raw).ok()?;
    // Re-expressed as JSON so one flatten covers both formats. YAML that JSON
    // cannot represent (multi-document streams, complex mapping keys) fails
    // here and falls through.
    let value = serde_json::to_value(&value).ok()?;
    let statements = flatten_root(&value)?;
    debug!("parsed document as YAML ({} statements)", statements.len());
    Some(statements)
}

fn try_lines(raw: &str) -> Option<Vec<String>> {
    let lines: Vec<String> = raw
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if lines.len() > 1 { Some(lines) } else { None }
}

fn try_sentences(raw: &str, segmenter: Option<&dyn SentenceSegmenter>) -> Option<Vec<String>> {
    let sentences = segmenter?.segment(raw);
    if sentences.is_empty() {
        None
    } else {
        debug!("segmented document into {} sentences", sentences.len());
        Some(sentences)
    }
}

/// Flatten a mapping or sequence root into its scalar leaves. Scalar roots
/// (including null) yield `None` so prose that happens to parse as a bare
/// scalar falls through to the plain-text strategies.
fn flatten_root(value: &serde_json::Value) -> Option<Vec<String>> {
    if !value.is_object() && !value.is_array() {
        return None;
    }
    let mut statements = Vec::new();
    flatten_into(value, &mut statements);
    if statements.is_empty() {
        None
    } else {
        Some(statements)
    }
}

fn flatten_into(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            // Keys are discarded; only leaf values carry statements.
            for child in map.values() {
                flatten_into(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for child in items {
                flatten_into(child, out);
            }
        }
        serde_json::Value::String(s) => {
            if !s.trim().is_empty() {
                out.push(s.clone());
            }
        }
        other => out.push(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::UnicodeSegmenter;

    #[test]
    fn json_object_flattens_to_leaf_values() {
        let parsed = parse_document(r#"{"a": ["x", "y"], "b": "z"}"#, None);
        assert_eq!(parsed, vec!["x", "y", "z"]);
    }

    #[test]
    fn json_array_root_flattens_recursively() {
        let parsed = parse_document(r#"[{"a": "x"}, "y", ["z"]]"#, None);
        assert_eq!(parsed, vec!["x", "y", "z"]);
    }

    #[test]
    fn json_scalar_leaves_use_json_text() {
        let parsed = parse_document(r#"{"a": [1, true, null], "b": 2.5}"#, None);
        assert_eq!(parsed, vec!["1", "true", "null", "2.5"]);
    }

    #[test]
    fn json_scalar_root_falls_through() {
        // A bare JSON string is a scalar root, so the raw text (quotes and
        // all) comes back as the single fallback statement.
        let parsed = parse_document(r#""hello""#, None);
        assert_eq!(parsed, vec![r#""hello""#]);
    }

    #[test]
    fn yaml_mapping_flattens_to_leaf_values() {
        let parsed = parse_document("requirements:\n  - Encrypt data\n  - Log access\n", None);
        assert_eq!(parsed, vec!["Encrypt data", "Log access"]);
    }

    #[test]
    fn colon_lines_parse_as_yaml_mapping_values() {
        // Prose shaped like "label: text" is indistinguishable from a YAML
        // mapping, so only the values survive.
        let parsed = parse_document("req 1: encrypt data\nreq 2: log access", None);
        assert_eq!(parsed, vec!["encrypt data", "log access"]);
    }

    #[test]
    fn multiline_prose_splits_on_lines() {
        let parsed = parse_document("Encrypt all data\n\nLog every access\n", None);
        assert_eq!(parsed, vec!["Encrypt all data", "Log every access"]);
    }

    #[test]
    fn single_block_prose_uses_sentence_segmentation() {
        let seg = UnicodeSegmenter;
        let parsed = parse_document(
            "The system encrypts data. Access is logged.",
            Some(&seg as &dyn SentenceSegmenter),
        );
        assert_eq!(
            parsed,
            vec!["The system encrypts data.", "Access is logged."]
        );
    }

    #[test]
    fn single_block_without_segmenter_returns_whole_input() {
        let parsed = parse_document("  The system encrypts data at rest.  ", None);
        assert_eq!(parsed, vec!["The system encrypts data at rest."]);
    }

    #[test]
    fn empty_input_yields_single_empty_statement() {
        let parsed = parse_document("", None);
        assert_eq!(parsed, vec![""]);
    }

    #[test]
    fn whitespace_only_structured_values_fall_through() {
        // Every leaf is blank, so the structured strategies yield nothing
        // and the raw text itself becomes the statement.
        let raw = r#"{"a": "   ", "b": ""}"#;
        let parsed = parse_document(raw, None);
        assert_eq!(parsed, vec![raw]);
    }
}
