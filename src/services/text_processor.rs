// Text Processing Service
// Response cleaning applied before classification.

use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

use crate::error::SchemaError;
use crate::models::{Frame, ResponseRecord, RESPONSE_TEXT};

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Strip surrounding whitespace and collapse internal runs to one space.
pub fn normalize_whitespace(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    whitespace_re().replace_all(text.trim(), " ").into_owned()
}

/// Normalize every response and drop the ones with `min_chars` characters or
/// fewer. Missing text counts as empty and is dropped.
pub fn clean_responses(
    frame: &Frame<ResponseRecord>,
    min_chars: usize,
) -> Result<Frame<ResponseRecord>, SchemaError> {
    frame.require(&[RESPONSE_TEXT])?;

    let rows: Vec<ResponseRecord> = frame
        .rows()
        .iter()
        .filter_map(|record| {
            let text = normalize_whitespace(record.text());
            if text.chars().count() <= min_chars {
                return None;
            }
            let mut cleaned = record.clone();
            cleaned.response_text = Some(text);
            Some(cleaned)
        })
        .collect();

    let dropped = frame.len() - rows.len();
    info!(kept = rows.len(), dropped, min_chars, "responses.cleaned");
    Ok(frame.derive(&[], rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MODEL_NAME;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\t\tb \n\n c  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace(" \u{3000} "), "");
    }

    #[test]
    fn test_clean_drops_short_and_missing() {
        let rows = vec![
            ResponseRecord::new("Model-A", "  The   Eiffel Tower is in Paris.  "),
            ResponseRecord::new("Model-A", "Too short"),
            ResponseRecord::new("Model-B", "exactly10!"),
            ResponseRecord {
                response_text: None,
                model_name: Some("Model-B".to_string()),
                ..Default::default()
            },
            ResponseRecord::new("Model-B", "eleven char"),
        ];
        let frame = Frame::new([MODEL_NAME, RESPONSE_TEXT], rows);
        let cleaned = clean_responses(&frame, 10).unwrap();

        let texts: Vec<&str> = cleaned.rows().iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["The Eiffel Tower is in Paris.", "eleven char"]);
        assert_eq!(cleaned.columns(), frame.columns());
    }

    #[test]
    fn test_clean_requires_text_column() {
        let frame = Frame::new([MODEL_NAME], vec![ResponseRecord::default()]);
        assert!(clean_responses(&frame, 10).is_err());
    }
}
