//! Defensive parsing of text-generator output into a [`CandidateForm`].

use crate::{CandidateForm, FormError};

const JSON_ESCAPES: [char; 9] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't', 'u'];

/// Strips code fences and a `json` tag, then doubles every backslash that
/// does not start a valid JSON escape (generators emit regexes like `\d`).
pub fn clean_generator_response(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
        if text.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            text = &text[4..];
        }
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    escape_invalid_escapes(text.trim())
}

fn escape_invalid_escapes(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            cleaned.push(ch);
            continue;
        }
        match chars.peek() {
            Some(next) if JSON_ESCAPES.contains(next) => {
                cleaned.push('\\');
                if let Some(next) = chars.next() {
                    cleaned.push(next);
                }
            }
            _ => cleaned.push_str("\\\\"),
        }
    }
    cleaned
}

/// Slice from the first `{` to the last `}`, if any.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_candidate(raw: &str) -> Result<CandidateForm, FormError> {
    let cleaned = clean_generator_response(raw);
    let object = outermost_object(&cleaned)
        .ok_or_else(|| FormError::Parse("response contains no JSON object".to_string()))?;
    let candidate = CandidateForm::from_json_str(object)?;
    tracing::debug!(
        questions = candidate.questions.len(),
        "generator response parsed"
    );
    Ok(candidate)
}
