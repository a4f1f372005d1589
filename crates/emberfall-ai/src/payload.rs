//! JSON payload extraction and repair.
//!
//! Every stage expects a single JSON object (or array) somewhere inside the
//! completion text. Extraction takes the substring between the first
//! opening bracket and the last closing bracket. If that fails to parse,
//! one bracket-balancing repair pass appends the missing closers and tries
//! again; after that the payload is declared unusable and the caller falls
//! back.

use emberfall_core::error::EngineError;

/// Extracts and parses the JSON object embedded in completion text.
///
/// # Errors
///
/// Returns `EngineError::Parse` when no object is found or the payload is
/// still unparseable after one repair pass.
pub fn extract_object(text: &str) -> Result<serde_json::Value, EngineError> {
    extract(text, '{', '}')
}

/// Extracts and parses the JSON array embedded in completion text.
///
/// # Errors
///
/// Returns `EngineError::Parse` when no array is found or the payload is
/// still unparseable after one repair pass.
pub fn extract_array(text: &str) -> Result<serde_json::Value, EngineError> {
    extract(text, '[', ']')
}

fn extract(text: &str, open: char, close: char) -> Result<serde_json::Value, EngineError> {
    let start = text
        .find(open)
        .ok_or_else(|| EngineError::Parse(format!("no {open:?} in response")))?;
    let end = text
        .rfind(close)
        .filter(|&end| end > start)
        .map_or(text.len(), |end| end + 1);
    let candidate = &text[start..end];

    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = repair_brackets(candidate);
            serde_json::from_str(&repaired).map_err(|_| {
                EngineError::Parse(format!("unparseable after repair: {first_err}"))
            })
        }
    }
}

/// Appends the closing braces/brackets a truncated payload is missing.
/// String contents are skipped so brackets inside values do not count.
fn repair_brackets(candidate: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in candidate.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut repaired = candidate.to_owned();
    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    repaired
}
