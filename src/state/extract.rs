//! Scalar extraction rules for command output.

use serde_json::Value;

use super::StateError;

/// How to pull a single value out of raw command output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Extraction<'a> {
    /// The whole output, trimmed.
    Trim,
    /// The first whitespace-delimited token of the first line.
    FirstToken,
    /// A string field addressed by a JSON pointer (for example
    /// `/spec/objectStorage/bucket`).
    JsonPointer(&'a str),
}

/// Applies `rule` to `raw`, naming the value `what` in errors.
///
/// # Errors
///
/// Returns [`StateError::EmptyResult`] when the extracted value is empty after
/// trimming, and [`StateError::MalformedResponse`] when a JSON pointer rule
/// meets invalid JSON or a missing or non-string field.
pub fn extract_scalar(raw: &str, rule: Extraction<'_>, what: &str) -> Result<String, StateError> {
    let value = match rule {
        Extraction::Trim => raw.trim().to_owned(),
        Extraction::FirstToken => raw
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_owned(),
        Extraction::JsonPointer(pointer) => json_string_at(raw, pointer, what)?,
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StateError::empty(what));
    }
    Ok(trimmed.to_owned())
}

fn json_string_at(raw: &str, pointer: &str, what: &str) -> Result<String, StateError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|err| StateError::malformed(what, err))?;
    match document.pointer(pointer) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(StateError::malformed(
            what,
            format!("field {pointer} is not a string: {other}"),
        )),
        None => Err(StateError::malformed(
            what,
            format!("missing field {pointer}"),
        )),
    }
}

/// Strips the URL scheme from an issuer URL, leaving host and path.
#[must_use]
pub fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map_or(url, |(_, rest)| rest)
}
