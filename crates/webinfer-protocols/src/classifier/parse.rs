//! Parsing of raw classifier output into a [`Classification`].

use serde_json::Value;

use super::Classification;
use crate::error::ClassificationError;

const DEFAULT_RATIONALE: &str = "No rationale provided by the classifier.";

/// Parse a model reply that should contain a JSON classification object.
///
/// Accepts a bare object, an object wrapped in a fenced code block, or an
/// object surrounded by prose. The label is required; confidence must be a
/// number in `[0, 1]`.
pub fn parse_classification(text: &str) -> Result<Classification, ClassificationError> {
    let json = extract_json_object(text).ok_or_else(|| {
        ClassificationError::MalformedResponse(format!(
            "no JSON object in response: {}",
            preview(text)
        ))
    })?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| ClassificationError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    classification_from_value(&value)
}

/// Build a classification from an already-decoded JSON value.
pub fn classification_from_value(value: &Value) -> Result<Classification, ClassificationError> {
    let object = value.as_object().ok_or_else(|| {
        ClassificationError::MalformedResponse("response is not a JSON object".to_string())
    })?;

    let label = object
        .get("label")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ClassificationError::MalformedResponse("missing label".to_string()))?;

    let confidence = match object.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        // Some models quote numbers.
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        ClassificationError::MalformedResponse("missing or non-numeric confidence".to_string())
    })?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(ClassificationError::MalformedResponse(format!(
            "confidence {} outside [0, 1]",
            confidence
        )));
    }

    let rationale = ["rationale", "understanding", "purpose"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_RATIONALE);

    Ok(Classification {
        label: label.to_string(),
        confidence,
        rationale: rationale.to_string(),
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let mut body = text.trim();

    if let Some(start) = body.find("```") {
        let after = &body[start + 3..];
        // Skip an optional language tag on the opening fence.
        let after = after.find('\n').map_or(after, |nl| &after[nl + 1..]);
        if let Some(end) = after.find("```") {
            body = after[..end].trim();
        }
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > 80 {
        format!("{}...", trimmed.chars().take(80).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
