use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::{CourseError, CourseResult};

lazy_static! {
    // Greedy on purpose: first `{` through the last `}` in the reply.
    static ref JSON_OBJECT_SPAN: Regex =
        Regex::new(r"\{[\s\S]*\}").expect("hardcoded regex should compile");
}

/// Pull the JSON object out of a model reply that may carry prose or code fences.
///
/// The span runs from the first `{` to the last `}` without tracking depth, so
/// a reply with two separate objects yields an unparseable span and fails.
pub fn extract_json(raw: &str) -> CourseResult<Value> {
    let span = JSON_OBJECT_SPAN
        .find(raw)
        .ok_or_else(|| CourseError::malformed("no JSON object found in model reply", raw))?;

    let value: Value = serde_json::from_str(span.as_str())
        .map_err(|e| CourseError::malformed(format!("invalid JSON: {}", e), raw))?;

    tracing::debug!(
        span_start = span.start(),
        span_end = span.end(),
        raw_len = raw.len(),
        "Extracted JSON object from model reply"
    );

    Ok(value)
}
