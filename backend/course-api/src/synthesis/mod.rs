//! Turning a language-model reply into a validated learning path.
//!
//! The pipeline is strictly staged: the reply is extracted into an untyped
//! `serde_json::Value`, defaulted, validated, and only then converted into
//! the typed course structures. Merging with a learner's draft happens last.

use serde::Deserialize;

use crate::error::{CourseError, CourseResult};
use crate::models::course::{string_or_number, Module};

pub mod extractor;
pub mod normalizer;
pub mod prompt;
pub mod reconciler;
pub mod validator;

pub use extractor::extract_json;
pub use normalizer::{normalize, FALLBACK_FOLLOW_UP};
pub use prompt::{build_conversation, compose_system_prompt};
pub use reconciler::{edit_module, reconcile, remove_module, set_finalized, toggle_finalized};
pub use validator::validate;

/// A generation result after normalization and validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLearningPath {
    pub modules: Vec<Module>,
    #[serde(deserialize_with = "string_or_number::required")]
    pub estimated_total_hours: String,
    pub follow_up_question: String,
}

/// Run a raw model reply through extract, normalize, validate and typing.
pub fn synthesize(raw: &str) -> CourseResult<GeneratedLearningPath> {
    let extracted = extract_json(raw)?;
    let normalized = normalize(extracted);
    validate(&normalized)?;

    serde_json::from_value(normalized).map_err(|e| {
        CourseError::InvalidResponseStructure(format!("unexpected field types: {}", e))
    })
}
