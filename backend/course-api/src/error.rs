use thiserror::Error;

pub type CourseResult<T> = Result<T, CourseError>;

/// Failures raised by course synthesis, the language-model client and storage.
///
/// The HTTP layer maps each kind onto a status code; nothing below the
/// handlers retries or swallows these.
#[derive(Debug, Error)]
pub enum CourseError {
    /// The model reply did not contain a parseable JSON object.
    #[error("malformed model output: {reason}")]
    MalformedModelOutput { reason: String, raw: String },

    #[error("invalid response structure: {0}")]
    InvalidResponseStructure(String),

    #[error("module {index} missing {field}")]
    MissingModuleField { index: usize, field: &'static str },

    #[error("resource {resource} of module {module} missing {field}")]
    MissingResourceField {
        module: usize,
        resource: usize,
        field: &'static str,
    },

    #[error("module {0} is finalized and cannot be modified")]
    ModuleFinalized(usize),

    #[error("module index {index} out of range (course has {len} modules)")]
    ModuleIndexOutOfRange { index: usize, len: usize },

    #[error("language model request failed: {0}")]
    LanguageModel(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("unknown failure: {0}")]
    UnknownFailure(String),
}

impl CourseError {
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        CourseError::MalformedModelOutput {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// True for failures produced while turning a model reply into a course.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            CourseError::MalformedModelOutput { .. }
                | CourseError::InvalidResponseStructure(_)
                | CourseError::MissingModuleField { .. }
                | CourseError::MissingResourceField { .. }
                | CourseError::LanguageModel(_)
        )
    }
}

impl From<mongodb::error::Error> for CourseError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        let code = match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref we)) => Some(we.code),
            ErrorKind::Command(ref ce) => Some(ce.code),
            _ => None,
        };

        CourseError::from_server_code(code, err.to_string())
    }
}

impl CourseError {
    /// Classify a MongoDB server error code.
    fn from_server_code(code: Option<i32>, message: String) -> Self {
        match code {
            Some(11000) => CourseError::DuplicateKey(message),
            Some(121) => CourseError::ValidationFailed(message),
            _ => CourseError::Storage(message),
        }
    }
}

impl From<mongodb::bson::ser::Error> for CourseError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        CourseError::Storage(format!("Failed to encode course document: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failures_are_classified() {
        assert!(CourseError::malformed("no JSON object", "hello").is_generation_failure());
        assert!(CourseError::LanguageModel("timeout".into()).is_generation_failure());
        assert!(CourseError::MissingModuleField {
            index: 0,
            field: "estimatedHours"
        }
        .is_generation_failure());
        assert!(!CourseError::NotFound("Course".into()).is_generation_failure());
        assert!(!CourseError::DuplicateKey("_id".into()).is_generation_failure());
    }

    #[test]
    fn test_server_codes_map_to_variants() {
        assert!(matches!(
            CourseError::from_server_code(Some(11000), "E11000 duplicate key".into()),
            CourseError::DuplicateKey(msg) if msg == "E11000 duplicate key"
        ));
        assert!(matches!(
            CourseError::from_server_code(Some(121), "Document failed validation".into()),
            CourseError::ValidationFailed(msg) if msg == "Document failed validation"
        ));
        assert!(matches!(
            CourseError::from_server_code(Some(13), "unauthorized".into()),
            CourseError::Storage(_)
        ));
        assert!(matches!(
            CourseError::from_server_code(None, "connection refused".into()),
            CourseError::Storage(msg) if msg == "connection refused"
        ));
    }

    #[test]
    fn test_malformed_keeps_raw_text() {
        match CourseError::malformed("no JSON object", "Sure, here it is") {
            CourseError::MalformedModelOutput { raw, .. } => assert_eq!(raw, "Sure, here it is"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = CourseError::MissingResourceField {
            module: 1,
            resource: 2,
            field: "estimatedMinutes",
        };
        assert_eq!(
            err.to_string(),
            "resource 2 of module 1 missing estimatedMinutes"
        );
        assert_eq!(
            CourseError::NotFound("Course".into()).to_string(),
            "Course not found"
        );
    }
}
