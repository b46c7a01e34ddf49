use serde_json::Value;

use super::normalizer::is_truthy;
use crate::error::{CourseError, CourseResult};

/// Check the minimum contract of a generated learning path.
///
/// Rules run in a fixed order and the first violation is returned. Anything
/// produced by `normalize` passes; the checks still matter for callers that
/// skip normalization.
pub fn validate(value: &Value) -> CourseResult<()> {
    let modules = value
        .get("modules")
        .and_then(Value::as_array)
        .ok_or_else(|| CourseError::InvalidResponseStructure("missing modules array".into()))?;

    if !is_truthy(value.get("followUpQuestion")) {
        return Err(CourseError::InvalidResponseStructure(
            "missing followUpQuestion".into(),
        ));
    }
    if !is_truthy(value.get("estimatedTotalHours")) {
        return Err(CourseError::InvalidResponseStructure(
            "missing estimatedTotalHours".into(),
        ));
    }

    for (index, module) in modules.iter().enumerate() {
        if !is_truthy(module.get("estimatedHours")) {
            return Err(CourseError::MissingModuleField {
                index,
                field: "estimatedHours",
            });
        }
        if !matches!(module.get("resources"), Some(Value::Array(_))) {
            return Err(CourseError::MissingModuleField {
                index,
                field: "resources",
            });
        }
    }

    for (module_index, module) in modules.iter().enumerate() {
        let resources = module
            .get("resources")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for (resource_index, resource) in resources.iter().enumerate() {
            if !is_truthy(resource.get("estimatedMinutes")) {
                return Err(CourseError::MissingResourceField {
                    module: module_index,
                    resource: resource_index,
                    field: "estimatedMinutes",
                });
            }
        }
    }

    Ok(())
}
