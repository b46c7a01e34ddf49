use serde_json::{Map, Value};

pub const FALLBACK_FOLLOW_UP: &str =
    "What specific aspect of this topic would you like to focus on next?";
pub const DEFAULT_TOTAL_HOURS: &str = "0";
pub const DEFAULT_MODULE_TITLE: &str = "Untitled Module";
pub const DEFAULT_MODULE_HOURS: &str = "1";
pub const DEFAULT_RESOURCE_TYPE: &str = "article";
pub const DEFAULT_RESOURCE_TITLE: &str = "Untitled Resource";
pub const DEFAULT_RESOURCE_MINUTES: &str = "30";
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Loose truthiness used for every default: `null`, `false`, `0` and `""` are
/// treated as missing.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn default_str(map: &mut Map<String, Value>, key: &str, fallback: &str) {
    if !is_truthy(map.get(key)) {
        map.insert(key.to_string(), Value::String(fallback.to_string()));
    }
}

/// Fill required-but-missing fields of a generated learning path.
///
/// Present truthy fields and unknown keys are never touched. Module and
/// resource entries that are not objects are replaced by defaulted objects so
/// the result always passes structural validation. Idempotent.
pub fn normalize(value: Value) -> Value {
    let Value::Object(mut root) = value else {
        return value;
    };

    default_str(&mut root, "estimatedTotalHours", DEFAULT_TOTAL_HOURS);
    default_str(&mut root, "followUpQuestion", FALLBACK_FOLLOW_UP);

    if let Some(Value::Array(modules)) = root.get_mut("modules") {
        for module in modules.iter_mut() {
            normalize_module(module);
        }
    }

    Value::Object(root)
}

fn normalize_module(module: &mut Value) {
    if !module.is_object() {
        *module = Value::Object(Map::new());
    }
    let Value::Object(map) = module else {
        return;
    };

    default_str(map, "title", DEFAULT_MODULE_TITLE);
    default_str(map, "description", DEFAULT_DESCRIPTION);
    default_str(map, "estimatedHours", DEFAULT_MODULE_HOURS);

    if !matches!(map.get("resources"), Some(Value::Array(_))) {
        map.insert("resources".to_string(), Value::Array(Vec::new()));
    }

    if let Some(Value::Array(resources)) = map.get_mut("resources") {
        for resource in resources.iter_mut() {
            normalize_resource(resource);
        }
    }
}

fn normalize_resource(resource: &mut Value) {
    if !resource.is_object() {
        *resource = Value::Object(Map::new());
    }
    let Value::Object(map) = resource else {
        return;
    };

    default_str(map, "type", DEFAULT_RESOURCE_TYPE);
    default_str(map, "title", DEFAULT_RESOURCE_TITLE);
    default_str(map, "description", DEFAULT_DESCRIPTION);
    default_str(map, "estimatedMinutes", DEFAULT_RESOURCE_MINUTES);
}
