//! Structural checks on a combined document.

use serde_json::Value;
use specforge::openapi::HttpMethod;

use crate::error::ValidationError;

/// Checks the rules every combined document must satisfy: a non-empty `openapi`
/// version, `info.title` and `info.version`, at least one path, at least one
/// operation per path and at least one response per operation.
pub fn validate_document(document: &Value) -> Result<(), ValidationError> {
    if !is_non_empty_str(document.get("openapi")) {
        return Err(ValidationError::MissingVersion);
    }
    let info = document.get("info");
    if !is_non_empty_str(info.and_then(|info| info.get("title"))) {
        return Err(ValidationError::MissingTitle);
    }
    if !is_non_empty_str(info.and_then(|info| info.get("version"))) {
        return Err(ValidationError::MissingInfoVersion);
    }

    let paths = match document.get("paths").and_then(Value::as_object) {
        Some(paths) if !paths.is_empty() => paths,
        _ => return Err(ValidationError::NoPaths),
    };

    for (path, item) in paths {
        let mut operations = 0;
        for (method, operation) in operations_of(item) {
            operations += 1;
            let has_responses = operation
                .get("responses")
                .and_then(Value::as_object)
                .is_some_and(|responses| !responses.is_empty());
            if !has_responses {
                return Err(ValidationError::NoResponses {
                    method: method.to_string(),
                    path: path.clone(),
                });
            }
        }
        if operations == 0 {
            return Err(ValidationError::EmptyPath(path.clone()));
        }
    }
    Ok(())
}

/// The `(method, operation)` entries of a path item, skipping non-method keys.
pub(crate) fn operations_of(item: &Value) -> impl Iterator<Item = (&str, &Value)> {
    item.as_object()
        .into_iter()
        .flatten()
        .filter(|(key, _)| is_method(key))
        .map(|(key, operation)| (key.as_str(), operation))
}

pub(crate) fn is_method(key: &str) -> bool {
    HttpMethod::ALL.iter().any(|method| method.as_str() == key)
}

fn is_non_empty_str(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|value| !value.trim().is_empty())
}
