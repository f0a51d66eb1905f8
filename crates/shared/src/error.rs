use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

/// Error body returned by the REST backend on a rejected request.
///
/// The backend answers either `{"detail": "..."}`, `{"error": "..."}` or a
/// map of field names to message lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<(String, String)>,
}

impl ApiErrorBody {
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return match value {
                Value::String(text) if !text.trim().is_empty() => Self {
                    detail: Some(text.trim().to_string()),
                    ..Self::default()
                },
                _ => Self::default(),
            };
        };

        let mut body = Self::default();
        for (key, entry) in object {
            match (key.as_str(), entry) {
                ("detail", Value::String(text)) => body.detail = Some(text.clone()),
                ("error", Value::String(text)) => body.error = Some(text.clone()),
                (field, Value::String(text)) => {
                    body.field_errors.push((field.to_string(), text.clone()))
                }
                (field, Value::Array(items)) => {
                    let joined = items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(" ");
                    if !joined.is_empty() {
                        body.field_errors.push((field.to_string(), joined));
                    }
                }
                _ => {}
            }
        }
        body
    }

    /// Single human-readable line, preferring `detail`, then `error`, then
    /// the field messages.
    pub fn message(&self) -> Option<String> {
        if let Some(detail) = &self.detail {
            return Some(detail.clone());
        }
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        if self.field_errors.is_empty() {
            return None;
        }
        Some(
            self.field_errors
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prefers_detail_over_field_errors() {
        let body = ApiErrorBody::from_value(&json!({
            "detail": "Authentication required",
            "status": ["invalid"],
        }));
        assert_eq!(body.message().as_deref(), Some("Authentication required"));
    }

    #[test]
    fn joins_field_error_lists() {
        let body = ApiErrorBody::from_value(&json!({
            "password": ["too short", "too common"],
        }));
        assert_eq!(
            body.message().as_deref(),
            Some("password: too short too common")
        );
    }

    #[test]
    fn html_or_empty_bodies_have_no_message() {
        assert_eq!(ApiErrorBody::from_value(&json!(null)).message(), None);
        assert_eq!(ApiErrorBody::from_value(&json!("  ")).message(), None);
    }
}
