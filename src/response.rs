use serde::Deserialize;
use serde_json::Value;

/// Error body shapes the backend sends on non-2xx responses.
///
/// Handlers return `{"message": ..}`, the token views return `{"detail": ..}`,
/// the status endpoints return `{"error": ..}` and serializer validation
/// returns `{"field": ["msg", ..]}`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub detail: Option<String>,
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Best human-readable message, in the order the client has always preferred.
    pub fn message(&self) -> Option<String> {
        [&self.message, &self.detail, &self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .cloned()
            .or_else(|| self.first_field_error())
    }

    fn first_field_error(&self) -> Option<String> {
        self.fields.iter().find_map(|(field, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Array(values) => values.iter().find_map(Value::as_str)?.to_string(),
                _ => return None,
            };
            if field == "non_field_errors" {
                Some(text)
            } else {
                Some(format!("{field}: {text}"))
            }
        })
    }
}

/// Extracts a user-facing message from a raw error response body.
///
/// With `allow_plain_text`, a non-JSON body is itself the message (the delete
/// endpoint's historical behaviour).
pub fn error_message(raw: &str, allow_plain_text: bool) -> Option<String> {
    if let Some(body) = ErrorBody::parse(raw) {
        return body.message();
    }
    let trimmed = raw.trim();
    if allow_plain_text && !trimmed.is_empty() {
        Some(trimmed.to_string())
    } else {
        None
    }
}
