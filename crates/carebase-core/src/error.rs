use thiserror::Error;

/// A create payload that failed decoding or validation.
///
/// `field` names the offending field when it is known. Serde decoding errors
/// (unknown fields, wrong JSON types) do not always carry one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.field, .message))]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

fn render(field: &Option<String>, message: &str) -> String {
    match field {
        Some(field) => format!("{field}: {message}"),
        None => message.to_string(),
    }
}

impl FieldError {
    /// Error attached to a specific field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Error about the payload as a whole.
    pub fn payload(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::payload(err.to_string())
    }
}
