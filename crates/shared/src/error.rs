use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    MalformedJson,
    MissingField,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {detail}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub field: Option<&'static str>,
    pub detail: String,
}

impl ParseError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: ParseErrorKind::MalformedJson,
            field: None,
            detail: detail.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self {
            kind: ParseErrorKind::MissingField,
            field: Some(field),
            detail: format!("required field `{field}` is absent or null"),
        }
    }

    pub fn is_missing_field(&self) -> bool {
        self.kind == ParseErrorKind::MissingField
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(value: serde_json::Error) -> Self {
        Self::malformed(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Internal,
}

/// Error body returned by the chat backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}
