//! Errors crossing the transport boundary.
//!
//! The transport reports [`TransportError`]s. The orchestrator normalizes
//! them into [`ApiError`], the value carried by FAILED actions and stored as
//! `last_error`: field-level validation problems stay distinct from
//! transport/network failures so the form layer can render them separately.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// RPC status codes reported by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// The call was cancelled
    Cancelled,
    /// Unknown error
    Unknown,
    /// The request was rejected by validation
    InvalidArgument,
    /// The deadline expired before the call completed
    DeadlineExceeded,
    /// The addressed resource does not exist
    NotFound,
    /// The resource already exists
    AlreadyExists,
    /// The caller may not perform the call
    PermissionDenied,
    /// A quota or rate limit was hit
    ResourceExhausted,
    /// The system is not in a state allowing the call
    FailedPrecondition,
    /// The call was aborted because of a concurrency conflict
    Aborted,
    /// The service is temporarily unavailable
    Unavailable,
    /// Internal error, including undecodable responses
    Internal,
    /// The caller is not authenticated
    Unauthenticated,
}

impl StatusCode {
    /// Whether a call failing with this code may succeed when repeated.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::DeadlineExceeded | Self::ResourceExhausted | Self::Aborted
        )
    }

    /// Map an HTTP status to the closest RPC code.
    #[must_use]
    pub const fn from_http(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidArgument,
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            408 | 504 => Self::DeadlineExceeded,
            409 => Self::AlreadyExists,
            412 => Self::FailedPrecondition,
            429 => Self::ResourceExhausted,
            499 => Self::Cancelled,
            502 | 503 => Self::Unavailable,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// A field-level validation problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Path of the offending field, e.g. `display_name`
    pub field: String,
    /// What is wrong with it
    pub description: String,
}

/// An error reported by the transport for one invocation.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct TransportError {
    /// Status code of the failed call
    pub code: StatusCode,
    /// Human readable message
    pub message: String,
    /// Field-level validation details, if any
    #[serde(default)]
    pub field_violations: Vec<FieldViolation>,
}

impl TransportError {
    /// Create an error without field details.
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field_violations: Vec::new(),
        }
    }

    /// `Unavailable`: the backend could not be reached.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// `NotFound` for `name`.
    #[must_use]
    pub fn not_found(name: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::NotFound, format!("{name} not found"))
    }

    /// Attach a field violation.
    #[must_use]
    pub fn with_violation(mut self, field: impl Into<String>, description: impl Into<String>) -> Self {
        self.field_violations.push(FieldViolation {
            field: field.into(),
            description: description.into(),
        });
        self
    }
}

/// The normalized error carried by FAILED actions.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ApiError {
    /// Network, server or protocol failure
    #[error("{message}")]
    #[serde(rename = "TransportError")]
    Transport {
        /// Status code of the failed call
        code: StatusCode,
        /// Human readable message
        message: String,
        /// Whether repeating the call may succeed
        retryable: bool,
    },

    /// The request was rejected with field-level errors
    #[error("{message}")]
    #[serde(rename = "ValidationError")]
    Validation {
        /// Human readable summary
        message: String,
        /// Error per field path; several violations of one field are
        /// joined with `"; "`
        field_errors: BTreeMap<String, String>,
    },
}

impl ApiError {
    /// A transport failure with the retryable flag derived from `code`.
    #[must_use]
    pub fn transport(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Transport {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// A response that could not be decoded into the expected payload.
    #[must_use]
    pub fn decode(error: &serde_json::Error) -> Self {
        Self::transport(StatusCode::Internal, format!("failed to decode response: {error}"))
    }

    /// Whether repeating the failed call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Validation { .. } => false,
        }
    }

    /// Human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. } | Self::Validation { message, .. } => message,
        }
    }

    /// Field errors of a validation failure (empty otherwise).
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { field_errors, .. } => Some(field_errors),
            Self::Transport { .. } => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        if error.code == StatusCode::InvalidArgument && !error.field_violations.is_empty() {
            let mut field_errors = BTreeMap::<String, String>::new();
            for violation in error.field_violations {
                field_errors
                    .entry(violation.field)
                    .and_modify(|existing| {
                        existing.push_str("; ");
                        existing.push_str(&violation.description);
                    })
                    .or_insert(violation.description);
            }
            return Self::Validation {
                message: error.message,
                field_errors,
            };
        }

        Self::transport(error.code, error.message)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn field_violations_become_validation_errors() {
        let error = TransportError::new(StatusCode::InvalidArgument, "invalid project")
            .with_violation("display_name", "must not be empty");

        let api: ApiError = error.into();
        assert!(!api.is_retryable());
        assert_eq!(
            api.field_errors().and_then(|f| f.get("display_name")).map(String::as_str),
            Some("must not be empty")
        );
    }

    #[test]
    fn violations_of_one_field_are_joined() {
        let error = TransportError::new(StatusCode::InvalidArgument, "invalid site")
            .with_violation("primary_domain", "must not be empty")
            .with_violation("display_name", "too long")
            .with_violation("primary_domain", "must be a hostname");

        let api: ApiError = error.into();
        let fields = api.field_errors().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["primary_domain"], "must not be empty; must be a hostname");
        assert_eq!(fields["display_name"], "too long");
    }

    #[test]
    fn kind_tag_names_the_error_type() {
        let transport = serde_json::to_value(ApiError::transport(StatusCode::Unavailable, "down")).unwrap();
        assert_eq!(transport["kind"], "TransportError");
        assert_eq!(transport["code"], serde_json::to_value(StatusCode::Unavailable).unwrap());

        let validation: ApiError = TransportError::new(StatusCode::InvalidArgument, "invalid project")
            .with_violation("display_name", "must not be empty")
            .into();
        let json = serde_json::to_value(&validation).unwrap();
        assert_eq!(json["kind"], "ValidationError");
        assert_eq!(json["field_errors"]["display_name"], "must not be empty");

        let back: ApiError = serde_json::from_value(json).unwrap();
        assert_eq!(back, validation);
    }

    #[test]
    fn invalid_argument_without_fields_is_transport() {
        let api: ApiError = TransportError::new(StatusCode::InvalidArgument, "bad").into();
        assert!(matches!(
            api,
            ApiError::Transport {
                code: StatusCode::InvalidArgument,
                retryable: false,
                ..
            }
        ));
    }

    #[test]
    fn retryable_codes() {
        let api: ApiError = TransportError::unavailable("connection refused").into();
        assert!(api.is_retryable());
        assert_eq!(api.message(), "connection refused");

        let api: ApiError = TransportError::not_found("project/foo").into();
        assert!(!api.is_retryable());
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(StatusCode::from_http(404), StatusCode::NotFound);
        assert_eq!(StatusCode::from_http(503), StatusCode::Unavailable);
        assert_eq!(StatusCode::from_http(500), StatusCode::Internal);
        assert_eq!(StatusCode::from_http(418), StatusCode::Unknown);
    }
}
