//! Boundary error value
//!
//! [`AppError`] is what every crate hands to the HTTP layer: a kind, a
//! client-facing message, optional per-field causes and the trace id of the
//! request that failed.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use super::kind::ErrorKind;

/// One entry of the `causes` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cause {
    pub field: String,
    pub message: String,
}

impl Cause {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// ```rust
/// use kernel::error::app_error::{AppError, Cause};
///
/// let err = AppError::bad_request("invalid request")
///     .with_cause(Cause::new("email", "must be a valid email"))
///     .with_trace_id("req-1");
/// assert_eq!(err.status_code(), 400);
/// assert_eq!(err.trace_id(), Some("req-1"));
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    causes: Vec<Cause>,
    trace_id: Option<String>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            causes: Vec::new(),
            trace_id: None,
        }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.causes.push(cause);
        self
    }

    pub fn with_causes(mut self, causes: impl IntoIterator<Item = Cause>) -> Self {
        self.causes.extend(causes);
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[Cause] {
        &self.causes
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_kind() {
        let cases = [
            (AppError::bad_request("x"), 400),
            (AppError::forbidden("x"), 403),
            (AppError::not_found("x"), 404),
            (AppError::conflict("x"), 409),
            (AppError::internal("x"), 500),
        ];
        for (err, code) in cases {
            assert_eq!(err.status_code(), code);
            assert!(err.causes().is_empty());
            assert!(err.trace_id().is_none());
        }
    }

    #[test]
    fn causes_accumulate_in_order() {
        let err = AppError::bad_request("invalid request")
            .with_cause(Cause::new("email", "must be a valid email"))
            .with_causes([Cause::new("password", "too short")]);
        let fields: Vec<&str> = err.causes().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["email", "password"]);
    }

    #[test]
    fn display_has_kind_and_message() {
        let err = AppError::not_found("tenant not found").with_trace_id("t-1");
        assert_eq!(err.to_string(), "[not_found] tenant not found");
    }
}
