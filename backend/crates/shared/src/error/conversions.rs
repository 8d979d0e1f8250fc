//! Error conversions - boundary rendering of [`AppError`]
//!
//! The response body shape is fixed:
//! `{ trace_id, message, error, code, causes? }`.

use serde::Serialize;

use super::app_error::{AppError, Cause};

/// Serialized form of an [`AppError`]
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub trace_id: Option<&'a str>,
    pub message: &'a str,
    pub error: &'static str,
    pub code: u16,
    #[serde(skip_serializing_if = "no_causes")]
    pub causes: &'a [Cause],
}

fn no_causes(causes: &&[Cause]) -> bool {
    causes.is_empty()
}

impl AppError {
    /// Borrow the error as its response body
    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            trace_id: self.trace_id(),
            message: self.message(),
            error: self.kind().as_str(),
            code: self.status_code(),
            causes: self.causes(),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let err = AppError::internal("internal server error")
            .with_cause(Cause::new("Mailer", "mailer not initialized"))
            .with_trace_id("trace-1");

        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["trace_id"], "trace-1");
        assert_eq!(json["message"], "internal server error");
        assert_eq!(json["error"], "internal_server_error");
        assert_eq!(json["code"], 500);
        assert_eq!(json["causes"][0]["field"], "Mailer");
        assert_eq!(json["causes"][0]["message"], "mailer not initialized");
    }

    #[test]
    fn test_causes_omitted_when_empty() {
        let err = AppError::not_found("tenant not found");
        let json = serde_json::to_value(err.body()).unwrap();
        assert!(json.get("causes").is_none());
        assert!(json["trace_id"].is_null());
    }
}
