//! Request tracing identity and traced error responses

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;

use crate::error::IamError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Trace id of the current request
///
/// Taken from an inbound `X-Request-ID` verbatim, otherwise a fresh UUID v4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn from_parts(parts: &Parts) -> Self {
        parts
            .extensions
            .get::<TraceId>()
            .cloned()
            .or_else(|| {
                parts
                    .headers
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| TraceId(v.to_string()))
            })
            .unwrap_or_else(TraceId::generate)
    }

    pub fn generate() -> Self {
        TraceId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl<S> FromRequestParts<S> for TraceId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(TraceId::from_parts(parts))
    }
}

/// [`IamError`] rendered with the request's trace id in the body
#[derive(Debug)]
pub struct ApiError {
    error: IamError,
    trace_id: Option<String>,
}

impl ApiError {
    pub fn error(&self) -> &IamError {
        &self.error
    }
}

impl IamError {
    pub fn traced(self, trace_id: &TraceId) -> ApiError {
        ApiError {
            error: self,
            trace_id: Some(trace_id.0.clone()),
        }
    }
}

impl From<IamError> for ApiError {
    fn from(error: IamError) -> Self {
        ApiError {
            error,
            trace_id: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.error.log();
        let app_error = self.error.to_app_error();
        match self.trace_id {
            Some(trace_id) => app_error.with_trace_id(trace_id).into_response(),
            None => app_error.into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
