//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, middleware and trace ids.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod trace;

pub use handlers::IamAppState;
pub use middleware::{propagate_trace_id, require_login, require_roles};
pub use router::iam_router;
pub use trace::{ApiError, ApiResult, TraceId, X_REQUEST_ID};
