//! IAM Middleware
//!
//! - [`propagate_trace_id`] tags every request and response with a trace id
//! - [`require_login`] resolves the bearer token into a [`Login`] and writes
//!   the access log once the response is known
//! - [`require_roles`] is the per-route role gate

use axum::extract::{ConnectInfo, OriginalUri, Request, State};
use axum::http::{HeaderName, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use platform::client::{extract_bearer_token, extract_client_ip, header_string};
use platform::mailer::Mailer;
use std::net::SocketAddr;
use std::time::Instant;

use crate::application::ResolveSessionUseCase;
use crate::domain::entity::{AccessLogEntry, Login, RequestMetadata};
use crate::domain::policy;
use crate::domain::repository::IamRepository;
use crate::domain::value_object::UserRole;
use crate::error::{IamError, SessionRejection};
use crate::presentation::handlers::IamAppState;
use crate::presentation::trace::{TraceId, X_REQUEST_ID};

/// Outermost layer: reuse or mint the trace id and echo it back
pub async fn propagate_trace_id(mut req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let trace_id = TraceId::from_parts(&parts);
    parts.extensions.insert(trace_id.clone());
    req = Request::from_parts(parts, body);

    let mut response = next.run(req).await;
    if let Some(value) = trace_id.header_value() {
        response
            .headers_mut()
            .insert(HeaderName::from_static(X_REQUEST_ID), value);
    }
    response
}

/// Middleware that requires a live bearer token
pub async fn require_login<R, M>(
    State(state): State<IamAppState<R, M>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let started = Instant::now();
    let trace_id = req
        .extensions()
        .get::<TraceId>()
        .cloned()
        .unwrap_or_else(TraceId::generate);

    let Some(token) = extract_bearer_token(req.headers()) else {
        return IamError::Session(SessionRejection::Missing)
            .traced(&trace_id)
            .into_response();
    };

    let metadata = request_metadata(&req, &trace_id);
    let use_case = ResolveSessionUseCase::new(state.repo.clone());
    let login = match use_case.execute(&token, metadata).await {
        Ok(login) => login,
        Err(e) => return e.traced(&trace_id).into_response(),
    };

    tracing::debug!(
        trace_id = %trace_id.as_str(),
        user_id = %login.user_id(),
        role = %login.role(),
        "Request authenticated"
    );

    let mut entry = AccessLogEntry::from_login(&login, 0, 0);
    req.extensions_mut().insert(login);

    let response = next.run(req).await;

    entry.status = response.status().as_u16();
    entry.latency_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
    state.activity.record_access(entry);

    response
}

/// Role gate; runs after [`require_login`]
///
/// Mounted with `from_fn_with_state(ROLES, require_roles)`; an empty slice
/// admits any authenticated caller.
pub async fn require_roles(
    State(allowed): State<&'static [UserRole]>,
    req: Request,
    next: Next,
) -> Response {
    let Some(login) = req.extensions().get::<Login>() else {
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .cloned()
            .unwrap_or_else(TraceId::generate);
        return IamError::Session(SessionRejection::Missing)
            .traced(&trace_id)
            .into_response();
    };

    if let Err(e) = policy::check_role(login.role(), allowed) {
        let trace_id = TraceId(login.trace_id().to_string());
        return e.traced(&trace_id).into_response();
    }

    next.run(req).await
}

fn request_metadata(req: &Request, trace_id: &TraceId) -> RequestMetadata {
    let headers = req.headers();
    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    RequestMetadata {
        trace_id: trace_id.as_str().to_string(),
        client_ip: extract_client_ip(headers, direct_ip),
        method: req.method().to_string(),
        path: req
            .extensions()
            .get::<OriginalUri>()
            .map_or_else(|| req.uri().path(), |uri| uri.path())
            .to_string(),
        host: header_string(headers, header::HOST),
        user_agent: header_string(headers, header::USER_AGENT),
        referer: header_string(headers, header::REFERER),
        content_type: header_string(headers, header::CONTENT_TYPE),
        language: header_string(headers, header::ACCEPT_LANGUAGE),
        requested_at: Utc::now(),
    }
}
