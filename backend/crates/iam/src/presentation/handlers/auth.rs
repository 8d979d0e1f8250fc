//! Auth handlers: login, logout, OTP, password reset, healthcheck

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use platform::mailer::Mailer;
use serde_json::json;

use crate::application::{
    CreateOtpUseCase, LoginInput, LoginUseCase, LogoutUseCase, ResetPasswordInput,
    ResetPasswordUseCase,
};
use crate::domain::entity::{AuditLogEntry, Login};
use crate::domain::repository::IamRepository;
use crate::presentation::dto::{LoginRequest, LoginResponse, OtpRequest, ResetPasswordRequest};
use crate::presentation::handlers::{IamAppState, json_body};
use crate::presentation::trace::{ApiResult, TraceId};

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;
    let email = req.email.trim().to_string();

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.hasher.clone(),
        state.tokens.clone(),
    );
    let result = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await;

    let mut audit = AuditLogEntry::new(trace_id.as_str(), "auth", "login", "login")
        .identifier(email.clone())
        .input(json!({ "email": email }))
        .outcome(&result, |out| json!({ "user_uuid": out.user.id }));
    if let Ok(out) = &result {
        audit.tenant_id = out.user.tenant_id;
        audit.user_id = Some(out.user.id);
    }
    state.activity.record_audit(audit);

    let output = result.map_err(|e| e.traced(&trace_id))?;

    tracing::info!(
        trace_id = %trace_id.as_str(),
        user_id = %output.user.id,
        "User logged in"
    );

    Ok(Json(LoginResponse {
        user: (&output.user).into(),
        token: output.access_token.token,
        expire: output.access_token.expires_at,
        system_time_utc: Utc::now(),
    }))
}

/// POST /api/auth/logout/{token}
pub async fn logout<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Path(token): Path<String>,
) -> ApiResult<StatusCode>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    LogoutUseCase::new(state.repo.clone())
        .execute(&token)
        .await
        .map_err(|e| e.traced(&trace_id))?;

    Ok(StatusCode::ACCEPTED)
}

// ============================================================================
// OTP password reset
// ============================================================================

/// POST /api/auth/otp
pub async fn create_otp<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<StatusCode>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;

    let use_case = CreateOtpUseCase::new(
        state.repo.clone(),
        state.otp.clone(),
        state.mailer.clone(),
        state.config.otp_length,
    );
    use_case
        .execute(&req.email)
        .await
        .map_err(|e| e.traced(&trace_id))?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/auth/password/reset
pub async fn reset_password<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<StatusCode>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;
    let email = req.email.trim().to_string();

    let use_case = ResetPasswordUseCase::new(
        state.repo.clone(),
        state.otp.clone(),
        state.hasher.clone(),
        state.config.min_reset_password_length,
    );
    let result = use_case
        .execute(ResetPasswordInput {
            email: req.email,
            otp: req.otp,
            password: req.password,
        })
        .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "auth", "update", "reset_password")
            .identifier(email.clone())
            .input(json!({ "email": email }))
            .outcome(&result, |_| json!({ "changed": true })),
    );

    result.map_err(|e| e.traced(&trace_id))?;
    Ok(StatusCode::OK)
}

// ============================================================================
// Healthcheck
// ============================================================================

/// GET /api/auth/healthcheck
///
/// Echoes the caller's login; doubles as a token check for clients.
pub async fn healthcheck(Extension(login): Extension<Login>) -> Json<LoginResponse> {
    Json(LoginResponse {
        user: (&login.user).into(),
        token: login.access_token.token.clone(),
        expire: login.access_token.expires_at,
        system_time_utc: Utc::now(),
    })
}
