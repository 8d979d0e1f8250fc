//! User handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use platform::mailer::Mailer;
use serde_json::json;

use crate::application::{CreateUserInput, UpdateUserInput, UserService};
use crate::domain::entity::{AuditLogEntry, Login, User};
use crate::domain::policy::{self, Caller};
use crate::domain::repository::IamRepository;
use crate::domain::value_object::{Page, TenantLookup, UserLookup};
use crate::error::IamResult;
use crate::presentation::dto::{
    CreateUserRequest, ListUserQuery, UpdateUserRequest, UserListResponse, UserResponse,
};
use crate::presentation::handlers::{IamAppState, json_body, query_params};
use crate::presentation::trace::{ApiResult, TraceId};

fn user_service<R, M>(state: &IamAppState<R, M>) -> UserService<R>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    UserService::new(
        state.repo.clone(),
        state.hasher.clone(),
        state.config.min_password_length,
    )
}

/// Blank, "undefined" and "null" identifiers address the caller
async fn resolve_target<R>(
    service: &UserService<R>,
    login: &Login,
    identifier: &str,
) -> IamResult<User>
where
    R: IamRepository,
{
    match UserLookup::from_identifier(identifier)? {
        Some(lookup) => service.find(&lookup).await,
        None => Ok(login.user.clone()),
    }
}

/// POST /api/user/{tenant}
pub async fn create_user<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    Path(tenant): Path<String>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;
    let input = json!({
        "tenant": tenant,
        "name": req.name,
        "email": req.email,
        "role": req.role,
    });

    let result = async {
        let requested = TenantLookup::from_identifier(&tenant)?;
        let tenant = policy::scope_user_create(&Caller::from(&login), requested, req.role)?;
        user_service(&state)
            .create(CreateUserInput {
                tenant,
                name: req.name,
                email: req.email,
                password: req.password,
                role: req.role,
            })
            .await
    }
    .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "user", "create", "create_user")
            .by(&login)
            .input(input)
            .outcome(&result, |u| json!({ "uuid": u.id })),
    );

    let user = result.map_err(|e| e.traced(&trace_id))?;
    Ok((StatusCode::CREATED, Json((&user).into())))
}

/// GET /api/user
pub async fn read_self(Extension(login): Extension<Login>) -> Json<UserResponse> {
    Json((&login.user).into())
}

/// GET /api/user/{identifier}
pub async fn read_user<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<UserResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let result: IamResult<User> = async {
        let target = resolve_target(&user_service(&state), &login, &identifier).await?;
        policy::check_user_read(&Caller::from(&login), &target)?;
        Ok(target)
    }
    .await;

    let user = result.map_err(|e| e.traced(&trace_id))?;

    Ok(Json((&user).into()))
}

/// GET /api/user/list?tenant_identifier=..&page=&size=
pub async fn list_users<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    query: Result<Query<ListUserQuery>, QueryRejection>,
) -> ApiResult<Json<UserListResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let query = query_params(query, &trace_id)?;
    let users = async {
        let page = Page::new(query.page, query.size)?;
        let requested = query
            .tenant_identifier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TenantLookup::from_identifier)
            .transpose()?;
        let scoped = policy::scope_user_list(&Caller::from(&login), requested)?;
        user_service(&state).list(scoped.as_ref(), page).await
    }
    .await
    .map_err(|e| e.traced(&trace_id))?;

    Ok(Json(UserListResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// PATCH /api/user/{identifier}
pub async fn update_user<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    Path(identifier): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;
    let input = json!({
        "identifier": identifier,
        "name": req.name,
        "email": req.email,
        "role": req.role,
        "live": req.live,
        "password_changed": req.password.as_deref().is_some_and(|p| !p.trim().is_empty()),
    });

    let result = async {
        let service = user_service(&state);
        let target = resolve_target(&service, &login, &identifier).await?;
        let role = policy::scope_user_update(&Caller::from(&login), &target, req.role)?;
        service
            .update(
                target,
                UpdateUserInput {
                    name: req.name,
                    email: req.email,
                    password: req.password,
                    role,
                    live: req.live,
                },
            )
            .await
    }
    .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "user", "update", "update_user")
            .by(&login)
            .input(input)
            .outcome(&result, |u| json!({ "uuid": u.id })),
    );

    let user = result.map_err(|e| e.traced(&trace_id))?;
    Ok(Json((&user).into()))
}

/// DELETE /api/user/{identifier}
pub async fn delete_user<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    Path(identifier): Path<String>,
) -> ApiResult<StatusCode>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let result = async {
        let service = user_service(&state);
        let target = resolve_target(&service, &login, &identifier).await?;
        policy::check_user_delete(&Caller::from(&login), &target)?;
        service.delete(target.id).await.map(|()| target)
    }
    .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "user", "delete", "delete_user")
            .by(&login)
            .input(json!({ "identifier": identifier }))
            .outcome(&result, |u| json!({ "uuid": u.id })),
    );

    result.map_err(|e| e.traced(&trace_id))?;
    Ok(StatusCode::NO_CONTENT)
}
