//! Tenant handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use kernel::id::TenantId;
use platform::mailer::Mailer;
use serde_json::json;

use crate::application::{CreateTenantInput, TenantService};
use crate::domain::entity::{AuditLogEntry, Login, TenantPatch};
use crate::domain::policy::{self, Caller};
use crate::domain::repository::IamRepository;
use crate::domain::value_object::{Page, TenantLookup};
use crate::error::IamError;
use crate::presentation::dto::{
    CreateTenantRequest, ListTenantQuery, TenantListResponse, TenantQuery, TenantResponse,
    UpdateTenantRequest,
};
use crate::presentation::handlers::{IamAppState, json_body, query_params};
use crate::presentation::trace::{ApiResult, TraceId};

/// POST /api/tenant/create
pub async fn create_tenant<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    payload: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TenantResponse>)>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;
    let input = json!({ "name": req.name, "document": req.document });

    let result = TenantService::new(state.repo.clone())
        .create(CreateTenantInput {
            name: req.name,
            document: req.document,
        })
        .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "tenant", "create", "create_tenant")
            .by(&login)
            .input(input)
            .outcome(&result, |t| json!({ "uuid": t.id })),
    );

    let tenant = result.map_err(|e| e.traced(&trace_id))?;
    Ok((StatusCode::CREATED, Json((&tenant).into())))
}

/// GET /api/tenant?uuid=..|document=..
pub async fn read_tenant<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    query: Result<Query<TenantQuery>, QueryRejection>,
) -> ApiResult<Json<TenantResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let query = query_params(query, &trace_id)?;
    let tenant = async {
        let requested =
            TenantLookup::from_query(query.uuid.as_deref(), query.document.as_deref())?;
        let lookup = policy::scope_tenant_read(&Caller::from(&login), requested)?;
        TenantService::new(state.repo.clone()).find(&lookup).await
    }
    .await
    .map_err(|e| e.traced(&trace_id))?;

    Ok(Json((&tenant).into()))
}

/// GET /api/tenant/list?page=&pageSize=
pub async fn list_tenants<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    query: Result<Query<ListTenantQuery>, QueryRejection>,
) -> ApiResult<Json<TenantListResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let query = query_params(query, &trace_id)?;
    let (page, tenants) = async {
        let page = Page::new(query.page, query.page_size)?;
        let tenants = TenantService::new(state.repo.clone()).list(page).await?;
        Ok::<_, IamError>((page, tenants))
    }
    .await
    .map_err(|e| e.traced(&trace_id))?;

    Ok(Json(TenantListResponse {
        tenants: tenants.iter().map(TenantResponse::from).collect(),
        page: page.number(),
        size: page.size(),
    }))
}

/// PATCH /api/tenant/{uuid}
pub async fn update_tenant<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    Path(uuid): Path<String>,
    payload: Result<Json<UpdateTenantRequest>, JsonRejection>,
) -> ApiResult<Json<TenantResponse>>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let req = json_body(payload, &trace_id)?;
    let input = json!({
        "uuid": uuid,
        "name": req.name,
        "document": req.document,
        "live": req.live,
    });

    let result = async {
        let target: TenantId = uuid
            .trim()
            .parse()
            .map_err(|_| IamError::invalid_field("uuid", "invalid tenant uuid"))?;
        let patch = TenantPatch {
            name: req.name,
            document: req.document,
            live: req.live,
        };
        let (target, patch) = policy::scope_tenant_update(&Caller::from(&login), target, patch)?;
        TenantService::new(state.repo.clone()).update(target, patch).await
    }
    .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "tenant", "update", "update_tenant")
            .by(&login)
            .input(input)
            .outcome(&result, |t| json!({ "uuid": t.id })),
    );

    let tenant = result.map_err(|e| e.traced(&trace_id))?;
    Ok(Json((&tenant).into()))
}

/// DELETE /api/tenant?uuid=..|document=..
pub async fn delete_tenant<R, M>(
    State(state): State<IamAppState<R, M>>,
    trace_id: TraceId,
    Extension(login): Extension<Login>,
    query: Result<Query<TenantQuery>, QueryRejection>,
) -> ApiResult<StatusCode>
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let query = query_params(query, &trace_id)?;
    let input = json!({ "uuid": query.uuid, "document": query.document });

    let result = async {
        let lookup = TenantLookup::from_query(query.uuid.as_deref(), query.document.as_deref())?
            .ok_or_else(|| IamError::invalid("uuid or document is required"))?;
        TenantService::new(state.repo.clone()).delete(&lookup).await
    }
    .await;

    state.activity.record_audit(
        AuditLogEntry::new(trace_id.as_str(), "tenant", "delete", "delete_tenant")
            .by(&login)
            .input(input)
            .outcome(&result, |t| json!({ "uuid": t.id })),
    );

    result.map_err(|e| e.traced(&trace_id))?;
    Ok(StatusCode::NO_CONTENT)
}
