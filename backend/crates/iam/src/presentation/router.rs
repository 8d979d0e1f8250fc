//! IAM Router
//!
//! ```text
//! propagate_trace_id
//! ├── /auth/login, /auth/logout/{token}, /auth/otp, /auth/password/reset
//! └── require_login
//!     └── require_roles (per route)
//!         ├── /auth/healthcheck
//!         ├── /tenant...
//!         └── /user...
//! ```

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, patch, post};
use platform::mailer::Mailer;

use crate::domain::repository::IamRepository;
use crate::domain::value_object::UserRole;
use crate::presentation::handlers::{IamAppState, auth, tenant, user};
use crate::presentation::middleware::{propagate_trace_id, require_login, require_roles};

const SYSTEM_ADMIN: &[UserRole] = &[UserRole::SystemAdmin];
const ADMINS: &[UserRole] = &[UserRole::SystemAdmin, UserRole::TenantAdmin];

/// Create the IAM router for any repository and mailer
///
/// Paths are relative; the binary nests this under `/api`.
pub fn iam_router<R, M>(state: IamAppState<R, M>) -> Router
where
    R: IamRepository,
    M: Mailer + Send + Sync + 'static,
{
    let public = Router::new()
        .route("/auth/login", post(auth::login::<R, M>))
        .route("/auth/logout/{token}", post(auth::logout::<R, M>))
        .route("/auth/otp", post(auth::create_otp::<R, M>))
        .route("/auth/password/reset", post(auth::reset_password::<R, M>));

    let protected = Router::new()
        .route("/auth/healthcheck", get(auth::healthcheck))
        // Tenant
        .route(
            "/tenant/create",
            post(tenant::create_tenant::<R, M>)
                .route_layer(from_fn_with_state(SYSTEM_ADMIN, require_roles)),
        )
        .route(
            "/tenant/list",
            get(tenant::list_tenants::<R, M>)
                .route_layer(from_fn_with_state(SYSTEM_ADMIN, require_roles)),
        )
        .route(
            "/tenant",
            get(tenant::read_tenant::<R, M>)
                .route_layer(from_fn_with_state(ADMINS, require_roles))
                .merge(
                    delete(tenant::delete_tenant::<R, M>)
                        .route_layer(from_fn_with_state(SYSTEM_ADMIN, require_roles)),
                ),
        )
        .route(
            "/tenant/{uuid}",
            patch(tenant::update_tenant::<R, M>)
                .route_layer(from_fn_with_state(ADMINS, require_roles)),
        )
        // User
        .route("/user", get(user::read_self))
        .route(
            "/user/list",
            get(user::list_users::<R, M>).route_layer(from_fn_with_state(ADMINS, require_roles)),
        )
        .route(
            "/user/{identifier}",
            post(user::create_user::<R, M>)
                .delete(user::delete_user::<R, M>)
                .route_layer(from_fn_with_state(ADMINS, require_roles))
                .merge(get(user::read_user::<R, M>).patch(user::update_user::<R, M>)),
        )
        .route_layer(from_fn_with_state(state.clone(), require_login::<R, M>));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(from_fn(propagate_trace_id))
        .with_state(state)
}
