//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{Tenant, User};
use crate::domain::value_object::UserRole;

// ============================================================================
// Auth
// ============================================================================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response (also returned by the healthcheck)
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub expire: DateTime<Utc>,
    pub system_time_utc: DateTime<Utc>,
}

/// OTP request
#[derive(Debug, Clone, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

/// Password reset through an OTP
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub password: String,
}

// ============================================================================
// Tenant
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub document: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub document: Option<String>,
    pub live: Option<bool>,
}

/// `?uuid=` or `?document=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantQuery {
    pub uuid: Option<String>,
    pub document: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTenantQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantResponse {
    pub uuid: Uuid,
    pub name: String,
    pub document: String,
    pub live: bool,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl From<&Tenant> for TenantResponse {
    fn from(tenant: &Tenant) -> Self {
        Self {
            uuid: tenant.id.into_uuid(),
            name: tenant.name.clone(),
            document: tenant.document.clone(),
            live: tenant.live,
            create_at: tenant.created_at,
            update_at: tenant.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantListResponse {
    pub tenants: Vec<TenantResponse>,
    /// The page actually served, defaults filled in
    pub page: u32,
    pub size: u32,
}

// ============================================================================
// User
// ============================================================================

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Partial update; blank strings are treated as absent
#[derive(Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub live: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUserQuery {
    pub page: Option<u32>,
    #[serde(alias = "pageSize")]
    pub size: Option<u32>,
    /// Tenant uuid or document (system admins only)
    #[serde(alias = "tenant")]
    pub tenant_identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_uuid: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub live: bool,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            uuid: user.id.into_uuid(),
            tenant_uuid: user.tenant_id.map(|id| id.into_uuid()),
            name: user.name.clone(),
            email: user.email.to_string(),
            role: user.role,
            live: user.live,
            create_at: user.created_at,
            update_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
}
