//! Authenticated Identity
//!
//! Built once per request by the session resolver and handed to handlers.
//! Never persisted; the access log is the only thing that outlives it.

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};
use std::net::IpAddr;

use crate::domain::entity::{access_token::AccessToken, tenant::Tenant, user::User};
use crate::domain::value_object::user_role::UserRole;

/// Per-request metadata captured before authentication
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    pub trace_id: String,
    pub client_ip: Option<IpAddr>,
    pub method: String,
    pub path: String,
    pub host: String,
    pub user_agent: String,
    pub referer: String,
    pub content_type: String,
    pub language: String,
    pub requested_at: DateTime<Utc>,
}

/// Storage view joining a token with its user and tenant
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub access_token: AccessToken,
    /// `None` when the owning user row is gone
    pub user: Option<User>,
    pub tenant: Option<Tenant>,
}

#[derive(Debug, Clone)]
pub struct Login {
    pub user: User,
    pub tenant: Option<Tenant>,
    pub access_token: AccessToken,
    pub metadata: RequestMetadata,
}

impl Login {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.user.tenant_id
    }

    pub fn trace_id(&self) -> &str {
        &self.metadata.trace_id
    }
}
