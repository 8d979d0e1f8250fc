//! Entity Module

pub mod access_token;
pub mod activity;
pub mod login;
pub mod tenant;
pub mod user;

pub use access_token::{AccessToken, TokenState};
pub use activity::{AccessLogEntry, AuditLogEntry};
pub use login::{Login, RequestMetadata, SessionRecord};
pub use tenant::{Tenant, TenantPatch};
pub use user::{User, UserPatch, check_tenant_binding};
