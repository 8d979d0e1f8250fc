//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! Method names are unique across traits so one type can implement all of
//! them without call-site ambiguity.

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};

use crate::domain::entity::{
    AccessLogEntry, AccessToken, AuditLogEntry, SessionRecord, Tenant, User,
};
use crate::domain::value_object::{Email, Page, TenantLookup};
use crate::error::IamResult;
use platform::password::HashedPassword;

/// Tenant repository trait
#[trait_variant::make(TenantRepository: Send)]
pub trait LocalTenantRepository {
    /// Insert a tenant; duplicate document yields `DocumentTaken`
    async fn create_tenant(&self, tenant: &Tenant) -> IamResult<()>;

    async fn find_tenant(&self, lookup: &TenantLookup) -> IamResult<Option<Tenant>>;

    /// Ordered by creation time
    async fn list_tenants(&self, page: Page) -> IamResult<Vec<Tenant>>;

    /// Persist all mutable fields; duplicate document yields `DocumentTaken`
    async fn update_tenant(&self, tenant: &Tenant) -> IamResult<()>;

    /// Returns whether a row was deleted
    async fn delete_tenant(&self, id: TenantId) -> IamResult<bool>;
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a user; duplicate email yields `EmailTaken`
    async fn create_user(&self, user: &User) -> IamResult<()>;

    async fn find_user_by_id(&self, id: UserId) -> IamResult<Option<User>>;

    async fn find_user_by_email(&self, email: &Email) -> IamResult<Option<User>>;

    /// All users, or only those of one tenant; ordered by creation time
    async fn list_users(&self, tenant_id: Option<TenantId>, page: Page) -> IamResult<Vec<User>>;

    /// Persist all mutable fields; duplicate email yields `EmailTaken`
    async fn update_user(&self, user: &User) -> IamResult<()>;

    async fn update_password(&self, id: UserId, password_hash: &HashedPassword) -> IamResult<()>;

    /// Returns whether a row was deleted
    async fn delete_user(&self, id: UserId) -> IamResult<bool>;
}

/// Access token repository trait
#[trait_variant::make(AccessTokenRepository: Send)]
pub trait LocalAccessTokenRepository {
    /// Insert a token; unique or foreign-key violations yield `TokenDuplicated`
    async fn create_access_token(&self, token: &AccessToken) -> IamResult<()>;

    /// Soft-revoke one token; returns affected rows
    async fn revoke_access_token(&self, token: &str, now: DateTime<Utc>) -> IamResult<u64>;

    /// Soft-revoke every token of the user that is still active at `now`
    async fn revoke_active_tokens_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> IamResult<u64>;
}

/// Session lookup trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Single query joining the token with its user and tenant
    async fn find_login_by_token(&self, token: &str) -> IamResult<Option<SessionRecord>>;
}

/// Activity log sink storage
#[trait_variant::make(ActivityLogRepository: Send)]
pub trait LocalActivityLogRepository {
    async fn save_access_log(&self, entry: &AccessLogEntry) -> IamResult<()>;

    async fn save_audit_log(&self, entry: &AuditLogEntry) -> IamResult<()>;
}

/// Everything the IAM HTTP surface needs from storage
pub trait IamRepository:
    TenantRepository
    + UserRepository
    + AccessTokenRepository
    + SessionRepository
    + ActivityLogRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> IamRepository for T where
    T: TenantRepository
        + UserRepository
        + AccessTokenRepository
        + SessionRepository
        + ActivityLogRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
