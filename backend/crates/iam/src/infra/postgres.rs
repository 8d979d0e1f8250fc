//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    AccessLogEntry, AccessToken, AuditLogEntry, SessionRecord, Tenant, User,
};
use crate::domain::repository::{
    AccessTokenRepository, ActivityLogRepository, SessionRepository, TenantRepository,
    UserRepository,
};
use crate::domain::value_object::{Email, Page, TenantLookup, UserRole};
use crate::error::{IamError, IamResult};

/// PostgreSQL-backed IAM repository
#[derive(Clone)]
pub struct PgIamRepository {
    pool: PgPool,
}

impl PgIamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete tokens that expired more than `retention` ago
    pub async fn cleanup_expired_tokens(&self, retention: std::time::Duration) -> IamResult<u64> {
        let retention = chrono::Duration::from_std(retention)
            .map_err(|e| IamError::Internal(format!("invalid token retention: {e}")))?;
        let cutoff = Utc::now() - retention;

        let deleted = sqlx::query("DELETE FROM access_tokens WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired access tokens");

        Ok(deleted)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// `users_tenant_binding_check` and the role check
fn is_check_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_check_violation())
}

fn tenant_binding_rejected() -> IamError {
    IamError::invalid_field("role", "role does not match the user's tenant")
}

const TENANT_COLUMNS: &str = "id, name, document, live, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, tenant_id, name, email, password_hash, role, live, created_at, updated_at";

// ============================================================================
// Tenant Repository Implementation
// ============================================================================

impl TenantRepository for PgIamRepository {
    async fn create_tenant(&self, tenant: &Tenant) -> IamResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, document, live, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(&tenant.name)
        .bind(&tenant.document)
        .bind(tenant.live)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                IamError::DocumentTaken
            } else {
                IamError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_tenant(&self, lookup: &TenantLookup) -> IamResult<Option<Tenant>> {
        let query = match lookup {
            TenantLookup::Id(id) => {
                sqlx::query_as::<_, TenantRow>(&format!(
                    "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
                ))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await?
            }
            TenantLookup::Document(document) => {
                sqlx::query_as::<_, TenantRow>(&format!(
                    "SELECT {TENANT_COLUMNS} FROM tenants WHERE document = $1"
                ))
                .bind(document)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(query.map(TenantRow::into_tenant))
    }

    async fn list_tenants(&self, page: Page) -> IamResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.size()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TenantRow::into_tenant).collect())
    }

    async fn update_tenant(&self, tenant: &Tenant) -> IamResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET name = $2, document = $3, live = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(&tenant.name)
        .bind(&tenant.document)
        .bind(tenant.live)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                IamError::DocumentTaken
            } else {
                IamError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(IamError::TenantNotFound);
        }
        Ok(())
    }

    async fn delete_tenant(&self, id: TenantId) -> IamResult<bool> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgIamRepository {
    async fn create_user(&self, user: &User) -> IamResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                tenant_id,
                name,
                email,
                password_hash,
                role,
                live,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.tenant_id.map(TenantId::into_uuid))
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.code())
        .bind(user.live)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                IamError::EmailTaken
            } else if is_foreign_key_violation(&e) {
                IamError::TenantNotFound
            } else if is_check_violation(&e) {
                tenant_binding_rejected()
            } else {
                IamError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_user_by_id(&self, id: UserId) -> IamResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> IamResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn list_users(&self, tenant_id: Option<TenantId>, page: Page) -> IamResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(tenant_id.map(TenantId::into_uuid))
        .bind(i64::from(page.size()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn update_user(&self, user: &User) -> IamResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password_hash = $4,
                role = $5,
                live = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.code())
        .bind(user.live)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                IamError::EmailTaken
            } else if is_check_violation(&e) {
                tenant_binding_rejected()
            } else {
                IamError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(IamError::UserNotFound);
        }
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &HashedPassword) -> IamResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(password_hash.as_phc_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IamError::UserNotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> IamResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Access Token Repository Implementation
// ============================================================================

impl AccessTokenRepository for PgIamRepository {
    async fn create_access_token(&self, token: &AccessToken) -> IamResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens (token, user_id, expires_at, revoked_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id.as_uuid())
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) || is_foreign_key_violation(&e) {
                IamError::TokenDuplicated
            } else {
                IamError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn revoke_access_token(&self, token: &str, now: DateTime<Utc>) -> IamResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE access_tokens
            SET revoked_at = COALESCE(revoked_at, $2),
                expires_at = LEAST(expires_at, $2)
            WHERE token = $1
            "#,
        )
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_active_tokens_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> IamResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE access_tokens
            SET revoked_at = $2, expires_at = $2
            WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgIamRepository {
    async fn find_login_by_token(&self, token: &str) -> IamResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                t.token,
                t.user_id,
                t.expires_at,
                t.revoked_at,
                t.created_at,
                u.id AS u_id,
                u.tenant_id AS u_tenant_id,
                u.name AS u_name,
                u.email AS u_email,
                u.password_hash AS u_password_hash,
                u.role AS u_role,
                u.live AS u_live,
                u.created_at AS u_created_at,
                u.updated_at AS u_updated_at,
                tn.id AS tn_id,
                tn.name AS tn_name,
                tn.document AS tn_document,
                tn.live AS tn_live,
                tn.created_at AS tn_created_at,
                tn.updated_at AS tn_updated_at
            FROM access_tokens t
            LEFT JOIN users u ON u.id = t.user_id
            LEFT JOIN tenants tn ON tn.id = u.tenant_id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_record).transpose()
    }
}

// ============================================================================
// Activity Log Repository Implementation
// ============================================================================

impl ActivityLogRepository for PgIamRepository {
    async fn save_access_log(&self, entry: &AccessLogEntry) -> IamResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_log (
                tenant_id, user_id, identifier, trace_id, method, path, host, status,
                client_ip, user_agent, referer, content_type, language, requested_at, latency_ms
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(entry.tenant_id.map(TenantId::into_uuid))
        .bind(entry.user_id.map(UserId::into_uuid))
        .bind(&entry.identifier)
        .bind(&entry.trace_id)
        .bind(&entry.method)
        .bind(&entry.path)
        .bind(&entry.host)
        .bind(i32::from(entry.status))
        .bind(&entry.client_ip)
        .bind(&entry.user_agent)
        .bind(&entry.referer)
        .bind(&entry.content_type)
        .bind(&entry.language)
        .bind(entry.requested_at)
        .bind(entry.latency_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_audit_log(&self, entry: &AuditLogEntry) -> IamResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                tenant_id, user_id, identifier, trace_id, domain, action, function,
                success, input, output, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.tenant_id.map(TenantId::into_uuid))
        .bind(entry.user_id.map(UserId::into_uuid))
        .bind(&entry.identifier)
        .bind(&entry.trace_id)
        .bind(entry.domain)
        .bind(entry.action)
        .bind(entry.function)
        .bind(entry.success)
        .bind(&entry.input)
        .bind(&entry.output)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    document: String,
    live: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self) -> Tenant {
        Tenant {
            id: TenantId::from_uuid(self.id),
            name: self.name,
            document: self.document,
            live: self.live,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    live: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> IamResult<User> {
        Ok(User {
            id: UserId::from_uuid(self.id),
            tenant_id: self.tenant_id.map(TenantId::from_uuid),
            name: self.name,
            email: Email::from_db(self.email),
            password_hash: HashedPassword::from_stored(self.password_hash),
            role: parse_role(&self.role)?,
            live: self.live,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    u_id: Option<Uuid>,
    u_tenant_id: Option<Uuid>,
    u_name: Option<String>,
    u_email: Option<String>,
    u_password_hash: Option<String>,
    u_role: Option<String>,
    u_live: Option<bool>,
    u_created_at: Option<DateTime<Utc>>,
    u_updated_at: Option<DateTime<Utc>>,
    tn_id: Option<Uuid>,
    tn_name: Option<String>,
    tn_document: Option<String>,
    tn_live: Option<bool>,
    tn_created_at: Option<DateTime<Utc>>,
    tn_updated_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    fn into_record(self) -> IamResult<SessionRecord> {
        let access_token = AccessToken {
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            created_at: self.created_at,
        };

        let user = match (
            self.u_id,
            self.u_name,
            self.u_email,
            self.u_password_hash,
            self.u_role,
            self.u_live,
            self.u_created_at,
            self.u_updated_at,
        ) {
            (
                Some(id),
                Some(name),
                Some(email),
                Some(password_hash),
                Some(role),
                Some(live),
                Some(created_at),
                Some(updated_at),
            ) => Some(
                UserRow {
                    id,
                    tenant_id: self.u_tenant_id,
                    name,
                    email,
                    password_hash,
                    role,
                    live,
                    created_at,
                    updated_at,
                }
                .into_user()?,
            ),
            _ => None,
        };

        let tenant = match (
            self.tn_id,
            self.tn_name,
            self.tn_document,
            self.tn_live,
            self.tn_created_at,
            self.tn_updated_at,
        ) {
            (
                Some(id),
                Some(name),
                Some(document),
                Some(live),
                Some(created_at),
                Some(updated_at),
            ) => Some(
                TenantRow {
                    id,
                    name,
                    document,
                    live,
                    created_at,
                    updated_at,
                }
                .into_tenant(),
            ),
            _ => None,
        };

        Ok(SessionRecord {
            access_token,
            user,
            tenant,
        })
    }
}

fn parse_role(code: &str) -> IamResult<UserRole> {
    UserRole::from_code(code)
        .ok_or_else(|| IamError::Internal(format!("Invalid role stored in database: {code}")))
}
