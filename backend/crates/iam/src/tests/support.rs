//! In-memory collaborators shared by the crate tests

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};
use platform::mailer::{MailError, Mailer};
use platform::password::{ClearTextPassword, CredentialHasher, HashParams, HashedPassword};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::{IamConfig, LoginInput, LoginUseCase};
use crate::domain::entity::{
    AccessLogEntry, AccessToken, AuditLogEntry, SessionRecord, Tenant, User, check_tenant_binding,
};
use crate::domain::repository::{
    AccessTokenRepository, ActivityLogRepository, SessionRepository, TenantRepository,
    UserRepository,
};
use crate::domain::value_object::{Email, Page, TenantLookup, UserRole};
use crate::error::{IamError, IamResult};
use crate::infra::activity_log::ActivityLog;
use crate::presentation::IamAppState;

pub const PASSWORD: &str = "correct-horse";

// ============================================================================
// Repository
// ============================================================================

#[derive(Default)]
struct Store {
    tenants: Vec<Tenant>,
    users: Vec<User>,
    tokens: Vec<AccessToken>,
    access_log: Vec<AccessLogEntry>,
    audit_log: Vec<AuditLogEntry>,
}

/// Mirrors the PostgreSQL constraints the application relies on
#[derive(Clone, Default)]
pub struct MemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl MemoryRepository {
    fn with<T>(&self, f: impl FnOnce(&mut Store) -> T) -> T {
        let mut store = self.store.lock().unwrap();
        f(&mut store)
    }

    pub fn tokens_of(&self, user_id: UserId) -> Vec<AccessToken> {
        self.with(|s| {
            s.tokens
                .iter()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect()
        })
    }

    pub fn access_log(&self) -> Vec<AccessLogEntry> {
        self.with(|s| s.access_log.clone())
    }

    pub fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.with(|s| s.audit_log.clone())
    }

    pub fn password_hash_of(&self, user_id: UserId) -> Option<String> {
        self.with(|s| {
            s.users
                .iter()
                .find(|u| u.id == user_id)
                .map(|u| u.password_hash.as_phc_string().to_string())
        })
    }
}

fn paged<T: Clone>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(page.offset() as usize)
        .take(page.size() as usize)
        .collect()
}

impl TenantRepository for MemoryRepository {
    async fn create_tenant(&self, tenant: &Tenant) -> IamResult<()> {
        self.with(|s| {
            if s.tenants.iter().any(|t| t.document == tenant.document) {
                return Err(IamError::DocumentTaken);
            }
            s.tenants.push(tenant.clone());
            Ok(())
        })
    }

    async fn find_tenant(&self, lookup: &TenantLookup) -> IamResult<Option<Tenant>> {
        Ok(self.with(|s| {
            s.tenants
                .iter()
                .find(|t| match lookup {
                    TenantLookup::Id(id) => t.id == *id,
                    TenantLookup::Document(document) => t.document == *document,
                })
                .cloned()
        }))
    }

    async fn list_tenants(&self, page: Page) -> IamResult<Vec<Tenant>> {
        Ok(self.with(|s| {
            let mut tenants = s.tenants.clone();
            tenants.sort_by_key(|t| t.created_at);
            paged(tenants.into_iter(), page)
        }))
    }

    async fn update_tenant(&self, tenant: &Tenant) -> IamResult<()> {
        self.with(|s| {
            if s
                .tenants
                .iter()
                .any(|t| t.id != tenant.id && t.document == tenant.document)
            {
                return Err(IamError::DocumentTaken);
            }
            if let Some(existing) = s.tenants.iter_mut().find(|t| t.id == tenant.id) {
                *existing = tenant.clone();
            }
            Ok(())
        })
    }

    async fn delete_tenant(&self, id: TenantId) -> IamResult<bool> {
        Ok(self.with(|s| {
            let before = s.tenants.len();
            s.tenants.retain(|t| t.id != id);
            let removed: Vec<UserId> = s
                .users
                .iter()
                .filter(|u| u.tenant_id == Some(id))
                .map(|u| u.id)
                .collect();
            s.users.retain(|u| u.tenant_id != Some(id));
            s.tokens.retain(|t| !removed.contains(&t.user_id));
            s.tenants.len() != before
        }))
    }
}

impl UserRepository for MemoryRepository {
    async fn create_user(&self, user: &User) -> IamResult<()> {
        check_tenant_binding(user.role, user.tenant_id)?;
        self.with(|s| {
            if s.users.iter().any(|u| u.email == user.email) {
                return Err(IamError::EmailTaken);
            }
            if let Some(tenant_id) = user.tenant_id {
                if !s.tenants.iter().any(|t| t.id == tenant_id) {
                    return Err(IamError::TenantNotFound);
                }
            }
            s.users.push(user.clone());
            Ok(())
        })
    }

    async fn find_user_by_id(&self, id: UserId) -> IamResult<Option<User>> {
        Ok(self.with(|s| s.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn find_user_by_email(&self, email: &Email) -> IamResult<Option<User>> {
        Ok(self.with(|s| s.users.iter().find(|u| u.email == *email).cloned()))
    }

    async fn list_users(&self, tenant_id: Option<TenantId>, page: Page) -> IamResult<Vec<User>> {
        Ok(self.with(|s| {
            let mut users: Vec<User> = s
                .users
                .iter()
                .filter(|u| tenant_id.is_none() || u.tenant_id == tenant_id)
                .cloned()
                .collect();
            users.sort_by_key(|u| u.created_at);
            paged(users.into_iter(), page)
        }))
    }

    async fn update_user(&self, user: &User) -> IamResult<()> {
        check_tenant_binding(user.role, user.tenant_id)?;
        self.with(|s| {
            if s
                .users
                .iter()
                .any(|u| u.id != user.id && u.email == user.email)
            {
                return Err(IamError::EmailTaken);
            }
            if let Some(existing) = s.users.iter_mut().find(|u| u.id == user.id) {
                *existing = user.clone();
            }
            Ok(())
        })
    }

    async fn update_password(&self, id: UserId, password_hash: &HashedPassword) -> IamResult<()> {
        self.with(|s| {
            if let Some(user) = s.users.iter_mut().find(|u| u.id == id) {
                user.password_hash = password_hash.clone();
                user.updated_at = Utc::now();
            }
        });
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> IamResult<bool> {
        Ok(self.with(|s| {
            let before = s.users.len();
            s.users.retain(|u| u.id != id);
            s.tokens.retain(|t| t.user_id != id);
            s.users.len() != before
        }))
    }
}

impl AccessTokenRepository for MemoryRepository {
    async fn create_access_token(&self, token: &AccessToken) -> IamResult<()> {
        self.with(|s| {
            if s.tokens.iter().any(|t| t.token == token.token)
                || !s.users.iter().any(|u| u.id == token.user_id)
            {
                return Err(IamError::TokenDuplicated);
            }
            s.tokens.push(token.clone());
            Ok(())
        })
    }

    async fn revoke_access_token(&self, token: &str, now: DateTime<Utc>) -> IamResult<u64> {
        Ok(self.with(|s| {
            let mut affected = 0;
            for t in s.tokens.iter_mut().filter(|t| t.token == token) {
                t.revoke(now);
                affected += 1;
            }
            affected
        }))
    }

    async fn revoke_active_tokens_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> IamResult<u64> {
        Ok(self.with(|s| {
            let mut affected = 0;
            for t in s.tokens.iter_mut().filter(|t| {
                t.user_id == user_id && t.revoked_at.is_none() && t.expires_at > now
            }) {
                t.revoke(now);
                affected += 1;
            }
            affected
        }))
    }
}

impl SessionRepository for MemoryRepository {
    async fn find_login_by_token(&self, token: &str) -> IamResult<Option<SessionRecord>> {
        Ok(self.with(|s| {
            let access_token = s.tokens.iter().find(|t| t.token == token)?.clone();
            let user = s
                .users
                .iter()
                .find(|u| u.id == access_token.user_id)
                .cloned();
            let tenant = user
                .as_ref()
                .and_then(|u| u.tenant_id)
                .and_then(|id| s.tenants.iter().find(|t| t.id == id).cloned());
            Some(SessionRecord {
                access_token,
                user,
                tenant,
            })
        }))
    }
}

impl ActivityLogRepository for MemoryRepository {
    async fn save_access_log(&self, entry: &AccessLogEntry) -> IamResult<()> {
        self.with(|s| s.access_log.push(entry.clone()));
        Ok(())
    }

    async fn save_audit_log(&self, entry: &AuditLogEntry) -> IamResult<()> {
        self.with(|s| s.audit_log.push(entry.clone()));
        Ok(())
    }
}

// ============================================================================
// Mailers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl RecordingMailer {
    /// A relay that refuses every message
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send_raw(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub type TestState = IamAppState<MemoryRepository, RecordingMailer>;

/// Argon2 at its minimum cost
pub fn fast_hasher() -> CredentialHasher {
    CredentialHasher::with_params(
        HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
        },
        None,
    )
    .unwrap()
}

pub fn test_config() -> IamConfig {
    IamConfig {
        jwt_access_secret: "test-access-secret".into(),
        jwt_refresh_secret: "test-refresh-secret".into(),
        jwt_issuer: "iam-test".into(),
        otp_ttl: Duration::from_secs(60),
        log_queue_capacity: 64,
        ..Default::default()
    }
}

/// One tenant with an admin and a member, plus a system admin and a
/// second tenant nobody above belongs to
pub struct Fixture {
    pub repo: Arc<MemoryRepository>,
    pub state: TestState,
    pub tenant: Tenant,
    pub other_tenant: Tenant,
    pub system_admin: User,
    pub tenant_admin: User,
    pub tenant_user: User,
    pub colleague: User,
    pub stranger: User,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_mailer(Some(RecordingMailer::default())).await
    }

    pub async fn with_mailer(mailer: Option<RecordingMailer>) -> Self {
        let repo = Arc::new(MemoryRepository::default());
        let config = test_config();
        let (activity, worker) = ActivityLog::new(repo.clone(), config.log_queue_capacity);
        tokio::spawn(worker.run());

        let mut state = IamAppState::new(repo.clone(), config, activity)
            .unwrap()
            .with_hasher(fast_hasher());
        if let Some(mailer) = mailer {
            state = state.with_mailer(mailer);
        }

        let tenant = Tenant::new("Acme", "11.111.111/0001-11").unwrap();
        let other_tenant = Tenant::new("Globex", "22.222.222/0001-22").unwrap();
        repo.create_tenant(&tenant).await.unwrap();
        repo.create_tenant(&other_tenant).await.unwrap();

        let hasher = fast_hasher();
        let system_admin =
            seed_user(&repo, &hasher, None, "root@iam.test", UserRole::SystemAdmin).await;
        let tenant_admin = seed_user(
            &repo,
            &hasher,
            Some(tenant.id),
            "admin@acme.test",
            UserRole::TenantAdmin,
        )
        .await;
        let tenant_user = seed_user(
            &repo,
            &hasher,
            Some(tenant.id),
            "member@acme.test",
            UserRole::TenantUser,
        )
        .await;
        let colleague = seed_user(
            &repo,
            &hasher,
            Some(tenant.id),
            "colleague@acme.test",
            UserRole::TenantUser,
        )
        .await;
        let stranger = seed_user(
            &repo,
            &hasher,
            Some(other_tenant.id),
            "member@globex.test",
            UserRole::TenantUser,
        )
        .await;

        Self {
            repo,
            state,
            tenant,
            other_tenant,
            system_admin,
            tenant_admin,
            tenant_user,
            colleague,
            stranger,
        }
    }

    pub fn mailer(&self) -> Arc<RecordingMailer> {
        self.state.mailer.clone().unwrap()
    }

    pub fn login_use_case(&self) -> LoginUseCase<MemoryRepository> {
        LoginUseCase::new(
            self.repo.clone(),
            self.state.hasher.clone(),
            self.state.tokens.clone(),
        )
    }

    /// Log in with the seeded password and return the bearer token
    pub async fn login(&self, user: &User) -> String {
        self.login_use_case()
            .execute(LoginInput {
                email: user.email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap()
            .access_token
            .token
    }
}

async fn seed_user(
    repo: &MemoryRepository,
    hasher: &CredentialHasher,
    tenant_id: Option<TenantId>,
    email: &str,
    role: UserRole,
) -> User {
    let password = ClearTextPassword::new(PASSWORD.to_string(), 8).unwrap();
    let name = email.split('@').next().unwrap_or(email).to_string();
    let user = User::new(
        tenant_id,
        name,
        Email::new(email).unwrap(),
        hasher.hash(&password).unwrap(),
        role,
    )
    .unwrap();
    repo.create_user(&user).await.unwrap();
    user
}

/// Poll until `check` holds; the activity worker writes asynchronously
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
