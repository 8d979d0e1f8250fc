//! User Service

use kernel::id::UserId;
use platform::password::{ClearTextPassword, CredentialHasher};
use std::sync::Arc;

use crate::application::credentials::hash_password;
use crate::domain::entity::{User, UserPatch, check_tenant_binding};
use crate::domain::repository::{TenantRepository, UserRepository};
use crate::domain::value_object::{Email, Page, TenantLookup, UserLookup, UserRole};
use crate::error::{IamError, IamResult};

/// Create user input
pub struct CreateUserInput {
    pub tenant: TenantLookup,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Partial user update as requested; `None` leaves a field untouched
#[derive(Default)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub live: Option<bool>,
}

/// User CRUD; authorization happens before these calls
pub struct UserService<R>
where
    R: TenantRepository + UserRepository,
{
    repo: Arc<R>,
    hasher: Arc<CredentialHasher>,
    min_password_length: usize,
}

impl<R> UserService<R>
where
    R: TenantRepository + UserRepository,
{
    pub fn new(repo: Arc<R>, hasher: Arc<CredentialHasher>, min_password_length: usize) -> Self {
        Self {
            repo,
            hasher,
            min_password_length,
        }
    }

    pub async fn create(&self, input: CreateUserInput) -> IamResult<User> {
        let email = Email::new(input.email)?;
        let password = ClearTextPassword::new(input.password, self.min_password_length)?;

        let tenant = self
            .repo
            .find_tenant(&input.tenant)
            .await?
            .ok_or(IamError::TenantNotFound)?;
        check_tenant_binding(input.role, Some(tenant.id))?;

        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(IamError::EmailTaken);
        }

        let password_hash = hash_password(&self.hasher, password).await?;
        let user = User::new(Some(tenant.id), input.name, email, password_hash, input.role)?;
        self.repo.create_user(&user).await?;

        tracing::info!(user_id = %user.id, tenant_id = %tenant.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn find(&self, lookup: &UserLookup) -> IamResult<User> {
        let user = match lookup {
            UserLookup::Id(id) => self.repo.find_user_by_id(*id).await?,
            UserLookup::Email(email) => self.repo.find_user_by_email(email).await?,
        };
        user.ok_or(IamError::UserNotFound)
    }

    /// `None` lists every tenant's users
    pub async fn list(&self, tenant: Option<&TenantLookup>, page: Page) -> IamResult<Vec<User>> {
        let tenant_id = match tenant {
            Some(lookup) => Some(
                self.repo
                    .find_tenant(lookup)
                    .await?
                    .ok_or(IamError::TenantNotFound)?
                    .id,
            ),
            None => None,
        };
        self.repo.list_users(tenant_id, page).await
    }

    /// Apply an already-authorized patch to `user`
    pub async fn update(&self, mut user: User, input: UpdateUserInput) -> IamResult<User> {
        let email = non_blank(input.email).map(Email::new).transpose()?;
        let password = non_blank(input.password)
            .map(|raw| ClearTextPassword::new(raw, self.min_password_length))
            .transpose()?;
        check_tenant_binding(input.role.unwrap_or(user.role), user.tenant_id)?;

        if let Some(email) = &email {
            if *email != user.email && self.repo.find_user_by_email(email).await?.is_some() {
                return Err(IamError::EmailTaken);
            }
        }

        let password_hash = match password {
            Some(password) => Some(hash_password(&self.hasher, password).await?),
            None => None,
        };

        user.apply(UserPatch {
            name: non_blank(input.name),
            email,
            password_hash,
            role: input.role,
            live: input.live,
        })?;
        self.repo.update_user(&user).await?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    pub async fn delete(&self, id: UserId) -> IamResult<()> {
        if !self.repo.delete_user(id).await? {
            return Err(IamError::UserNotFound);
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

/// Empty strings in a patch body mean "leave unchanged"
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
