//! Login Use Case

use chrono::Utc;
use platform::password::{ClearTextPassword, CredentialHasher, PasswordHashError};
use std::sync::Arc;

use crate::application::credentials::verify_password;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::entity::{AccessToken, User};
use crate::domain::repository::{AccessTokenRepository, UserRepository};
use crate::domain::value_object::Email;
use crate::error::{IamError, IamResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub access_token: AccessToken,
}

/// Login use case
///
/// Every credential failure (unknown email, wrong password, disabled
/// account, unreadable stored hash) surfaces as the same
/// [`IamError::WrongCredentials`].
pub struct LoginUseCase<R>
where
    R: UserRepository + AccessTokenRepository,
{
    repo: Arc<R>,
    hasher: Arc<CredentialHasher>,
    tokens: Arc<TokenIssuer>,
}

impl<R> LoginUseCase<R>
where
    R: UserRepository + AccessTokenRepository,
{
    pub fn new(repo: Arc<R>, hasher: Arc<CredentialHasher>, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            repo,
            hasher,
            tokens,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> IamResult<LoginOutput> {
        let email = Email::new(input.email).map_err(|_| IamError::WrongCredentials)?;
        let password = ClearTextPassword::for_verification(input.password);

        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            // Burn the same hashing time as a real mismatch
            let _ = verify_password(&self.hasher, self.hasher.decoy().clone(), password).await;
            return Err(IamError::WrongCredentials);
        };

        match verify_password(&self.hasher, user.password_hash.clone(), password).await {
            Ok(()) => {}
            Err(PasswordHashError::Mismatch) => return Err(IamError::WrongCredentials),
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Stored password hash could not be verified");
                return Err(IamError::WrongCredentials);
            }
        }

        if !user.can_login() {
            tracing::warn!(user_id = %user.id, "Login attempt on disabled user");
            return Err(IamError::WrongCredentials);
        }

        let issued = self.tokens.issue_access_token(user.id, user.tenant_id)?;

        // Single active session; a failure here must not block the login
        if let Err(e) = self
            .repo
            .revoke_active_tokens_for_user(user.id, Utc::now())
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to revoke previous access tokens");
        }

        let access_token = AccessToken::new(user.id, issued.token, issued.expires_at);
        self.repo.create_access_token(&access_token).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutput { user, access_token })
    }
}
