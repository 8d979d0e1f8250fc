//! Change Password via OTP Use Case

use platform::crypto::constant_time_eq;
use platform::password::{ClearTextPassword, CredentialHasher};
use std::sync::Arc;

use crate::application::credentials::hash_password;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::Email;
use crate::error::{IamError, IamResult};
use crate::infra::otp_store::OtpStore;

/// Reset password input
pub struct ResetPasswordInput {
    pub email: String,
    pub otp: String,
    pub password: String,
}

/// Change password via OTP use case
///
/// A wrong or missing code leaves both the cache and the user untouched.
/// A matching code is consumed before the password is written, so it can
/// be used once even under concurrent submissions.
pub struct ResetPasswordUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    otp: OtpStore,
    hasher: Arc<CredentialHasher>,
    min_password_length: usize,
}

impl<R> ResetPasswordUseCase<R>
where
    R: UserRepository,
{
    pub fn new(
        repo: Arc<R>,
        otp: OtpStore,
        hasher: Arc<CredentialHasher>,
        min_password_length: usize,
    ) -> Self {
        Self {
            repo,
            otp,
            hasher,
            min_password_length,
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> IamResult<()> {
        let email = Email::new(input.email)?;
        let password = ClearTextPassword::new(input.password, self.min_password_length)?;
        let submitted = input.otp.trim();
        if submitted.is_empty() {
            return Err(IamError::OtpWrong);
        }

        let matches = |code: &str| constant_time_eq(code.as_bytes(), submitted.as_bytes());

        match self.otp.get(&email).await {
            Some(code) if matches(&code) => {}
            _ => return Err(IamError::OtpWrong),
        }
        match self.otp.take(&email).await {
            Some(code) if matches(&code) => {}
            // Lost the race to a concurrent reset, or the code was replaced
            _ => return Err(IamError::OtpWrong),
        }

        let user = self
            .repo
            .find_user_by_email(&email)
            .await?
            .ok_or(IamError::UserNotFound)?;

        let password_hash = hash_password(&self.hasher, password).await?;
        self.repo.update_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed via OTP");
        Ok(())
    }
}
