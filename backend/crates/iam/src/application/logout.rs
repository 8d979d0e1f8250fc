//! Logout Use Case

use chrono::Utc;
use std::sync::Arc;

use crate::domain::repository::AccessTokenRepository;
use crate::error::{IamError, IamResult};

/// Logout use case
pub struct LogoutUseCase<R>
where
    R: AccessTokenRepository,
{
    repo: Arc<R>,
}

impl<R> LogoutUseCase<R>
where
    R: AccessTokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Soft-revoke the token; unknown tokens and storage failures are both
    /// reported as [`IamError::LogoutFailed`]
    pub async fn execute(&self, token: &str) -> IamResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IamError::LogoutFailed);
        }

        let revoked = self
            .repo
            .revoke_access_token(token, Utc::now())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to revoke access token");
                IamError::LogoutFailed
            })?;

        if revoked == 0 {
            return Err(IamError::LogoutFailed);
        }

        tracing::info!("Access token revoked");
        Ok(())
    }
}
