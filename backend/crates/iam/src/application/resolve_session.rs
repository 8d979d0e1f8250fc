//! Resolve Session Use Case

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::entity::{Login, RequestMetadata, TokenState};
use crate::domain::repository::SessionRepository;
use crate::error::{IamError, IamResult, SessionRejection};

/// Turns a bearer token into the caller's [`Login`]
pub struct ResolveSessionUseCase<R>
where
    R: SessionRepository,
{
    repo: Arc<R>,
}

impl<R> ResolveSessionUseCase<R>
where
    R: SessionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, token: &str, metadata: RequestMetadata) -> IamResult<Login> {
        self.execute_at(token, metadata, Utc::now()).await
    }

    /// Resolve against an explicit clock
    pub async fn execute_at(
        &self,
        token: &str,
        metadata: RequestMetadata,
        now: DateTime<Utc>,
    ) -> IamResult<Login> {
        let record = self
            .repo
            .find_login_by_token(token)
            .await?
            .ok_or(IamError::Session(SessionRejection::NotFound))?;

        let user = record
            .user
            .ok_or(IamError::Session(SessionRejection::Invalid))?;

        match record.access_token.state_at(now) {
            TokenState::Active => {}
            TokenState::Expired => return Err(IamError::Session(SessionRejection::Expired)),
            TokenState::Revoked => return Err(IamError::Session(SessionRejection::Revoked)),
        }

        // Disabling a user cuts off tokens issued before the change
        if !user.can_login() {
            return Err(IamError::Session(SessionRejection::Invalid));
        }

        Ok(Login {
            user,
            tenant: record.tenant,
            access_token: record.access_token,
            metadata,
        })
    }
}
