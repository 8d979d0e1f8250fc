//! Access Token Entity
//!
//! Persisted bearer credential. Revocation is soft: the row stays and is
//! marked revoked with its expiry pulled to the revocation instant.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

/// Lifecycle state of an access token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Expired,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub user_id: UserId,
    /// Opaque, globally unique
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(user_id: UserId, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            token,
            expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        }
    }

    /// State at `now`; expiry is exclusive (`now >= expires_at` is expired)
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked_at.is_some() {
            TokenState::Revoked
        } else if now >= self.expires_at {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    pub fn state(&self) -> TokenState {
        self.state_at(Utc::now())
    }

    /// Soft revoke; revoking twice keeps the first instant
    pub fn revoke(&mut self, now: DateTime<Utc>) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(now);
        }
        if self.expires_at > now {
            self.expires_at = now;
        }
    }
}
