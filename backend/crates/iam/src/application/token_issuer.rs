//! Token Issuer
//!
//! HS256 JWTs. Access tokens carry the user and tenant and expire;
//! refresh tokens are signed with their own secret and never expire.
//! Every token has a random `jti`, so two tokens issued for the same user
//! in the same second still differ.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::application::config::IamConfig;

/// Token issuer errors
#[derive(Debug, Error)]
pub enum TokenIssuerError {
    #[error("JWT access secret is empty")]
    EmptyAccessSecret,

    #[error("JWT refresh secret is empty")]
    EmptyRefreshSecret,

    #[error("JWT issuer is empty")]
    EmptyIssuer,

    #[error("access token expiry must be positive")]
    NonPositiveExpiry,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    /// Absent for system admins
    pub tenant: Option<Uuid>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// Refresh token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub jti: Uuid,
}

/// A signed access token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens; built once at startup and shared
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    issuer: String,
    access_ttl: Duration,
}

impl TokenIssuer {
    /// Fails when a secret or the issuer is empty, or the expiry is not positive
    pub fn new(config: &IamConfig) -> Result<Self, TokenIssuerError> {
        if config.jwt_access_secret.is_empty() {
            return Err(TokenIssuerError::EmptyAccessSecret);
        }
        if config.jwt_refresh_secret.is_empty() {
            return Err(TokenIssuerError::EmptyRefreshSecret);
        }
        if config.jwt_issuer.trim().is_empty() {
            return Err(TokenIssuerError::EmptyIssuer);
        }
        let access_ttl = Duration::from_std(config.access_token_ttl)
            .ok()
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(TokenIssuerError::NonPositiveExpiry)?;

        let access = config.jwt_access_secret.as_bytes();
        let refresh = config.jwt_refresh_secret.as_bytes();

        Ok(Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            issuer: config.jwt_issuer.clone(),
            access_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn issue_access_token(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
    ) -> Result<IssuedToken, TokenIssuerError> {
        self.issue_access_token_at(user_id, tenant_id, Utc::now())
    }

    fn issue_access_token_at(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenIssuerError> {
        let expires_at = now + self.access_ttl;
        let claims = AccessClaims {
            sub: user_id.into_uuid(),
            tenant: tenant_id.map(|id| id.into_uuid()),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenIssuerError> {
        let claims = RefreshClaims {
            sub: user_id.into_uuid(),
            iss: self.issuer.clone(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.refresh_encoding,
        )?)
    }

    /// Verify signature, issuer and expiry
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, TokenIssuerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Ok(decode::<AccessClaims>(token, &self.access_decoding, &validation)?.claims)
    }

    /// Verify signature and issuer
    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenIssuerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "iss"]);
        validation.validate_exp = false;

        Ok(decode::<RefreshClaims>(token, &self.refresh_decoding, &validation)?.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IamConfig {
        IamConfig {
            jwt_access_secret: "access-secret".into(),
            jwt_refresh_secret: "refresh-secret".into(),
            jwt_issuer: "iam-test".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let empty_access = IamConfig {
            jwt_access_secret: String::new(),
            ..config()
        };
        assert!(matches!(
            TokenIssuer::new(&empty_access),
            Err(TokenIssuerError::EmptyAccessSecret)
        ));

        let empty_refresh = IamConfig {
            jwt_refresh_secret: String::new(),
            ..config()
        };
        assert!(matches!(
            TokenIssuer::new(&empty_refresh),
            Err(TokenIssuerError::EmptyRefreshSecret)
        ));

        let empty_issuer = IamConfig {
            jwt_issuer: " ".into(),
            ..config()
        };
        assert!(matches!(
            TokenIssuer::new(&empty_issuer),
            Err(TokenIssuerError::EmptyIssuer)
        ));

        let zero_ttl = IamConfig {
            access_token_ttl: std::time::Duration::ZERO,
            ..config()
        };
        assert!(matches!(
            TokenIssuer::new(&zero_ttl),
            Err(TokenIssuerError::NonPositiveExpiry)
        ));
    }

    #[test]
    fn test_access_token_claims() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let user_id = UserId::new();
        let tenant_id = TenantId::new();

        let issued = issuer.issue_access_token(user_id, Some(tenant_id)).unwrap();
        let claims = issuer.decode_access_token(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id.into_uuid());
        assert_eq!(claims.tenant, Some(tenant_id.into_uuid()));
        assert_eq!(claims.iss, "iam-test");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_tokens_are_unique_within_a_second() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let user_id = UserId::new();
        let now = Utc::now();

        let a = issuer.issue_access_token_at(user_id, None, now).unwrap();
        let b = issuer.issue_access_token_at(user_id, None, now).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_decode_rejects_foreign_tokens() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let other = TokenIssuer::new(&IamConfig {
            jwt_access_secret: "another-secret".into(),
            ..config()
        })
        .unwrap();
        let other_issuer = TokenIssuer::new(&IamConfig {
            jwt_issuer: "someone-else".into(),
            ..config()
        })
        .unwrap();

        let forged = other.issue_access_token(UserId::new(), None).unwrap();
        assert!(issuer.decode_access_token(&forged.token).is_err());

        let wrong_iss = other_issuer.issue_access_token(UserId::new(), None).unwrap();
        assert!(issuer.decode_access_token(&wrong_iss.token).is_err());

        assert!(issuer.decode_access_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_decode_rejects_expired() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let issued = issuer
            .issue_access_token_at(UserId::new(), None, Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(issuer.decode_access_token(&issued.token).is_err());
    }

    #[test]
    fn test_refresh_token_uses_its_own_secret() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let user_id = UserId::new();

        let refresh = issuer.issue_refresh_token(user_id).unwrap();
        let claims = issuer.decode_refresh_token(&refresh).unwrap();
        assert_eq!(claims.sub, user_id.into_uuid());

        assert!(issuer.decode_access_token(&refresh).is_err());
    }
}
