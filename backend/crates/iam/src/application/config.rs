//! IAM settings
//!
//! Built by the binary from the environment; tests construct it directly.

use std::time::Duration;

/// Default access token lifetime (1 hour)
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
/// OTP lifetime, absolute from write
pub const DEFAULT_OTP_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_OTP_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_OTP_LENGTH: usize = 6;
/// Shortest code worth guessing against
pub const MIN_OTP_LENGTH: usize = 4;
pub const MAX_OTP_LENGTH: usize = 12;

/// The operating system RNG could not produce a secret
#[derive(Debug, thiserror::Error)]
#[error("failed to generate random secret: {0}")]
pub struct RandomSecretError(String);

/// A setting the IAM services cannot run with
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfig {
    #[error("otp length must be between {MIN_OTP_LENGTH} and {MAX_OTP_LENGTH}, got {0}")]
    OtpLength(usize),
    #[error("otp ttl must be greater than zero")]
    ZeroOtpTtl,
}

/// IAM application configuration
#[derive(Clone)]
pub struct IamConfig {
    /// HMAC secret for access tokens
    pub jwt_access_secret: String,
    /// HMAC secret for refresh tokens
    pub jwt_refresh_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl: Duration,
    pub otp_length: usize,
    pub otp_ttl: Duration,
    pub otp_sweep_interval: Duration,
    /// Minimum length when creating or updating a user
    pub min_password_length: usize,
    /// Minimum length when resetting through an OTP
    pub min_reset_password_length: usize,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Bound of the activity log queue
    pub log_queue_capacity: usize,
}

impl Default for IamConfig {
    fn default() -> Self {
        Self {
            jwt_access_secret: String::new(),
            jwt_refresh_secret: String::new(),
            jwt_issuer: "iam".to_string(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            otp_length: DEFAULT_OTP_LENGTH,
            otp_ttl: DEFAULT_OTP_TTL,
            otp_sweep_interval: DEFAULT_OTP_SWEEP_INTERVAL,
            min_password_length: 8,
            min_reset_password_length: 6,
            password_pepper: None,
            log_queue_capacity: 1024,
        }
    }
}

impl IamConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if !(MIN_OTP_LENGTH..=MAX_OTP_LENGTH).contains(&self.otp_length) {
            return Err(InvalidConfig::OtpLength(self.otp_length));
        }
        if self.otp_ttl.is_zero() {
            return Err(InvalidConfig::ZeroOtpTtl);
        }
        Ok(())
    }

    /// Create config with random token secrets (for development)
    pub fn with_random_secrets() -> Result<Self, RandomSecretError> {
        Ok(Self {
            jwt_access_secret: random_secret()?,
            jwt_refresh_secret: random_secret()?,
            ..Default::default()
        })
    }

    /// Create config for development
    pub fn development() -> Result<Self, RandomSecretError> {
        Ok(Self {
            jwt_issuer: "iam-dev".to_string(),
            ..Self::with_random_secrets()?
        })
    }
}

impl std::fmt::Debug for IamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamConfig")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("otp_length", &self.otp_length)
            .field("otp_ttl", &self.otp_ttl)
            .field("otp_sweep_interval", &self.otp_sweep_interval)
            .field("min_password_length", &self.min_password_length)
            .field("min_reset_password_length", &self.min_reset_password_length)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("log_queue_capacity", &self.log_queue_capacity)
            .finish_non_exhaustive()
    }
}

fn random_secret() -> Result<String, RandomSecretError> {
    let bytes = platform::crypto::random_bytes(32)
        .map_err(|e| RandomSecretError(e.to_string()))?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}
