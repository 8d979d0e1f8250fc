//! IAM Error Types
//!
//! IAM-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. [`IamError::kind`] is the one place
//! where a failure is mapped to a boundary status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{
    app_error::{AppError, Cause},
    kind::ErrorKind,
};
use platform::mailer::MailError;
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

use crate::application::config::InvalidConfig;
use crate::application::token_issuer::TokenIssuerError;

/// IAM-specific result type alias
pub type IamResult<T> = Result<T, IamError>;

/// Why a bearer token did not resolve to a login
///
/// Every variant is rejected the same way at the boundary; the distinction
/// only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    /// No usable `Authorization: Bearer` header
    Missing,
    /// No access token row matches
    NotFound,
    /// Token row exists but its user is gone or disabled
    Invalid,
    /// `now >= expires_at`
    Expired,
    /// Explicitly revoked by logout or a newer login
    Revoked,
}

/// IAM-specific error variants
#[derive(Debug, Error)]
pub enum IamError {
    /// Unknown email or password mismatch (indistinguishable on purpose)
    #[error("error when logging in")]
    WrongCredentials,

    /// Freshly issued token collided with an existing row
    #[error("error when logging in")]
    TokenDuplicated,

    /// Bearer token could not be resolved
    #[error("invalid or expired token")]
    Session(SessionRejection),

    /// Logout did not revoke anything
    #[error("user not authorized")]
    LogoutFailed,

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// An OTP is already outstanding for this email
    #[error("otp code already exists")]
    OtpAlreadyExists,

    /// OTP absent, expired or mismatched
    #[error("otp code wrong")]
    OtpWrong,

    #[error("user not found")]
    UserNotFound,

    #[error("tenant not found")]
    TenantNotFound,

    #[error("email already exists")]
    EmailTaken,

    #[error("document already exists")]
    DocumentTaken,

    /// Request payload or parameters failed validation
    #[error("{message}")]
    InvalidInput { message: String, causes: Vec<Cause> },

    /// No mailer was configured at startup
    #[error("mailer not initialized")]
    MailerUnavailable,

    /// The mail relay refused or could not be reached
    #[error("error sending otp mail")]
    MailDelivery(#[source] MailError),

    /// The operating system RNG failed
    #[error("internal server error")]
    OtpGeneration(String),

    #[error("internal server error")]
    PasswordHash(#[source] PasswordHashError),

    #[error("internal server error")]
    Token(#[from] TokenIssuerError),

    /// Settings rejected while building the services
    #[error("internal server error")]
    Config(#[from] InvalidConfig),

    #[error("internal server error")]
    Database(#[from] sqlx::Error),

    #[error("internal server error")]
    Internal(String),
}

impl IamError {
    /// Validation failure with a general message
    pub fn invalid(message: impl Into<String>) -> Self {
        IamError::InvalidInput {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Validation failure pinned to one input field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        IamError::InvalidInput {
            message: "invalid input data".to_string(),
            causes: vec![Cause::new(field, message)],
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        IamError::Forbidden(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IamError::WrongCredentials | IamError::UserNotFound | IamError::TenantNotFound => {
                ErrorKind::NotFound
            }
            IamError::TokenDuplicated
            | IamError::OtpAlreadyExists
            | IamError::EmailTaken
            | IamError::DocumentTaken => ErrorKind::Conflict,
            IamError::Session(_)
            | IamError::LogoutFailed
            | IamError::Forbidden(_)
            | IamError::OtpWrong => ErrorKind::Forbidden,
            IamError::InvalidInput { .. } => ErrorKind::BadRequest,
            IamError::MailerUnavailable
            | IamError::MailDelivery(_)
            | IamError::OtpGeneration(_)
            | IamError::PasswordHash(_)
            | IamError::Token(_)
            | IamError::Config(_)
            | IamError::Database(_)
            | IamError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let error = AppError::new(self.kind(), self.to_string());
        match self {
            IamError::InvalidInput { causes, .. } => error.with_causes(causes.iter().cloned()),
            IamError::MailerUnavailable => {
                error.with_cause(Cause::new("Mailer", "mailer not initialized"))
            }
            IamError::MailDelivery(_) => error.with_cause(Cause::new("Mailer", "mail delivery failed")),
            _ => error,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            IamError::Database(e) => {
                tracing::error!(error = %e, "IAM database error");
            }
            IamError::PasswordHash(e) => {
                tracing::error!(error = %e, "Password hashing failed");
            }
            IamError::Token(e) => {
                tracing::error!(error = %e, "Token issuer failure");
            }
            IamError::Config(e) => {
                tracing::error!(error = %e, "Invalid IAM configuration");
            }
            IamError::MailDelivery(e) => {
                tracing::error!(error = %e, "OTP mail delivery failed");
            }
            IamError::MailerUnavailable => {
                tracing::error!("OTP requested but no mailer is configured");
            }
            IamError::OtpGeneration(msg) => {
                tracing::error!(error = %msg, "OTP generation failed");
            }
            IamError::Internal(msg) => {
                tracing::error!(message = %msg, "IAM internal error");
            }
            IamError::WrongCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            IamError::Session(reason) => {
                tracing::warn!(reason = ?reason, "Bearer token rejected");
            }
            IamError::OtpWrong => {
                tracing::warn!("Wrong OTP code submitted");
            }
            IamError::Forbidden(msg) => {
                tracing::warn!(message = %msg, "Access denied");
            }
            _ => {
                tracing::debug!(error = %self, "IAM error");
            }
        }
    }
}

impl IntoResponse for IamError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<PasswordPolicyError> for IamError {
    fn from(err: PasswordPolicyError) -> Self {
        IamError::invalid_field("password", err.to_string())
    }
}

impl From<PasswordHashError> for IamError {
    fn from(err: PasswordHashError) -> Self {
        IamError::PasswordHash(err)
    }
}
