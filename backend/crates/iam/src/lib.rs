//! IAM (Identity and Access Management) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, authorization policy, repository traits
//! - `application/` - Use cases, CRUD services, token issuer
//! - `infra/` - PostgreSQL repository, OTP cache, activity log worker
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Email + password login issuing one live JWT access token per user
//! - Logout by token, OTP-based password reset delivered by mail
//! - Tenants and users with three roles (SystemAdmin, TenantAdmin, TenantUser)
//! - Access and audit logs written off the request path
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Bearer tokens are looked up server-side; revocation is immediate
//! - Tenant-bound roles are scoped to their own tenant on every operation

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::IamConfig;
pub use error::{IamError, IamResult};
pub use infra::activity_log::{ActivityLog, ActivityLogWorker};
pub use infra::otp_store::OtpStore;
pub use infra::postgres::PgIamRepository;
pub use presentation::handlers::IamAppState;
pub use presentation::router::iam_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
