//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub(crate) mod credentials;
pub mod create_otp;
pub mod login;
pub mod logout;
pub mod reset_password;
pub mod resolve_session;
pub mod tenant;
pub mod token_issuer;
pub mod user;

// Re-exports
pub use config::{IamConfig, InvalidConfig};
pub use create_otp::CreateOtpUseCase;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use resolve_session::ResolveSessionUseCase;
pub use tenant::{CreateTenantInput, TenantService};
pub use token_issuer::{TokenIssuer, TokenIssuerError};
pub use user::{CreateUserInput, UpdateUserInput, UserService};
