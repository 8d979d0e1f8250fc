//! Domain Layer
//!
//! Contains entities, value objects, the authorization policy and
//! repository traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{AccessToken, Login, Tenant, TokenState, User};
pub use policy::Caller;
pub use repository::{
    AccessTokenRepository, ActivityLogRepository, IamRepository, SessionRepository,
    TenantRepository, UserRepository,
};
