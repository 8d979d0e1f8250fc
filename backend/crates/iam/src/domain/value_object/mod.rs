//! Value Object Module

pub mod email;
pub mod lookup;
pub mod page;
pub mod user_role;

pub use email::Email;
pub use lookup::{TenantLookup, UserLookup};
pub use page::Page;
pub use user_role::UserRole;
