//! Shared kernel for the IAM backend
//!
//! Holds the vocabulary every other crate agrees on: the boundary
//! [`error::app_error::AppError`] with its [`error::kind::ErrorKind`], and
//! typed tenant and user ids.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
