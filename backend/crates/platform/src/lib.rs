//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Credential hashing (Argon2id with embedded parameters)
//! - Cryptographic helpers (CSPRNG bytes, numeric one-time codes)
//! - Client header helpers (client IP, bearer token)
//! - Outbound mail (SMTP)

pub mod client;
pub mod crypto;
pub mod mailer;
pub mod password;
