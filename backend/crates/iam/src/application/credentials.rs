//! Password hashing off the async executor
//!
//! Argon2id with 64 MiB is deliberately slow, so it runs on the blocking pool.

use platform::password::{ClearTextPassword, CredentialHasher, HashedPassword, PasswordHashError};
use std::sync::Arc;

use crate::error::{IamError, IamResult};

pub(crate) async fn hash_password(
    hasher: &Arc<CredentialHasher>,
    password: ClearTextPassword,
) -> IamResult<HashedPassword> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| IamError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(IamError::from)
}

pub(crate) async fn verify_password(
    hasher: &Arc<CredentialHasher>,
    hashed: HashedPassword,
    password: ClearTextPassword,
) -> Result<(), PasswordHashError> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.verify(&hashed, &password))
        .await
        .map_err(|e| PasswordHashError::HashingFailed(format!("verification task failed: {e}")))?
}
