//! Credential hashing
//!
//! Passwords are stored as Argon2id PHC strings. The cost parameters are
//! written into every hash, so verification always uses the parameters a
//! hash was created with, not the current defaults. An optional server-wide
//! pepper is fed to Argon2 as its secret key.
//!
//! Clear text only lives inside [`ClearTextPassword`], which is NFKC
//! normalized on construction and wiped on drop.

use std::fmt;

use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// 64 MiB
pub const MEMORY_COST_KIB: u32 = 65_536;
pub const ITERATIONS: u32 = 3;
pub const PARALLELISM: u32 = 2;
pub const OUTPUT_LENGTH: usize = 32;

/// Upper bound in Unicode scalar values, after normalization
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Why a new password was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("password must have at least {min} characters")]
    TooShort { min: usize, actual: usize },

    #[error("password must have at most {max} characters")]
    TooLong { max: usize, actual: usize },

    #[error("password must not be blank")]
    Blank,

    #[error("password must not contain control characters")]
    ControlCharacter,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("argon2 hashing failed: {0}")]
    HashingFailed(String),

    #[error("argon2 rejected the cost parameters: {0}")]
    InvalidParams(String),

    /// The stored value is not a usable PHC string
    #[error("stored password hash is malformed")]
    InvalidHashFormat,

    #[error("password does not match")]
    Mismatch,
}

/// Normalized clear text password, zeroized on drop
///
/// Not `Clone`; the `Debug` output never shows the content.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// assert!(ClearTextPassword::new("correct horse".to_string(), 8).is_ok());
/// assert!(ClearTextPassword::new("short".to_string(), 8).is_err());
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Password chosen by a user; the length policy is counted in characters
    /// and tab/newline are the only control characters allowed
    pub fn new(raw: String, min_length: usize) -> Result<Self, PasswordPolicyError> {
        let password = Self::for_verification(raw);
        password.check_policy(min_length)?;
        Ok(password)
    }

    /// Password presented at login; normalized but never rejected
    pub fn for_verification(mut raw: String) -> Self {
        let normalized = raw.nfkc().collect::<String>();
        raw.zeroize();
        Self(normalized)
    }

    fn check_policy(&self, min_length: usize) -> Result<(), PasswordPolicyError> {
        if self.0.trim().is_empty() {
            return Err(PasswordPolicyError::Blank);
        }
        let actual = self.0.chars().count();
        if actual < min_length {
            return Err(PasswordPolicyError::TooShort {
                min: min_length,
                actual,
            });
        }
        if actual > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual,
            });
        }
        if self.0.chars().any(|c| c.is_control() && !matches!(c, '\t' | '\n')) {
            return Err(PasswordPolicyError::ControlCharacter);
        }
        Ok(())
    }

    fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClearTextPassword(<redacted>)")
    }
}

/// Stored form: `$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap a value read back from storage
    ///
    /// It is only parsed on verification, which reports
    /// [`PasswordHashError::InvalidHashFormat`] for garbage.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc_string(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(<phc>)")
    }
}

/// Argon2id cost parameters used for new hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: MEMORY_COST_KIB,
            iterations: ITERATIONS,
            parallelism: PARALLELISM,
            output_len: OUTPUT_LENGTH,
        }
    }
}

/// Argon2id hasher, built once at startup and shared behind an `Arc`
///
/// ```rust,no_run
/// use platform::password::{ClearTextPassword, CredentialHasher};
///
/// let hasher = CredentialHasher::new(None).unwrap();
/// let password = ClearTextPassword::new("correct horse".to_string(), 8).unwrap();
/// let stored = hasher.hash(&password).unwrap();
/// assert!(hasher.verify(&stored, &password).is_ok());
/// ```
pub struct CredentialHasher {
    params: Params,
    pepper: Option<Zeroizing<Vec<u8>>>,
    /// Hash of random bytes nobody knows, for accounts that do not exist
    decoy: HashedPassword,
}

impl CredentialHasher {
    pub fn new(pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        Self::with_params(HashParams::default(), pepper)
    }

    /// An empty pepper counts as none
    pub fn with_params(
        params: HashParams,
        pepper: Option<Vec<u8>>,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(params.output_len),
        )
        .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;

        let mut hasher = Self {
            params,
            pepper: pepper.filter(|p| !p.is_empty()).map(Zeroizing::new),
            decoy: HashedPassword(String::new()),
        };
        let secret = crate::crypto::random_bytes(32)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
        let unguessable = ClearTextPassword::for_verification(
            secret.iter().map(|b| format!("{b:02x}")).collect(),
        );
        hasher.decoy = hasher.hash(&unguessable)?;
        Ok(hasher)
    }

    /// Stored-hash stand-in with this hasher's cost
    ///
    /// Verifying against it takes as long as a real check and never
    /// succeeds, so a login for an unknown account costs the same as one
    /// with a wrong password.
    pub fn decoy(&self) -> &HashedPassword {
        &self.decoy
    }

    fn engine(&self) -> Result<Argon2<'_>, PasswordHashError> {
        let Some(pepper) = &self.pepper else {
            return Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            ));
        };
        Argon2::new_with_secret(
            pepper,
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
        .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))
    }

    /// Hash with a fresh 16-byte salt
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = self
            .engine()?
            .hash_password(password.expose(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
        Ok(HashedPassword(phc.to_string()))
    }

    /// Constant-time check against a stored hash, using its own parameters
    ///
    /// A wrong password is [`PasswordHashError::Mismatch`]; anything wrong with
    /// the stored value is [`PasswordHashError::InvalidHashFormat`].
    pub fn verify(
        &self,
        stored: &HashedPassword,
        password: &ClearTextPassword,
    ) -> Result<(), PasswordHashError> {
        let parsed = PasswordHash::new(stored.as_phc_string())
            .map_err(|_| PasswordHashError::InvalidHashFormat)?;

        match self.engine()?.verify_password(password.expose(), &parsed) {
            Ok(()) => Ok(()),
            Err(password_hash::Error::Password) => Err(PasswordHashError::Mismatch),
            Err(_) => Err(PasswordHashError::InvalidHashFormat),
        }
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", &self.params)
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}
