//! User email
//!
//! Emails are unique across all tenants and key the OTP cache, so they are
//! trimmed and lowercased before anything compares them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IamError, IamResult};

const MAX_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize and check the shape `local@domain.tld`
    pub fn new(raw: impl AsRef<str>) -> IamResult<Self> {
        let email = raw.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(IamError::invalid_field("email", "email is required"));
        }
        if email.len() > MAX_LEN {
            return Err(IamError::invalid_field(
                "email",
                format!("email must have at most {MAX_LEN} characters"),
            ));
        }
        if !well_formed(&email) {
            return Err(IamError::invalid_field("email", "must be a valid email"));
        }

        Ok(Self(email))
    }

    /// Trust a value read back from storage
    pub fn from_db(email: String) -> Self {
        Self(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn well_formed(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let labels_ok = domain.split('.').count() >= 2
        && domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    !local.is_empty() && local.len() <= MAX_LOCAL_LEN && !local.contains(char::is_whitespace) && labels_ok
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
