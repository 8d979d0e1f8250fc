//! Error classification
//!
//! Every failure that crosses the HTTP boundary collapses into one
//! [`ErrorKind`], which fixes both the status code and the `error` string of
//! the response body.

use serde::Serialize;

/// Boundary error classes
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::Conflict.status_code(), 409);
/// assert_eq!(ErrorKind::Conflict.as_str(), "conflict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed or rejected input
    BadRequest,
    /// Missing session, bad OTP or insufficient role
    Forbidden,
    /// Unknown tenant, user or credentials
    NotFound,
    /// Unique key clash or OTP already outstanding
    Conflict,
    /// Storage, mailer or hashing failure
    InternalServerError,
}

impl ErrorKind {
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalServerError => 500,
        }
    }

    /// Value of the `error` field; identical to the serde form
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InternalServerError => "internal_server_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ErrorKind; 5] = [
        ErrorKind::BadRequest,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::InternalServerError,
    ];

    #[test]
    fn maps_to_http_status() {
        let codes: Vec<u16> = ALL.iter().map(ErrorKind::status_code).collect();
        assert_eq!(codes, vec![400, 403, 404, 409, 500]);
    }

    #[test]
    fn kind_string_matches_serde() {
        for kind in ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }
}
