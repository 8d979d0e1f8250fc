use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IamError;

/// Closed set of roles. Every authorization decision matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Platform operator, not bound to a tenant
    SystemAdmin,
    /// Manages users inside one tenant
    TenantAdmin,
    /// Regular member of one tenant
    TenantUser,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [
        UserRole::SystemAdmin,
        UserRole::TenantAdmin,
        UserRole::TenantUser,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            SystemAdmin => "SYSTEM_ADMIN",
            TenantAdmin => "TENANT_ADMIN",
            TenantUser => "TENANT_USER",
        }
    }

    /// Tenant-bound roles must always carry a tenant
    #[inline]
    pub const fn requires_tenant(&self) -> bool {
        use UserRole::*;
        match self {
            SystemAdmin => false,
            TenantAdmin | TenantUser => true,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "SYSTEM_ADMIN" => Some(SystemAdmin),
            "TENANT_ADMIN" => Some(TenantAdmin),
            "TENANT_USER" => Some(TenantUser),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UserRole {
    type Err = IamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::from_code(s.trim())
            .ok_or_else(|| IamError::invalid_field("role", format!("unknown role '{s}'")))
    }
}
