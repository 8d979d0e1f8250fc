//! Lookup keys
//!
//! Tenants are addressed by id or by their unique document, users by id or
//! by their unique email.

use kernel::id::{TenantId, UserId};

use crate::domain::value_object::email::Email;
use crate::error::{IamError, IamResult};

/// Placeholders some front-ends send instead of omitting the identifier
const SELF_PLACEHOLDERS: [&str; 3] = ["", "undefined", "null"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantLookup {
    Id(TenantId),
    Document(String),
}

impl TenantLookup {
    /// Build from `?uuid=` / `?document=` query parameters
    ///
    /// `None` when neither is given; both at once is rejected.
    pub fn from_query(uuid: Option<&str>, document: Option<&str>) -> IamResult<Option<Self>> {
        let uuid = uuid.map(str::trim).filter(|s| !s.is_empty());
        let document = document.map(str::trim).filter(|s| !s.is_empty());

        match (uuid, document) {
            (Some(uuid), None) => uuid
                .parse::<TenantId>()
                .map(|id| Some(TenantLookup::Id(id)))
                .map_err(|_| IamError::invalid_field("uuid", "invalid tenant uuid")),
            (None, Some(document)) => Ok(Some(TenantLookup::Document(document.to_string()))),
            (Some(_), Some(_)) => Err(IamError::invalid("provide either uuid or document, not both")),
            (None, None) => Ok(None),
        }
    }

    /// Path segment that is either a tenant uuid or a document
    pub fn from_identifier(identifier: &str) -> IamResult<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(IamError::invalid_field("tenant", "tenant identifier is required"));
        }
        Ok(identifier
            .parse::<TenantId>()
            .map(TenantLookup::Id)
            .unwrap_or_else(|_| TenantLookup::Document(identifier.to_string())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(UserId),
    Email(Email),
}

impl UserLookup {
    /// Path segment that is a user uuid or an email
    ///
    /// Returns `None` when the caller means themselves.
    pub fn from_identifier(identifier: &str) -> IamResult<Option<Self>> {
        let identifier = identifier.trim();
        if SELF_PLACEHOLDERS.contains(&identifier) {
            return Ok(None);
        }
        if let Ok(id) = identifier.parse::<UserId>() {
            return Ok(Some(UserLookup::Id(id)));
        }
        Email::new(identifier).map(|email| Some(UserLookup::Email(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_from_query() {
        let id = TenantId::new();
        assert_eq!(
            TenantLookup::from_query(Some(&id.to_string()), None).unwrap(),
            Some(TenantLookup::Id(id))
        );
        assert_eq!(
            TenantLookup::from_query(None, Some(" 12.345.678/0001-90 ")).unwrap(),
            Some(TenantLookup::Document("12.345.678/0001-90".to_string()))
        );
        assert_eq!(TenantLookup::from_query(None, None).unwrap(), None);
        assert_eq!(TenantLookup::from_query(Some(""), Some("  ")).unwrap(), None);
        assert!(TenantLookup::from_query(Some("not-a-uuid"), None).is_err());
        assert!(TenantLookup::from_query(Some(&id.to_string()), Some("doc")).is_err());
    }

    #[test]
    fn test_tenant_from_identifier() {
        let id = TenantId::new();
        assert_eq!(
            TenantLookup::from_identifier(&id.to_string()).unwrap(),
            TenantLookup::Id(id)
        );
        assert_eq!(
            TenantLookup::from_identifier("ACME-001").unwrap(),
            TenantLookup::Document("ACME-001".to_string())
        );
        assert!(TenantLookup::from_identifier(" ").is_err());
    }

    #[test]
    fn test_user_from_identifier() {
        for placeholder in ["", "undefined", "null", "  "] {
            assert_eq!(UserLookup::from_identifier(placeholder).unwrap(), None);
        }

        let id = UserId::new();
        assert_eq!(
            UserLookup::from_identifier(&id.to_string()).unwrap(),
            Some(UserLookup::Id(id))
        );
        assert_eq!(
            UserLookup::from_identifier("Ana@Example.com").unwrap(),
            Some(UserLookup::Email(Email::new("ana@example.com").unwrap()))
        );
        assert!(UserLookup::from_identifier("ana").is_err());
    }
}
