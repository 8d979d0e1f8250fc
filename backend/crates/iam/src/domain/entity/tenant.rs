//! Tenant Entity

use chrono::{DateTime, Utc};
use kernel::id::TenantId;

use crate::error::{IamError, IamResult};

/// Tenant (an organization owning users)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    /// Immutable once created
    pub id: TenantId,
    pub name: String,
    /// Tax/registration document, globally unique
    pub document: String,
    pub live: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new live tenant
    pub fn new(name: &str, document: &str) -> IamResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: TenantId::new(),
            name: required("name", name)?,
            document: required("document", document)?,
            live: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: TenantPatch) -> IamResult<()> {
        let name = patch.name.as_deref().map(|n| required("name", n)).transpose()?;
        let document = patch
            .document
            .as_deref()
            .map(|d| required("document", d))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(document) = document {
            self.document = document;
        }
        if let Some(live) = patch.live {
            self.live = live;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial tenant update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantPatch {
    pub name: Option<String>,
    pub document: Option<String>,
    pub live: Option<bool>,
}

impl TenantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.document.is_none() && self.live.is_none()
    }
}

fn required(field: &'static str, value: &str) -> IamResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IamError::invalid_field(field, format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_validates() {
        let tenant = Tenant::new(" Acme ", " 12.345 ").unwrap();
        assert_eq!(tenant.name, "Acme");
        assert_eq!(tenant.document, "12.345");
        assert!(tenant.live);

        assert!(Tenant::new("", "doc").is_err());
        assert!(Tenant::new("Acme", "  ").is_err());
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut tenant = Tenant::new("Acme", "doc-1").unwrap();
        let id = tenant.id;

        let bad = TenantPatch {
            name: Some("Acme Corp".into()),
            document: Some(" ".into()),
            live: None,
        };
        assert!(tenant.apply(bad).is_err());
        assert_eq!(tenant.name, "Acme");

        let good = TenantPatch {
            name: Some("Acme Corp".into()),
            live: Some(false),
            ..Default::default()
        };
        tenant.apply(good).unwrap();
        assert_eq!(tenant.name, "Acme Corp");
        assert_eq!(tenant.document, "doc-1");
        assert!(!tenant.live);
        assert_eq!(tenant.id, id);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TenantPatch::default().is_empty());
        assert!(
            !TenantPatch {
                live: Some(true),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
