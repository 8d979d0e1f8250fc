//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};
use platform::password::HashedPassword;

use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::{IamError, IamResult};

/// User entity
///
/// Tenant-bound roles always carry a tenant and system admins never do;
/// [`User::new`] and [`User::apply`] refuse to build a user that breaks
/// this.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// `None` only for system admins
    pub tenant_id: Option<TenantId>,
    pub name: String,
    /// Globally unique, lowercased
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: UserRole,
    /// Disabled users cannot log in
    pub live: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new live user
    pub fn new(
        tenant_id: Option<TenantId>,
        name: String,
        email: Email,
        password_hash: HashedPassword,
        role: UserRole,
    ) -> IamResult<Self> {
        check_tenant_binding(role, tenant_id)?;
        let name = validate_name(&name)?;
        let now = Utc::now();

        Ok(Self {
            id: UserId::new(),
            tenant_id,
            name,
            email,
            password_hash,
            role,
            live: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check if user can login
    pub fn can_login(&self) -> bool {
        self.live
    }

    pub fn belongs_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id == Some(tenant_id)
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: UserPatch) -> IamResult<()> {
        let role = patch.role.unwrap_or(self.role);
        check_tenant_binding(role, self.tenant_id)?;

        if let Some(name) = patch.name {
            self.name = validate_name(&name)?;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password_hash) = patch.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(live) = patch.live {
            self.live = live;
        }
        self.role = role;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial user update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub password_hash: Option<HashedPassword>,
    pub role: Option<UserRole>,
    pub live: Option<bool>,
}

/// A role and tenant that may be stored together
pub fn check_tenant_binding(role: UserRole, tenant_id: Option<TenantId>) -> IamResult<()> {
    match (role.requires_tenant(), tenant_id) {
        (true, None) => Err(IamError::invalid_field(
            "role",
            format!("role {role} requires a tenant"),
        )),
        (false, Some(_)) => Err(IamError::invalid_field(
            "role",
            format!("role {role} cannot belong to a tenant"),
        )),
        _ => Ok(()),
    }
}

fn validate_name(name: &str) -> IamResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(IamError::invalid_field("name", "name is required"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> HashedPassword {
        HashedPassword::from_stored("$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaA")
    }

    fn email() -> Email {
        Email::new("ana@example.com").unwrap()
    }

    #[test]
    fn test_tenant_roles_need_tenant() {
        assert!(User::new(None, "Ana".into(), email(), hash(), UserRole::TenantUser).is_err());
        assert!(User::new(None, "Ana".into(), email(), hash(), UserRole::SystemAdmin).is_ok());

        let tenant = TenantId::new();
        let user =
            User::new(Some(tenant), " Ana ".into(), email(), hash(), UserRole::TenantAdmin).unwrap();
        assert_eq!(user.name, "Ana");
        assert!(user.live);
        assert!(user.belongs_to(tenant));
        assert!(!user.belongs_to(TenantId::new()));
    }

    #[test]
    fn test_apply_patch() {
        let mut user = User::new(
            Some(TenantId::new()),
            "Ana".into(),
            email(),
            hash(),
            UserRole::TenantUser,
        )
        .unwrap();

        user.apply(UserPatch {
            name: Some("Ana Maria".into()),
            live: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(user.name, "Ana Maria");
        assert!(!user.can_login());
        assert_eq!(user.role, UserRole::TenantUser);
    }

    #[test]
    fn test_apply_rejects_blank_name() {
        let mut user =
            User::new(None, "Root".into(), email(), hash(), UserRole::SystemAdmin).unwrap();
        let patch = UserPatch {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(user.apply(patch).is_err());
        assert_eq!(user.name, "Root");
    }

    #[test]
    fn test_system_admin_cannot_belong_to_tenant() {
        let err = User::new(
            Some(TenantId::new()),
            "Ana".into(),
            email(),
            hash(),
            UserRole::SystemAdmin,
        )
        .unwrap_err();
        assert!(matches!(err, IamError::InvalidInput { ref causes, .. } if causes[0].field == "role"));

        let mut user = User::new(
            Some(TenantId::new()),
            "Ana".into(),
            email(),
            hash(),
            UserRole::TenantAdmin,
        )
        .unwrap();
        let patch = UserPatch {
            role: Some(UserRole::SystemAdmin),
            ..Default::default()
        };
        assert!(user.apply(patch).is_err());
        assert_eq!(user.role, UserRole::TenantAdmin);
    }

    #[test]
    fn test_apply_rejects_tenant_role_without_tenant() {
        let mut user =
            User::new(None, "Root".into(), email(), hash(), UserRole::SystemAdmin).unwrap();
        let patch = UserPatch {
            role: Some(UserRole::TenantUser),
            ..Default::default()
        };
        assert!(user.apply(patch).is_err());
        assert_eq!(user.role, UserRole::SystemAdmin);
    }
}
