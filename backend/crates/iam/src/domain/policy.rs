//! Authorization Policy
//!
//! Two stages: a role gate per endpoint, then tenant scoping per operation.
//! Scoping functions take what the caller asked for and return what they
//! are actually allowed to touch (a tenant admin's tenant parameter is
//! replaced by their own tenant) or reject the request.

use kernel::id::{TenantId, UserId};

use crate::domain::entity::{Login, TenantPatch, User};
use crate::domain::value_object::{TenantLookup, UserRole};
use crate::error::{IamError, IamResult};

/// What authorization decisions read from an authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: UserRole,
    pub tenant_id: Option<TenantId>,
}

impl From<&Login> for Caller {
    fn from(login: &Login) -> Self {
        Self {
            user_id: login.user_id(),
            role: login.role(),
            tenant_id: login.tenant_id(),
        }
    }
}

impl Caller {
    /// The tenant a tenant-bound caller is confined to
    fn own_tenant(&self) -> IamResult<TenantId> {
        self.tenant_id
            .ok_or_else(|| IamError::forbidden("user is not bound to a tenant"))
    }
}

// ============================================================================
// Role gate
// ============================================================================

/// An empty allow-set admits any authenticated role
pub fn check_role(role: UserRole, allowed: &[UserRole]) -> IamResult<()> {
    if allowed.is_empty() || allowed.contains(&role) {
        Ok(())
    } else {
        Err(IamError::forbidden("user not authorized"))
    }
}

// ============================================================================
// Tenants
// ============================================================================

/// Tenant admins always read their own tenant, whatever they asked for
pub fn scope_tenant_read(
    caller: &Caller,
    requested: Option<TenantLookup>,
) -> IamResult<TenantLookup> {
    match caller.role {
        UserRole::SystemAdmin => {
            requested.ok_or_else(|| IamError::invalid("uuid or document is required"))
        }
        UserRole::TenantAdmin => caller.own_tenant().map(TenantLookup::Id),
        UserRole::TenantUser => Err(IamError::forbidden("user not authorized")),
    }
}

/// Tenant admins are confined to their own tenant and may rename it only
pub fn scope_tenant_update(
    caller: &Caller,
    target: TenantId,
    patch: TenantPatch,
) -> IamResult<(TenantId, TenantPatch)> {
    match caller.role {
        UserRole::SystemAdmin => Ok((target, patch)),
        UserRole::TenantAdmin => {
            let own = caller.own_tenant()?;
            let patch = TenantPatch {
                name: patch.name,
                document: None,
                live: None,
            };
            Ok((own, patch))
        }
        UserRole::TenantUser => Err(IamError::forbidden("user not authorized")),
    }
}

// ============================================================================
// Users
// ============================================================================

pub fn scope_user_create(
    caller: &Caller,
    tenant: TenantLookup,
    role: UserRole,
) -> IamResult<TenantLookup> {
    match caller.role {
        UserRole::SystemAdmin => Ok(tenant),
        UserRole::TenantAdmin => match role {
            UserRole::TenantAdmin | UserRole::TenantUser => caller.own_tenant().map(TenantLookup::Id),
            UserRole::SystemAdmin => Err(IamError::invalid_field(
                "role",
                "role must be TENANT_ADMIN or TENANT_USER",
            )),
        },
        UserRole::TenantUser => Err(IamError::forbidden("user not authorized")),
    }
}

pub fn check_user_read(caller: &Caller, target: &User) -> IamResult<()> {
    match caller.role {
        UserRole::SystemAdmin => Ok(()),
        UserRole::TenantAdmin => same_tenant(caller, target),
        UserRole::TenantUser => is_self(caller, target),
    }
}

/// `None` means every tenant (system admins only)
pub fn scope_user_list(
    caller: &Caller,
    requested: Option<TenantLookup>,
) -> IamResult<Option<TenantLookup>> {
    match caller.role {
        UserRole::SystemAdmin => Ok(requested),
        UserRole::TenantAdmin => caller.own_tenant().map(|id| Some(TenantLookup::Id(id))),
        UserRole::TenantUser => Err(IamError::forbidden("user not authorized")),
    }
}

/// Returns the role change that may actually be applied
///
/// Tenant users can edit themselves but never their role; the requested
/// role is dropped rather than rejected.
pub fn scope_user_update(
    caller: &Caller,
    target: &User,
    requested_role: Option<UserRole>,
) -> IamResult<Option<UserRole>> {
    match caller.role {
        UserRole::SystemAdmin => Ok(requested_role),
        UserRole::TenantAdmin => {
            same_tenant(caller, target)?;
            match requested_role {
                Some(UserRole::SystemAdmin) => {
                    Err(IamError::forbidden("tenant admin cannot grant system admin"))
                }
                other => Ok(other),
            }
        }
        UserRole::TenantUser => {
            is_self(caller, target)?;
            Ok(None)
        }
    }
}

pub fn check_user_delete(caller: &Caller, target: &User) -> IamResult<()> {
    match caller.role {
        UserRole::SystemAdmin => Ok(()),
        UserRole::TenantAdmin => same_tenant(caller, target),
        UserRole::TenantUser => is_self(caller, target),
    }
}

fn same_tenant(caller: &Caller, target: &User) -> IamResult<()> {
    let own = caller.own_tenant()?;
    if target.belongs_to(own) {
        Ok(())
    } else {
        Err(IamError::forbidden("user belongs to another tenant"))
    }
}

fn is_self(caller: &Caller, target: &User) -> IamResult<()> {
    if caller.user_id == target.id {
        Ok(())
    } else {
        Err(IamError::forbidden("user can only access itself"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::Email;
    use platform::password::HashedPassword;

    fn caller(role: UserRole, tenant_id: Option<TenantId>) -> Caller {
        Caller {
            user_id: UserId::new(),
            role,
            tenant_id,
        }
    }

    fn user(role: UserRole, tenant_id: Option<TenantId>) -> User {
        User::new(
            tenant_id,
            "Someone".into(),
            Email::new("someone@example.com").unwrap(),
            HashedPassword::from_stored("$argon2id$stub"),
            role,
        )
        .unwrap()
    }

    fn is_forbidden<T: std::fmt::Debug>(result: IamResult<T>) -> bool {
        matches!(result, Err(IamError::Forbidden(_)))
    }

    #[test]
    fn test_role_gate() {
        assert!(check_role(UserRole::TenantUser, &[]).is_ok());
        assert!(check_role(UserRole::SystemAdmin, &[UserRole::SystemAdmin]).is_ok());
        assert!(is_forbidden(check_role(
            UserRole::TenantAdmin,
            &[UserRole::SystemAdmin]
        )));
    }

    #[test]
    fn test_tenant_read_override() {
        let own = TenantId::new();
        let other = TenantLookup::Id(TenantId::new());

        let admin = caller(UserRole::TenantAdmin, Some(own));
        assert_eq!(
            scope_tenant_read(&admin, Some(other.clone())).unwrap(),
            TenantLookup::Id(own)
        );
        assert_eq!(scope_tenant_read(&admin, None).unwrap(), TenantLookup::Id(own));

        let sys = caller(UserRole::SystemAdmin, None);
        assert_eq!(scope_tenant_read(&sys, Some(other.clone())).unwrap(), other);
        assert!(matches!(
            scope_tenant_read(&sys, None),
            Err(IamError::InvalidInput { .. })
        ));

        let member = caller(UserRole::TenantUser, Some(own));
        assert!(is_forbidden(scope_tenant_read(&member, Some(other))));
    }

    #[test]
    fn test_tenant_admin_update_renames_own_tenant_only() {
        let own = TenantId::new();
        let admin = caller(UserRole::TenantAdmin, Some(own));
        let patch = TenantPatch {
            name: Some("New".into()),
            document: Some("other-doc".into()),
            live: Some(false),
        };

        let (target, patch) = scope_tenant_update(&admin, TenantId::new(), patch).unwrap();
        assert_eq!(target, own);
        assert_eq!(patch.name.as_deref(), Some("New"));
        assert!(patch.document.is_none());
        assert!(patch.live.is_none());
    }

    #[test]
    fn test_user_create_scoping() {
        let own = TenantId::new();
        let admin = caller(UserRole::TenantAdmin, Some(own));
        let requested = TenantLookup::Document("elsewhere".into());

        assert_eq!(
            scope_user_create(&admin, requested.clone(), UserRole::TenantUser).unwrap(),
            TenantLookup::Id(own)
        );
        assert!(matches!(
            scope_user_create(&admin, requested.clone(), UserRole::SystemAdmin),
            Err(IamError::InvalidInput { .. })
        ));

        let member = caller(UserRole::TenantUser, Some(own));
        assert!(is_forbidden(scope_user_create(
            &member,
            requested,
            UserRole::TenantUser
        )));
    }

    #[test]
    fn test_user_read_scoping() {
        let own = TenantId::new();
        let colleague = user(UserRole::TenantUser, Some(own));
        let stranger = user(UserRole::TenantUser, Some(TenantId::new()));

        let admin = caller(UserRole::TenantAdmin, Some(own));
        assert!(check_user_read(&admin, &colleague).is_ok());
        assert!(is_forbidden(check_user_read(&admin, &stranger)));

        let member = caller(UserRole::TenantUser, Some(own));
        assert!(is_forbidden(check_user_read(&member, &colleague)));
        let me = Caller {
            user_id: colleague.id,
            ..member
        };
        assert!(check_user_read(&me, &colleague).is_ok());
    }

    #[test]
    fn test_user_list_scoping() {
        let own = TenantId::new();
        let sys = caller(UserRole::SystemAdmin, None);
        assert_eq!(scope_user_list(&sys, None).unwrap(), None);

        let admin = caller(UserRole::TenantAdmin, Some(own));
        assert_eq!(
            scope_user_list(&admin, None).unwrap(),
            Some(TenantLookup::Id(own))
        );

        let member = caller(UserRole::TenantUser, Some(own));
        assert!(is_forbidden(scope_user_list(&member, None)));
    }

    #[test]
    fn test_user_update_scoping() {
        let own = TenantId::new();
        let colleague = user(UserRole::TenantUser, Some(own));

        let admin = caller(UserRole::TenantAdmin, Some(own));
        assert_eq!(
            scope_user_update(&admin, &colleague, Some(UserRole::TenantAdmin)).unwrap(),
            Some(UserRole::TenantAdmin)
        );
        assert!(is_forbidden(scope_user_update(
            &admin,
            &colleague,
            Some(UserRole::SystemAdmin)
        )));

        let me = Caller {
            user_id: colleague.id,
            role: UserRole::TenantUser,
            tenant_id: Some(own),
        };
        assert_eq!(
            scope_user_update(&me, &colleague, Some(UserRole::TenantAdmin)).unwrap(),
            None
        );

        let other_member = caller(UserRole::TenantUser, Some(own));
        assert!(is_forbidden(scope_user_update(&other_member, &colleague, None)));
    }

    #[test]
    fn test_tenant_user_cannot_delete_others() {
        let own = TenantId::new();
        let colleague = user(UserRole::TenantUser, Some(own));
        let member = caller(UserRole::TenantUser, Some(own));
        assert!(is_forbidden(check_user_delete(&member, &colleague)));

        let admin = caller(UserRole::TenantAdmin, Some(own));
        assert!(check_user_delete(&admin, &colleague).is_ok());
    }
}
