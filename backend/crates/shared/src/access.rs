//! Access Control
//!
//! The role ladder and the permission table every protected operation is
//! checked against. Both the auth and inventory crates consult this module,
//! so a role means the same thing everywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Role of an identity.
///
/// Ordered by privilege: `Pending < Staf < Admin < SuperAdmin`. The numeric
/// id is the persisted representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Role {
    /// Self-registered beyond the first two identities. Awaits promotion.
    #[default]
    Pending = 0,
    Staf = 1,
    Admin = 2,
    SuperAdmin = 3,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Pending, Role::Staf, Role::Admin, Role::SuperAdmin];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Role::Pending => "pending",
            Role::Staf => "staf",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    pub const fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Role::Pending),
            1 => Some(Role::Staf),
            2 => Some(Role::Admin),
            3 => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.code() == code)
    }

    #[inline]
    pub const fn is_admin_or_higher(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    #[inline]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// The access-control table.
    pub const fn can(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewProducts | Permission::RecordStock | Permission::ViewOwnActivity => {
                true
            }
            Permission::ManageProducts
            | Permission::ViewTransactions
            | Permission::ViewAllActivity
            | Permission::ViewDashboard
            | Permission::ManageRoles => self.is_admin_or_higher(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Capabilities guarded by [`Role::can`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewProducts,
    ManageProducts,
    RecordStock,
    ViewTransactions,
    ViewAllActivity,
    ViewOwnActivity,
    ViewDashboard,
    ManageRoles,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewProducts => "view products",
            Permission::ManageProducts => "manage products",
            Permission::RecordStock => "record stock movements",
            Permission::ViewTransactions => "view stock transactions",
            Permission::ViewAllActivity => "view the activity log",
            Permission::ViewOwnActivity => "view own activity",
            Permission::ViewDashboard => "view the dashboard",
            Permission::ManageRoles => "manage user roles",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of an operation.
///
/// Resolved from the session on every request, with the role read fresh from
/// the identity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, user_name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            role,
        }
    }

    /// Fails with [`AccessDenied`] unless the actor's role grants `permission`.
    pub fn authorize(&self, permission: Permission) -> Result<(), AccessDenied> {
        if self.role.can(permission) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self.role,
                permission,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("role '{role}' may not {permission}")]
pub struct AccessDenied {
    pub role: Role,
    pub permission: Permission,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVERYONE: [Permission; 3] = [
        Permission::ViewProducts,
        Permission::RecordStock,
        Permission::ViewOwnActivity,
    ];
    const ADMIN_ONLY: [Permission; 5] = [
        Permission::ManageProducts,
        Permission::ViewTransactions,
        Permission::ViewAllActivity,
        Permission::ViewDashboard,
        Permission::ManageRoles,
    ];

    #[test]
    fn test_role_codes_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.code()), Some(role));
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_code("owner"), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn test_role_serde_uses_codes() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"superadmin\""
        );
        let role: Role = serde_json::from_str("\"staf\"").unwrap();
        assert_eq!(role, Role::Staf);
    }

    #[test]
    fn test_every_role_has_basic_permissions() {
        for role in Role::ALL {
            for permission in EVERYONE {
                assert!(role.can(permission), "{role} should {permission}");
            }
        }
    }

    #[test]
    fn test_admin_only_permissions() {
        for permission in ADMIN_ONLY {
            assert!(!Role::Pending.can(permission));
            assert!(!Role::Staf.can(permission));
            assert!(Role::Admin.can(permission));
            assert!(Role::SuperAdmin.can(permission));
        }
    }

    #[test]
    fn test_actor_authorize() {
        let staf = Actor::new(UserId::new(), "budi", Role::Staf);
        assert!(staf.authorize(Permission::RecordStock).is_ok());

        let denied = staf.authorize(Permission::ManageProducts).unwrap_err();
        assert_eq!(denied.role, Role::Staf);
        assert_eq!(denied.permission, Permission::ManageProducts);
        assert_eq!(denied.to_string(), "role 'staf' may not manage products");
    }
}
