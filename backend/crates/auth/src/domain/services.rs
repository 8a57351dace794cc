//! Domain Services
//!
//! Role-change rules. Pure functions over the actor and the target's current
//! role; the application layer applies the result with a compare-and-set.

use kernel::access::{Actor, Permission};

use crate::domain::value_object::{UserId, user_role::UserRole};

/// Why a role change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoleChangeDenied {
    #[error("Only admins can change roles")]
    NotPermitted,
    #[error("The role of another superadmin cannot be changed")]
    OtherSuperAdmin,
    #[error("A superadmin cannot demote themselves")]
    SelfDemotion,
    #[error("Only a superadmin can grant the superadmin role")]
    PromotionRequiresSuperAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChangePlan {
    Unchanged,
    Change { from: UserRole, to: UserRole },
}

/// Decide whether `actor` may move `target` from `current` to `requested`.
pub fn plan_role_change(
    actor: &Actor,
    target: &UserId,
    current: UserRole,
    requested: UserRole,
) -> Result<RoleChangePlan, RoleChangeDenied> {
    if actor.authorize(Permission::ManageRoles).is_err() {
        return Err(RoleChangeDenied::NotPermitted);
    }

    if current.is_super_admin() {
        if actor.user_id != *target {
            return Err(RoleChangeDenied::OtherSuperAdmin);
        }
        if !requested.is_super_admin() {
            return Err(RoleChangeDenied::SelfDemotion);
        }
        return Ok(RoleChangePlan::Unchanged);
    }

    if requested.is_super_admin() && !actor.role.is_super_admin() {
        return Err(RoleChangeDenied::PromotionRequiresSuperAdmin);
    }

    if requested == current {
        Ok(RoleChangePlan::Unchanged)
    } else {
        Ok(RoleChangePlan::Change {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole) -> Actor {
        Actor::new(UserId::new(), "actor", role)
    }

    #[test]
    fn test_non_admins_cannot_change_roles() {
        for role in [UserRole::Pending, UserRole::Staf] {
            let result = plan_role_change(
                &actor(role),
                &UserId::new(),
                UserRole::Pending,
                UserRole::Staf,
            );
            assert_eq!(result, Err(RoleChangeDenied::NotPermitted));
        }
    }

    #[test]
    fn test_admin_can_promote_pending_to_staf_or_admin() {
        let admin = actor(UserRole::Admin);
        let target = UserId::new();
        assert_eq!(
            plan_role_change(&admin, &target, UserRole::Pending, UserRole::Staf),
            Ok(RoleChangePlan::Change {
                from: UserRole::Pending,
                to: UserRole::Staf
            })
        );
        assert_eq!(
            plan_role_change(&admin, &target, UserRole::Staf, UserRole::Admin),
            Ok(RoleChangePlan::Change {
                from: UserRole::Staf,
                to: UserRole::Admin
            })
        );
    }

    #[test]
    fn test_admin_cannot_grant_superadmin() {
        let admin = actor(UserRole::Admin);
        assert_eq!(
            plan_role_change(&admin, &UserId::new(), UserRole::Staf, UserRole::SuperAdmin),
            Err(RoleChangeDenied::PromotionRequiresSuperAdmin)
        );
    }

    #[test]
    fn test_superadmin_can_grant_superadmin() {
        let root = actor(UserRole::SuperAdmin);
        assert!(matches!(
            plan_role_change(&root, &UserId::new(), UserRole::Admin, UserRole::SuperAdmin),
            Ok(RoleChangePlan::Change { .. })
        ));
    }

    #[test]
    fn test_other_superadmin_is_untouchable() {
        for role in [UserRole::Admin, UserRole::SuperAdmin] {
            assert_eq!(
                plan_role_change(
                    &actor(role),
                    &UserId::new(),
                    UserRole::SuperAdmin,
                    UserRole::Staf
                ),
                Err(RoleChangeDenied::OtherSuperAdmin)
            );
        }
    }

    #[test]
    fn test_superadmin_cannot_self_demote() {
        let root = actor(UserRole::SuperAdmin);
        assert_eq!(
            plan_role_change(&root, &root.user_id, UserRole::SuperAdmin, UserRole::Admin),
            Err(RoleChangeDenied::SelfDemotion)
        );
        assert_eq!(
            plan_role_change(&root, &root.user_id, UserRole::SuperAdmin, UserRole::SuperAdmin),
            Ok(RoleChangePlan::Unchanged)
        );
    }

    #[test]
    fn test_same_role_is_unchanged() {
        let admin = actor(UserRole::Admin);
        assert_eq!(
            plan_role_change(&admin, &UserId::new(), UserRole::Staf, UserRole::Staf),
            Ok(RoleChangePlan::Unchanged)
        );
    }
}
