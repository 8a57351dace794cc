//! Manage Roles Use Case
//!
//! Admin-side identity management: listing identities and changing roles.

use std::sync::Arc;

use kernel::access::{Actor, Permission};

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::services::{RoleChangePlan, plan_role_change};
use crate::domain::value_object::{UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRoleOutput {
    pub user_id: UserId,
    pub user_role: UserRole,
    pub changed: bool,
}

pub struct ManageRolesUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ManageRolesUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn list_users(&self, actor: &Actor) -> AuthResult<Vec<User>> {
        actor.authorize(Permission::ManageRoles)?;
        self.user_repo.list_users().await
    }

    pub async fn set_role(
        &self,
        actor: &Actor,
        target_id: &UserId,
        new_role: UserRole,
    ) -> AuthResult<SetRoleOutput> {
        actor.authorize(Permission::ManageRoles)?;

        let target = self
            .user_repo
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        match plan_role_change(actor, target_id, target.user_role, new_role)? {
            RoleChangePlan::Unchanged => Ok(SetRoleOutput {
                user_id: *target_id,
                user_role: target.user_role,
                changed: false,
            }),
            RoleChangePlan::Change { from, to } => {
                if !self.user_repo.update_role(target_id, from, to).await? {
                    return Err(AuthError::RoleConflict);
                }

                tracing::info!(
                    actor = %actor.user_id,
                    target = %target_id,
                    from = %from,
                    to = %to,
                    "User role changed"
                );

                Ok(SetRoleOutput {
                    user_id: *target_id,
                    user_role: to,
                    changed: true,
                })
            }
        }
    }
}
