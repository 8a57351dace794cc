//! Sign Up Use Case
//!
//! Registers a new identity. The role is decided by the store from the number
//! of identities that already exist (see [`RoleAssignment`]).

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth::Auth, user::User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
    user_role::{RoleAssignment, UserRole},
};
use crate::error::{AuthError, AuthResult};

pub struct SignUpInput {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignUpOutput {
    pub user_id: UserId,
    pub user_name: String,
    pub user_role: UserRole,
}

/// Result of operator seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(UserId),
    AlreadyExists,
}

pub struct SignUpUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> SignUpUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let (user, auth) = self.prepare(input)?;

        // Cheap early exit; the store re-checks atomically.
        if self
            .user_repo
            .find_by_user_name(&user.user_name)
            .await?
            .is_some()
        {
            return Err(AuthError::UserNameTaken);
        }

        let user_role = self
            .user_repo
            .register(&user, &auth, RoleAssignment::Bootstrap)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            user_role = %user_role,
            "User signed up"
        );

        Ok(SignUpOutput {
            user_id: user.user_id,
            user_name: user.user_name.to_string(),
            user_role,
        })
    }

    /// Create a `superadmin` regardless of how many identities exist.
    /// An existing name is reported, not treated as a failure.
    pub async fn seed_super_admin(&self, input: SignUpInput) -> AuthResult<SeedOutcome> {
        let (user, auth) = self.prepare(input)?;

        match self
            .user_repo
            .register(&user, &auth, RoleAssignment::Fixed(UserRole::SuperAdmin))
            .await
        {
            Ok(_) => {
                tracing::info!(
                    user_id = %user.user_id,
                    user_name = %user.user_name,
                    "Superadmin seeded"
                );
                Ok(SeedOutcome::Created(user.user_id))
            }
            Err(AuthError::UserNameTaken) => Ok(SeedOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    fn prepare(&self, input: SignUpInput) -> AuthResult<(User, Auth)> {
        let user_name = UserName::new(&input.user_name)
            .map_err(|e| AuthError::UserNameValidation(e.to_string()))?;
        let raw_password = RawPassword::new(input.password)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let user = User::new(user_name);
        let auth = Auth::new(user.user_id, password_hash);
        Ok((user, auth))
    }
}
