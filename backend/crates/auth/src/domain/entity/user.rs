//! User Entity
//!
//! The identity record: who someone is and which role they hold.
//! Credentials live in [`super::auth::Auth`].

use chrono::{DateTime, Utc};
use kernel::access::Actor;

use crate::domain::value_object::{UserId, user_name::UserName, user_role::UserRole};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    pub user_role: UserRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A not-yet-persisted identity. The final role is decided by the store at
    /// insert time, so it starts out as `pending`.
    pub fn new(user_name: UserName) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            user_name,
            user_role: UserRole::Pending,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_actor(&self) -> Actor {
        Actor::new(self.user_id, self.user_name.as_str(), self.user_role)
    }
}
