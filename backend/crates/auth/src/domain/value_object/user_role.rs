//! User Role
//!
//! The role enum itself lives in the kernel so every crate shares it. This
//! module adds the registration-time assignment rule.

pub use kernel::access::Role as UserRole;

/// How a new identity gets its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAssignment {
    /// Self-registration: the first identity becomes `superadmin`, the second
    /// `staf`, every later one `pending`.
    Bootstrap,
    /// Operator bootstrap (CLI seeding) with an explicit role.
    Fixed(UserRole),
}

impl RoleAssignment {
    /// Resolve against the number of identities that exist *before* the insert.
    /// Must be evaluated inside the same atomic unit as the insert.
    pub fn resolve(self, existing_identities: i64) -> UserRole {
        match self {
            RoleAssignment::Fixed(role) => role,
            RoleAssignment::Bootstrap => match existing_identities {
                i64::MIN..=0 => UserRole::SuperAdmin,
                1 => UserRole::Staf,
                _ => UserRole::Pending,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_assignment() {
        assert_eq!(RoleAssignment::Bootstrap.resolve(0), UserRole::SuperAdmin);
        assert_eq!(RoleAssignment::Bootstrap.resolve(1), UserRole::Staf);
        assert_eq!(RoleAssignment::Bootstrap.resolve(2), UserRole::Pending);
        assert_eq!(RoleAssignment::Bootstrap.resolve(250), UserRole::Pending);
    }

    #[test]
    fn test_fixed_assignment_ignores_count() {
        let seed = RoleAssignment::Fixed(UserRole::SuperAdmin);
        assert_eq!(seed.resolve(0), UserRole::SuperAdmin);
        assert_eq!(seed.resolve(42), UserRole::SuperAdmin);
    }
}
