use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ValidationError;

/// Access tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "Customer")]
    Customer,
    #[serde(alias = "Canteen Personnel")]
    CanteenPersonnel,
    #[serde(alias = "Admin")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::CanteenPersonnel, Role::Admin];

    /// Value stored in `users.role` and carried in tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::CanteenPersonnel => "canteen_personnel",
            Role::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::CanteenPersonnel => "Canteen Personnel",
            Role::Admin => "Admin",
        }
    }

    /// Where the client should go right after login.
    pub fn landing_page(self) -> &'static str {
        match self {
            Role::Customer => "/home",
            Role::CanteenPersonnel => "/canteen/dashboard",
            Role::Admin => "/admin/dashboard",
        }
    }

    /// Staff may work the order queue.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::CanteenPersonnel | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(' ', "_");
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_labels_and_stored_values() {
        assert_eq!("Canteen Personnel".parse::<Role>(), Ok(Role::CanteenPersonnel));
        assert_eq!("canteen_personnel".parse::<Role>(), Ok(Role::CanteenPersonnel));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn landing_page_follows_role() {
        assert_eq!(Role::Customer.landing_page(), "/home");
        assert_eq!(Role::CanteenPersonnel.landing_page(), "/canteen/dashboard");
        assert_eq!(Role::Admin.landing_page(), "/admin/dashboard");
    }

    #[test]
    fn only_personnel_and_admins_are_staff() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::CanteenPersonnel.is_staff());
        assert!(Role::Admin.is_staff());
    }
}
