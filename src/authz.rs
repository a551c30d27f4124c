// Ownership/role authorization policy.
//
// Pure decision functions shared by every mutating handler. Callers resolve
// the resource first (not-found is their problem), then ask for a decision;
// a denial converts into the HTTP error at the boundary.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "publisher" => Ok(Role::Publisher),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated actor for the current request, supplied by the JWT
/// middleware. Already validated by the time policy functions see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("User {principal} is not authorized to modify this resource")]
    NotAuthorised { principal: Uuid },

    #[error("User role {role} is not authorized to access this route")]
    RoleNotAllowed { role: Role },

    #[error("User {principal} has already published a bootcamp")]
    AlreadyPublished { principal: Uuid },
}

/// Creation-class gating: the principal's role must be in `allowed`.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AccessDenied> {
    if allowed.contains(&principal.role) {
        return Ok(());
    }
    Err(AccessDenied::RoleNotAllowed {
        role: principal.role,
    })
}

/// Update/delete rule: admins may touch anything, everyone else only what
/// they own.
pub fn require_owner(owner_id: Uuid, principal: &Principal) -> Result<(), AccessDenied> {
    if principal.role == Role::Admin || principal.id == owner_id {
        return Ok(());
    }
    Err(AccessDenied::NotAuthorised {
        principal: principal.id,
    })
}

/// One-bootcamp-per-publisher rule. `already_owns` comes from a storage
/// existence check; admins are exempt.
pub fn require_first_publication(
    principal: &Principal,
    already_owns: bool,
) -> Result<(), AccessDenied> {
    if principal.role == Role::Admin || !already_owns {
        return Ok(());
    }
    Err(AccessDenied::AlreadyPublished {
        principal: principal.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: Uuid, role: Role) -> Principal {
        Principal { id, role }
    }

    #[test]
    fn owner_may_modify_own_resource() {
        let id = Uuid::new_v4();
        assert!(require_owner(id, &principal(id, Role::User)).is_ok());
        assert!(require_owner(id, &principal(id, Role::Publisher)).is_ok());
    }

    #[test]
    fn non_owner_is_denied() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let denied = require_owner(owner, &principal(other, Role::User)).unwrap_err();
        assert_eq!(denied, AccessDenied::NotAuthorised { principal: other });
    }

    #[test]
    fn admin_may_modify_anything() {
        let owner = Uuid::new_v4();
        let admin = Uuid::new_v4();
        assert!(require_owner(owner, &principal(admin, Role::Admin)).is_ok());
    }

    #[test]
    fn role_gate_checks_membership() {
        let p = principal(Uuid::new_v4(), Role::User);
        let denied = require_role(&p, &[Role::Publisher, Role::Admin]).unwrap_err();
        assert_eq!(denied, AccessDenied::RoleNotAllowed { role: Role::User });

        let p = principal(Uuid::new_v4(), Role::Publisher);
        assert!(require_role(&p, &[Role::Publisher, Role::Admin]).is_ok());
    }

    #[test]
    fn second_publication_is_denied_for_non_admins() {
        let id = Uuid::new_v4();
        let publisher = principal(id, Role::Publisher);
        assert!(require_first_publication(&publisher, false).is_ok());
        assert_eq!(
            require_first_publication(&publisher, true).unwrap_err(),
            AccessDenied::AlreadyPublished { principal: id },
        );
    }

    #[test]
    fn admin_may_publish_repeatedly() {
        let admin = principal(Uuid::new_v4(), Role::Admin);
        assert!(require_first_publication(&admin, true).is_ok());
    }

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [Role::User, Role::Publisher, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
