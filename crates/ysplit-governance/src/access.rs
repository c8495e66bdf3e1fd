//! Roles and role checks.
//!
//! Every privileged entry point names the roles allowed to call it and
//! checks the caller through [`require_role`] before touching state.
//! [`AccessControl`] holds the owner, guardian and operator of one
//! component; spender status lives in the allowance registry, which
//! answers for [`Role::Spender`] through its own [`RoleResolver`].

use std::fmt;

use serde::{Deserialize, Serialize};
use ysplit_types::events::{EventKind, Journal};
use ysplit_types::Address;

use crate::{GovernanceError, Result};

/// The closed set of roles recognised by the splitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative authority.
    Owner,
    /// May trigger splits and revoke capabilities.
    Guardian,
    /// May deposit admin fees and split them in one call.
    Operator,
    /// Active integrator of the allowance registry.
    Spender,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Guardian => "guardian",
            Role::Operator => "operator",
            Role::Spender => "spender",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers whether a principal currently holds a role.
pub trait RoleResolver {
    fn has_role(&self, principal: &Address, role: Role) -> bool;
}

/// A caller was refused because it holds none of the required roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unauthorized: {caller} is not {}", join_roles(.required))]
pub struct AccessDenied {
    /// The refused principal.
    pub caller: Address,
    /// Roles any one of which would have been accepted.
    pub required: Vec<Role>,
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Check that `caller` holds at least one of `allowed`.
///
/// Returns the first matching role in `allowed` order.
pub fn require_role<R: RoleResolver + ?Sized>(
    resolver: &R,
    caller: &Address,
    allowed: &[Role],
) -> std::result::Result<Role, AccessDenied> {
    allowed
        .iter()
        .copied()
        .find(|role| resolver.has_role(caller, *role))
        .ok_or_else(|| {
            tracing::warn!(%caller, required = join_roles(allowed), "access denied");
            AccessDenied {
                caller: *caller,
                required: allowed.to_vec(),
            }
        })
}

/// Owner, guardian and optional operator of one component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    guardian: Address,
    operator: Option<Address>,
}

impl AccessControl {
    /// Create a role record. Neither principal may be the null identity.
    pub fn new(owner: Address, guardian: Address) -> Result<Self> {
        if owner.is_zero() || guardian.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        Ok(Self {
            owner,
            guardian,
            operator: None,
        })
    }

    /// Attach an operator at construction time.
    pub fn with_operator(mut self, operator: Address) -> Result<Self> {
        if operator.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        self.operator = Some(operator);
        Ok(self)
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn guardian(&self) -> Address {
        self.guardian
    }

    pub fn operator(&self) -> Option<Address> {
        self.operator
    }

    /// Transfer ownership. Owner only.
    pub fn set_owner(&mut self, caller: Address, new_owner: Address, journal: &mut Journal) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        if new_owner.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        journal.record(caller, EventKind::OwnerChanged { previous, new: new_owner });
        tracing::info!(%previous, new = %new_owner, "owner changed");
        Ok(())
    }

    /// Replace the guardian. Owner only.
    pub fn set_guardian(
        &mut self,
        caller: Address,
        new_guardian: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        if new_guardian.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut self.guardian, new_guardian);
        journal.record(caller, EventKind::GuardianChanged { previous, new: new_guardian });
        tracing::info!(%previous, new = %new_guardian, "guardian changed");
        Ok(())
    }

    /// Designate the operator. Owner only.
    pub fn set_operator(
        &mut self,
        caller: Address,
        new_operator: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        if new_operator.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        let previous = self.operator.replace(new_operator);
        journal.record(caller, EventKind::OperatorChanged { previous, new: new_operator });
        tracing::info!(?previous, new = %new_operator, "operator changed");
        Ok(())
    }
}

impl RoleResolver for AccessControl {
    fn has_role(&self, principal: &Address, role: Role) -> bool {
        match role {
            Role::Owner => *principal == self.owner,
            Role::Guardian => *principal == self.guardian,
            Role::Operator => self.operator.as_ref() == Some(principal),
            Role::Spender => false,
        }
    }
}
