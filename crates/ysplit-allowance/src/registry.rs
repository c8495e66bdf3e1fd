//! Spender whitelist and per-token grants.
//!
//! A spender is either active, with a set of granted tokens, or absent.
//! Every granted token is backed by an unlimited ledger approval from the
//! registry's address to the spender; revoking zeroes that approval.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ysplit_governance::{require_role, AccessControl, Role, RoleResolver};
use ysplit_ledger::{Ledger, UNLIMITED};
use ysplit_types::events::{AuditEvent, EventKind, Journal};
use ysplit_types::{Address, TokenAddress};

use crate::{AllowanceError, Result};

/// An active spender and its granted tokens, for persistence and queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpenderRecord {
    pub spender: Address,
    pub tokens: Vec<TokenAddress>,
}

/// Whitelist of integrators allowed to draw from the registry's buffer.
#[derive(Clone, Debug)]
pub struct CapabilityAllowanceRegistry {
    address: Address,
    access: AccessControl,
    spenders: BTreeMap<Address, BTreeSet<TokenAddress>>,
    journal: Journal,
}

impl CapabilityAllowanceRegistry {
    /// Create an empty registry holding tokens at `address`.
    pub fn new(address: Address, access: AccessControl) -> Result<Self> {
        if address.is_zero() {
            return Err(AllowanceError::ZeroAddress);
        }
        Ok(Self {
            address,
            access,
            spenders: BTreeMap::new(),
            journal: Journal::new(),
        })
    }

    /// The buffer address draw rights are granted on.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn is_spender(&self, principal: &Address) -> bool {
        self.spenders.contains_key(principal)
    }

    /// Tokens `spender` may currently draw, in address order.
    pub fn get_approvals(&self, spender: &Address) -> Vec<TokenAddress> {
        self.spenders
            .get(spender)
            .map(|tokens| tokens.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every active spender with its grants.
    pub fn spenders(&self) -> Vec<SpenderRecord> {
        self.spenders
            .iter()
            .map(|(spender, tokens)| SpenderRecord {
                spender: *spender,
                tokens: tokens.iter().copied().collect(),
            })
            .collect()
    }

    /// Make `spender` active. Owner only. Approving an active spender is a no-op.
    pub fn approve_spender(&mut self, caller: Address, spender: Address) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        if spender.is_zero() {
            return Err(AllowanceError::ZeroAddress);
        }
        if self.spenders.contains_key(&spender) {
            return Ok(());
        }
        self.spenders.insert(spender, BTreeSet::new());
        self.journal
            .record(caller, EventKind::SpenderApproved { spender });
        tracing::info!(%spender, "spender approved");
        Ok(())
    }

    /// Deactivate `spender` and zero every draw right it holds. Owner or guardian.
    ///
    /// # Errors
    ///
    /// - [`AllowanceError::Unauthorized`] if `caller` is neither owner nor guardian
    /// - [`AllowanceError::UnapprovedSpender`] if `spender` is not active
    pub fn revoke_spender(
        &mut self,
        caller: Address,
        spender: Address,
        ledger: &mut Ledger,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner, Role::Guardian])?;
        let tokens = self
            .spenders
            .remove(&spender)
            .ok_or(AllowanceError::UnapprovedSpender(spender))?;

        for token in &tokens {
            ledger.approve(*token, self.address, spender, 0);
        }
        let revoked_tokens: Vec<TokenAddress> = tokens.into_iter().collect();
        tracing::info!(%spender, revoked = revoked_tokens.len(), "spender revoked");
        self.journal.record(
            caller,
            EventKind::SpenderRevoked {
                spender,
                revoked_tokens,
            },
        );
        Ok(())
    }

    /// Grant `spender` an unlimited draw right on each of `tokens`. Owner or guardian.
    ///
    /// Tokens already granted are left as they are.
    ///
    /// # Errors
    ///
    /// - [`AllowanceError::Unauthorized`] if `caller` is neither owner nor guardian
    /// - [`AllowanceError::UnapprovedSpender`] if `spender` is not active or is `caller`
    /// - [`AllowanceError::ZeroAddress`] if any token is the null address
    pub fn grant_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        tokens: &[TokenAddress],
        ledger: &mut Ledger,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner, Role::Guardian])?;
        reject_self_target(caller, spender)?;
        if tokens.iter().any(Address::is_zero) {
            return Err(AllowanceError::ZeroAddress);
        }
        let address = self.address;
        let granted = self.spenders.get_mut(&spender).ok_or_else(|| {
            tracing::warn!(%spender, "grant to unapproved spender refused");
            AllowanceError::UnapprovedSpender(spender)
        })?;

        let mut newly_granted = Vec::new();
        for token in tokens {
            if granted.insert(*token) {
                ledger.approve(*token, address, spender, UNLIMITED);
                newly_granted.push(*token);
            }
        }
        if newly_granted.is_empty() {
            return Ok(());
        }

        tracing::info!(%spender, granted = newly_granted.len(), "allowance granted");
        self.journal.record(
            caller,
            EventKind::AllowanceGranted {
                spender,
                tokens: newly_granted,
            },
        );
        Ok(())
    }

    /// Zero `spender`'s draw right on each of `tokens`. Owner or guardian.
    ///
    /// Works whether or not `spender` is active and whether or not the
    /// tokens were ever granted. `caller` may not name itself.
    pub fn revoke_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        tokens: &[TokenAddress],
        ledger: &mut Ledger,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner, Role::Guardian])?;
        reject_self_target(caller, spender)?;
        let mut revoked = BTreeSet::new();
        for token in tokens {
            ledger.approve(*token, self.address, spender, 0);
            revoked.insert(*token);
        }
        if let Some(granted) = self.spenders.get_mut(&spender) {
            granted.retain(|token| !revoked.contains(token));
        }

        tracing::info!(%spender, tokens = revoked.len(), "allowance revoked");
        self.journal.record(
            caller,
            EventKind::AllowanceRevoked {
                spender,
                tokens: revoked.into_iter().collect(),
            },
        );
        Ok(())
    }

    /// Move `amount` of `token` out of the buffer. Owner only.
    pub fn sweep(
        &mut self,
        caller: Address,
        token: TokenAddress,
        to: Address,
        amount: u128,
        ledger: &mut Ledger,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        if to.is_zero() {
            return Err(AllowanceError::ZeroAddress);
        }
        ledger.transfer(token, self.address, to, amount)?;
        tracing::info!(%token, %to, amount, "buffer swept");
        self.journal
            .record(caller, EventKind::Swept { token, to, amount });
        Ok(())
    }

    pub fn set_owner(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        Ok(self
            .access
            .set_owner(caller, new_owner, &mut self.journal)?)
    }

    pub fn set_guardian(&mut self, caller: Address, new_guardian: Address) -> Result<()> {
        Ok(self
            .access
            .set_guardian(caller, new_guardian, &mut self.journal)?)
    }

    /// Load a persisted spender and re-mirror its grants into `ledger`.
    pub fn restore_spender(&mut self, record: &SpenderRecord, ledger: &mut Ledger) -> Result<()> {
        if record.spender.is_zero() {
            return Err(AllowanceError::ZeroAddress);
        }
        let granted = self.spenders.entry(record.spender).or_default();
        for token in &record.tokens {
            granted.insert(*token);
            ledger.approve(*token, self.address, record.spender, UNLIMITED);
        }
        Ok(())
    }

    /// Take every audit event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.journal.drain()
    }
}

/// Owner and guardian act on distinct spenders only, even when they are
/// spenders themselves.
fn reject_self_target(caller: Address, spender: Address) -> Result<()> {
    if caller == spender {
        tracing::warn!(%caller, "allowance change naming the caller refused");
        return Err(AllowanceError::UnapprovedSpender(spender));
    }
    Ok(())
}

impl RoleResolver for CapabilityAllowanceRegistry {
    fn has_role(&self, principal: &Address, role: Role) -> bool {
        match role {
            Role::Spender => self.is_spender(principal),
            other => self.access.has_role(principal, other),
        }
    }
}
