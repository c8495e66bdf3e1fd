//! Balances, draw rights and transfers.
//!
//! A draw right of [`UNLIMITED`] is never decremented by `transfer_from`,
//! matching the infinite-approval convention of ERC-20 tokens.

use std::collections::HashMap;

use ysplit_types::{Address, TokenAddress};

use crate::{LedgerError, Result};

/// Sentinel draw right that is never consumed.
pub const UNLIMITED: u128 = u128::MAX;

/// Multi-token balance and draw-right table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: HashMap<(TokenAddress, Address), u128>,
    allowances: HashMap<(TokenAddress, Address, Address), u128>,
    supply: HashMap<TokenAddress, u128>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `owner` in `token`.
    pub fn balance_of(&self, token: &TokenAddress, owner: &Address) -> u128 {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    /// Total amount of `token` ever credited through [`mint`](Self::mint).
    pub fn total_supply(&self, token: &TokenAddress) -> u128 {
        self.supply.get(token).copied().unwrap_or(0)
    }

    /// Remaining draw right of `spender` on `owner`'s `token`.
    pub fn allowance(&self, token: &TokenAddress, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Credit newly created tokens to `to`.
    ///
    /// Stands in for the outside world depositing revenue at a source.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `to` is the null address
    /// - [`LedgerError::Overflow`] if the balance or supply would overflow
    pub fn mint(&mut self, token: TokenAddress, to: Address, amount: u128) -> Result<()> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let supply = self
            .total_supply(&token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(&token, &to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.supply.insert(token, supply);
        self.balances.insert((token, to), balance);
        tracing::trace!(%token, %to, amount, "ledger: minted");
        Ok(())
    }

    /// Set `spender`'s draw right on `owner`'s `token`, replacing any previous value.
    pub fn approve(&mut self, token: TokenAddress, owner: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(token, owner, spender));
        } else {
            self.allowances.insert((token, owner, spender), amount);
        }
        tracing::trace!(%token, %owner, %spender, amount, "ledger: approval set");
    }

    /// Move `amount` of `token` from `from` to `to`, acting as `from`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `to` is the null address
    /// - [`LedgerError::InsufficientBalance`] if `from` holds less than `amount`
    /// - [`LedgerError::Overflow`] if the recipient balance would overflow
    pub fn transfer(
        &mut self,
        token: TokenAddress,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let from_balance = self.balance_of(&token, &from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                token,
                owner: from,
                available: from_balance,
                required: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let to_balance = self
            .balance_of(&token, &to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.set_balance(token, from, from_balance - amount);
        self.set_balance(token, to, to_balance);
        tracing::trace!(%token, %from, %to, amount, "ledger: transfer");
        Ok(())
    }

    /// Move `amount` of `token` from `from` to `to`, acting as `spender`
    /// under its draw right on `from`.
    ///
    /// A spender moving its own tokens needs no draw right.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientAllowance`] if the draw right is too small
    /// - Any error from [`transfer`](Self::transfer)
    pub fn transfer_from(
        &mut self,
        token: TokenAddress,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        if spender == from {
            return self.transfer(token, from, to, amount);
        }
        let allowance = self.allowance(&token, &from, &spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                token,
                owner: from,
                spender,
                available: allowance,
                required: amount,
            });
        }
        self.transfer(token, from, to, amount)?;
        if allowance != UNLIMITED {
            self.approve(token, from, spender, allowance - amount);
        }
        Ok(())
    }

    fn set_balance(&mut self, token: TokenAddress, owner: Address, amount: u128) {
        if amount == 0 {
            self.balances.remove(&(token, owner));
        } else {
            self.balances.insert((token, owner), amount);
        }
    }
}
