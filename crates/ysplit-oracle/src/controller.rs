//! In-memory gauge controller.
//!
//! Models the parts of a vote-escrow gauge controller the splitter reads:
//! a registry of gauges, a per-voter voting power, and per-(voter, gauge)
//! votes. A vote is normally cast as basis points of the voter's power via
//! [`vote_for_gauge_weights`](GaugeController::vote_for_gauge_weights); the
//! bps in use by one voter never exceed 10000.
//!
//! Raw-weight votes set through [`dev_set_vote`](GaugeController::dev_set_vote)
//! bypass that cap. They exist to reproduce states where stale gauge biases
//! add up to more than the voter's current power.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use ysplit_types::{mul_div, Address, MAX_BPS};

use crate::{OracleError, Result, VoteWeightOracle};

/// Maximum basis points a voter can allocate across all gauges.
pub const MAX_USER_POWER_BPS: u16 = 10_000;

/// A single voter's vote on one gauge.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    /// Share of the voter's power, re-evaluated against its current power.
    Bps(u16),
    /// Fixed weight, independent of the voter's power.
    Raw(#[serde_as(as = "DisplayFromStr")] u128),
}

/// In-memory gauge controller.
#[derive(Clone, Debug, Default)]
pub struct GaugeController {
    gauges: BTreeSet<Address>,
    power: HashMap<Address, u128>,
    votes: HashMap<(Address, Address), Vote>,
    used_bps: HashMap<Address, u16>,
}

impl GaugeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gauge. Registering an existing gauge is a no-op.
    pub fn add_gauge(&mut self, gauge: Address) -> Result<()> {
        if gauge.is_zero() {
            return Err(OracleError::ZeroAddress);
        }
        if self.gauges.insert(gauge) {
            tracing::debug!(%gauge, "gauge controller: gauge added");
        }
        Ok(())
    }

    /// Deregister a gauge. Existing votes on it keep their weight.
    pub fn remove_gauge(&mut self, gauge: &Address) -> Result<()> {
        if !self.gauges.remove(gauge) {
            return Err(OracleError::UnknownGauge(*gauge));
        }
        tracing::debug!(%gauge, "gauge controller: gauge removed");
        Ok(())
    }

    /// All registered gauges in address order.
    pub fn gauges(&self) -> impl Iterator<Item = &Address> {
        self.gauges.iter()
    }

    /// Set a voter's total voting power.
    pub fn set_voting_power(&mut self, voter: Address, power: u128) -> Result<()> {
        if voter.is_zero() {
            return Err(OracleError::ZeroAddress);
        }
        self.power.insert(voter, power);
        tracing::debug!(%voter, power, "gauge controller: voting power set");
        Ok(())
    }

    /// Allocate `bps` of `voter`'s power to `gauge`, replacing any previous
    /// vote on that gauge. `0` removes the vote.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnknownGauge`] if the gauge is not registered
    /// - [`OracleError::InvalidWeight`] if `bps` exceeds 10000
    /// - [`OracleError::PowerExhausted`] if the voter would use more than 10000 bps
    pub fn vote_for_gauge_weights(&mut self, voter: Address, gauge: Address, bps: u16) -> Result<()> {
        if !self.gauges.contains(&gauge) {
            return Err(OracleError::UnknownGauge(gauge));
        }
        if bps > MAX_USER_POWER_BPS {
            return Err(OracleError::InvalidWeight(bps));
        }

        let old_bps = match self.votes.get(&(voter, gauge)) {
            Some(Vote::Bps(old)) => *old,
            _ => 0,
        };
        let used = u32::from(self.vote_user_power(&voter)) - u32::from(old_bps) + u32::from(bps);
        let used_bps = u16::try_from(used)
            .ok()
            .filter(|u| *u <= MAX_USER_POWER_BPS)
            .ok_or(OracleError::PowerExhausted { used })?;

        if bps == 0 {
            self.votes.remove(&(voter, gauge));
        } else {
            self.votes.insert((voter, gauge), Vote::Bps(bps));
        }
        self.used_bps.insert(voter, used_bps);

        tracing::debug!(%voter, %gauge, bps, used, "gauge controller: vote cast");
        Ok(())
    }

    /// Pin a raw weight on `(voter, gauge)` without touching the bps budget.
    ///
    /// Development and testing only.
    pub fn dev_set_vote(&mut self, voter: Address, gauge: Address, weight: u128) -> Result<()> {
        if !self.gauges.contains(&gauge) {
            return Err(OracleError::UnknownGauge(gauge));
        }
        if let Some(Vote::Bps(old)) = self.votes.get(&(voter, gauge)) {
            let used = self.vote_user_power(&voter).saturating_sub(*old);
            self.used_bps.insert(voter, used);
        }
        if weight == 0 {
            self.votes.remove(&(voter, gauge));
        } else {
            self.votes.insert((voter, gauge), Vote::Raw(weight));
        }
        tracing::warn!(%voter, %gauge, weight, "gauge controller: raw vote pinned (dev only)");
        Ok(())
    }

    /// Basis points of power `voter` has allocated through bps votes.
    pub fn vote_user_power(&self, voter: &Address) -> u16 {
        self.used_bps.get(voter).copied().unwrap_or(0)
    }

    /// The vote `voter` holds on `gauge`, if any.
    pub fn vote(&self, voter: &Address, gauge: &Address) -> Option<Vote> {
        self.votes.get(&(*voter, *gauge)).copied()
    }

    /// Every vote `voter` holds, ordered by gauge address.
    pub fn votes_of(&self, voter: &Address) -> Vec<(Address, Vote)> {
        let mut out: Vec<(Address, Vote)> = self
            .votes
            .iter()
            .filter(|((v, _), _)| v == voter)
            .map(|((_, gauge), vote)| (*gauge, *vote))
            .collect();
        out.sort_by_key(|(gauge, _)| *gauge);
        out
    }
}

impl VoteWeightOracle for GaugeController {
    fn weight_of(&self, target: &Address, voter: &Address) -> u128 {
        match self.votes.get(&(*voter, *target)) {
            Some(Vote::Bps(bps)) => {
                let power = self.total_weight(voter);
                // bps <= MAX_BPS so the quotient never exceeds `power`.
                mul_div(power, u128::from(*bps), MAX_BPS).unwrap_or(power)
            }
            Some(Vote::Raw(weight)) => *weight,
            None => 0,
        }
    }

    fn total_weight(&self, voter: &Address) -> u128 {
        self.power.get(voter).copied().unwrap_or(0)
    }

    fn is_valid_target(&self, target: &Address) -> bool {
        self.gauges.contains(target)
    }
}
