//! Reward sink.
//!
//! The YBS share of every split is handed to a sink that credits the staking
//! pool. The executor checks the amount the sink reports as recorded
//! against the amount it sent and refuses to commit on any difference.
//!
//! [`VaultSink`] records deposits in full. Its performance fee is taken
//! later, when accumulated rewards are forwarded to the reward pool with
//! [`VaultSink::distribute_rewards`].

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use ysplit_ledger::{Ledger, LedgerError};
use ysplit_types::{mul_div, Address, TokenAddress, MAX_BPS};

use crate::{Result, RevenueError};

/// Destination for the staking pool's share.
pub trait RewardSink {
    /// Address tokens are sent to.
    fn address(&self) -> Address;

    /// Move `amount` of `token` from `from` into the sink.
    ///
    /// Returns the amount the sink recorded as reward.
    fn deposit(
        &self,
        ledger: &mut Ledger,
        token: TokenAddress,
        from: Address,
        amount: u128,
    ) -> std::result::Result<u128, LedgerError>;
}

/// Outcome of forwarding a sink's accumulated rewards.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistribution {
    /// Performance fee paid to the fee recipient.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: u128,
    /// Amount credited to the reward pool.
    #[serde_as(as = "DisplayFromStr")]
    pub distributed: u128,
}

/// Vault-backed reward sink with an optional performance fee.
///
/// Deposits accumulate at the sink's address. Distribution skims the fee
/// to `fee_recipient` and forwards the rest to the reward pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultSink {
    address: Address,
    fee_recipient: Address,
    performance_fee_bps: u16,
    reward_pool: Option<Address>,
}

impl VaultSink {
    /// A sink at `address` with no fee and no reward pool.
    pub fn new(address: Address) -> Result<Self> {
        if address.is_zero() {
            return Err(RevenueError::ZeroAddress);
        }
        Ok(Self {
            address,
            fee_recipient: address,
            performance_fee_bps: 0,
            reward_pool: None,
        })
    }

    /// Charge `bps` of every distribution to `recipient`.
    pub fn with_performance_fee(mut self, recipient: Address, bps: u16) -> Result<Self> {
        if u128::from(bps) > MAX_BPS {
            return Err(RevenueError::InvalidPerformanceFee(bps));
        }
        if recipient.is_zero() {
            return Err(RevenueError::ZeroAddress);
        }
        self.fee_recipient = recipient;
        self.performance_fee_bps = bps;
        Ok(self)
    }

    /// Forward distributed rewards to `pool`.
    pub fn with_reward_pool(mut self, pool: Address) -> Result<Self> {
        if pool.is_zero() || pool == self.address {
            return Err(RevenueError::InvalidRewardPool(pool));
        }
        self.reward_pool = Some(pool);
        Ok(self)
    }

    pub fn performance_fee_bps(&self) -> u16 {
        self.performance_fee_bps
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    pub fn reward_pool(&self) -> Option<Address> {
        self.reward_pool
    }

    /// Forward the sink's whole `token` balance: the performance fee to the
    /// fee recipient and the rest to the reward pool.
    ///
    /// Either both transfers happen or neither does.
    ///
    /// # Errors
    ///
    /// - [`RevenueError::NoRewardPool`] if no pool is configured
    /// - [`RevenueError::Ledger`] if a transfer fails
    pub fn distribute_rewards(
        &self,
        ledger: &mut Ledger,
        token: TokenAddress,
    ) -> Result<RewardDistribution> {
        let pool = self.reward_pool.ok_or(RevenueError::NoRewardPool)?;
        let total = ledger.balance_of(&token, &self.address);
        let fee = mul_div(total, u128::from(self.performance_fee_bps), MAX_BPS)
            .ok_or(RevenueError::Overflow)?;
        let distribution = RewardDistribution {
            fee,
            distributed: total - fee,
        };

        let mut scratch = ledger.clone();
        scratch.transfer(token, self.address, self.fee_recipient, distribution.fee)?;
        scratch.transfer(token, self.address, pool, distribution.distributed)?;
        *ledger = scratch;

        tracing::info!(
            %token,
            %pool,
            fee = distribution.fee,
            distributed = distribution.distributed,
            "vault sink: rewards distributed"
        );
        Ok(distribution)
    }
}

impl RewardSink for VaultSink {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(
        &self,
        ledger: &mut Ledger,
        token: TokenAddress,
        from: Address,
        amount: u128,
    ) -> std::result::Result<u128, LedgerError> {
        ledger.transfer(token, from, self.address, amount)?;
        Ok(amount)
    }
}
