//! # ysplit-revenue
//!
//! Gauge-weighted revenue splitting.
//!
//! Admin fees and vote incentives are each divided between the staking
//! pool (YBS), the treasury and a remainder left at the sources. The
//! proportions follow how the protocol's voter has spread its weight over
//! the gauge categories, blended through per-category split rules.
//!
//! ## Modules
//!
//! - [`ratios`]: Split-ratio calculation from live vote weights
//! - [`splits`]: Applying a split to a token amount
//! - [`sink`]: Reward sink seam and the vault implementation
//! - [`executor`]: Collecting and distributing revenue

pub mod executor;
pub mod ratios;
pub mod sink;
pub mod splits;

pub use executor::{
    ExecutionKind, ExecutionReport, RevenueBalances, RevenueSource, SourceBalance, SplitExecutor,
    StreamReport,
};
pub use ratios::{compute_splits, vote_snapshot, CategoryWeight, TargetWeight, VoteWeightSnapshot};
pub use sink::{RewardDistribution, RewardSink, VaultSink};

use ysplit_governance::{AccessDenied, GovernanceError};
use ysplit_ledger::LedgerError;
use ysplit_types::{Address, ErrorClass, TokenAddress};

/// Error types for revenue operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevenueError {
    /// The caller lacks the role the operation requires.
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),

    /// The voter holds no weight, so no ratio can be derived.
    #[error("voter {voter} has no voting power")]
    NoVotingPower {
        /// The voter whose weight was read.
        voter: Address,
    },

    /// Categorised weight exceeds the voter's total weight.
    #[error("inconsistent vote state: categorised weight {categorized} exceeds total {total}")]
    InconsistentVoteState {
        /// Sum of weight on categorised targets.
        categorized: u128,
        /// Voter's total weight.
        total: u128,
    },

    /// A source or depositor has not granted the executor a large enough draw right.
    #[error("insufficient draw right on {token} from {owner}: have {available}, need {required}")]
    InsufficientExternalAllowance {
        /// Token being pulled.
        token: TokenAddress,
        /// Address being pulled from.
        owner: Address,
        /// Draw right available to the executor.
        available: u128,
        /// Amount the executor tried to pull.
        required: u128,
    },

    /// A recipient or configured address was the null identity.
    #[error("zero address")]
    ZeroAddress,

    /// A zero amount was supplied where a positive one is required.
    #[error("revenue amount is zero")]
    ZeroAmount,

    /// The same address is configured as a revenue source twice.
    #[error("duplicate revenue source: {0}")]
    DuplicateSource(Address),

    /// A performance fee above 100%.
    #[error("performance fee {0} bps exceeds 10000")]
    InvalidPerformanceFee(u16),

    /// Rewards were distributed before a reward pool was configured.
    #[error("no reward pool configured")]
    NoRewardPool,

    /// A reward pool that is null or the sink itself.
    #[error("invalid reward pool: {0}")]
    InvalidRewardPool(Address),

    /// The reward sink recorded a different amount than was sent.
    #[error("reward sink recorded {recorded}, sent {sent}")]
    SinkMismatch {
        /// Amount handed to the sink.
        sent: u128,
        /// Amount the sink reports as recorded.
        recorded: u128,
    },

    /// Arithmetic overflow.
    #[error("arithmetic overflow in revenue calculation")]
    Overflow,

    /// A governance rule or target failure.
    #[error("governance: {0}")]
    Governance(GovernanceError),

    /// The underlying token movement failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<GovernanceError> for RevenueError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::Unauthorized(denied) => RevenueError::Unauthorized(denied),
            GovernanceError::ZeroAddress => RevenueError::ZeroAddress,
            other => RevenueError::Governance(other),
        }
    }
}

impl RevenueError {
    /// How a caller should react to this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            RevenueError::NoVotingPower { .. } | RevenueError::InconsistentVoteState { .. } => {
                ErrorClass::RetryLater
            }
            RevenueError::Unauthorized(_)
            | RevenueError::ZeroAddress
            | RevenueError::DuplicateSource(_)
            | RevenueError::InvalidPerformanceFee(_)
            | RevenueError::NoRewardPool
            | RevenueError::InvalidRewardPool(_) => ErrorClass::Configuration,
            RevenueError::Governance(err) => err.class(),
            RevenueError::InsufficientExternalAllowance { .. } => ErrorClass::MissingExternalSetup,
            RevenueError::ZeroAmount
            | RevenueError::SinkMismatch { .. }
            | RevenueError::Overflow
            | RevenueError::Ledger(_) => ErrorClass::Fatal,
        }
    }

    /// Stable name of the error kind, for callers that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            RevenueError::Unauthorized(_) => "Unauthorized",
            RevenueError::NoVotingPower { .. } => "NoVotingPower",
            RevenueError::InconsistentVoteState { .. } => "InconsistentVoteState",
            RevenueError::InsufficientExternalAllowance { .. } => "InsufficientExternalAllowance",
            RevenueError::ZeroAddress => "ZeroAddress",
            RevenueError::ZeroAmount => "ZeroAmount",
            RevenueError::DuplicateSource(_) => "DuplicateSource",
            RevenueError::InvalidPerformanceFee(_) => "InvalidPerformanceFee",
            RevenueError::NoRewardPool => "NoRewardPool",
            RevenueError::InvalidRewardPool(_) => "InvalidRewardPool",
            RevenueError::SinkMismatch { .. } => "SinkMismatch",
            RevenueError::Overflow => "Overflow",
            RevenueError::Governance(err) => err.kind(),
            RevenueError::Ledger(err) => err.kind(),
        }
    }
}

/// Convenience result type for revenue operations.
pub type Result<T> = std::result::Result<T, RevenueError>;
