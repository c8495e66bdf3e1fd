//! # ysplit-oracle
//!
//! Vote-weight oracle consumed by the split-ratio calculator.
//!
//! The splitter never decides how voting power is earned or decays. It only
//! reads, for one voter, how much weight sits on each governance target and
//! how much weight the voter holds in total. [`VoteWeightOracle`] is that
//! read-only seam; [`GaugeController`] is an in-memory implementation used by
//! the daemon and by tests.
//!
//! ## Modules
//!
//! - [`controller`]: In-memory gauge controller with basis-point voting

pub mod controller;

pub use controller::{GaugeController, Vote};

use ysplit_types::Address;

/// Read-only view of external voting state.
///
/// Implementations must be deterministic for a given state: the calculator
/// reads `total_weight` once per computation and treats it as the common
/// denominator for every per-target weight read in the same call.
pub trait VoteWeightOracle {
    /// Weight `voter` currently assigns to `target`.
    fn weight_of(&self, target: &Address, voter: &Address) -> u128;

    /// Total outstanding weight held by `voter`.
    fn total_weight(&self, voter: &Address) -> u128;

    /// Whether `target` is a governance target the registry recognises.
    fn is_valid_target(&self, target: &Address) -> bool;
}

impl<T: VoteWeightOracle + ?Sized> VoteWeightOracle for &T {
    fn weight_of(&self, target: &Address, voter: &Address) -> u128 {
        (**self).weight_of(target, voter)
    }

    fn total_weight(&self, voter: &Address) -> u128 {
        (**self).total_weight(voter)
    }

    fn is_valid_target(&self, target: &Address) -> bool {
        (**self).is_valid_target(target)
    }
}

/// Error types for oracle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The gauge is not registered with the controller.
    #[error("unknown gauge: {0}")]
    UnknownGauge(Address),

    /// The null address cannot be registered as a gauge or voter.
    #[error("zero address")]
    ZeroAddress,

    /// A vote weight above 10000 basis points.
    #[error("vote weight {0} bps exceeds 10000")]
    InvalidWeight(u16),

    /// The voter's votes would use more than 100% of its power.
    #[error("used too much power: {used} bps after vote")]
    PowerExhausted {
        /// Basis points that would be in use after the vote.
        used: u32,
    },
}

impl OracleError {
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::UnknownGauge(_) => "UnknownGauge",
            OracleError::ZeroAddress => "ZeroAddress",
            OracleError::InvalidWeight(_) => "InvalidWeight",
            OracleError::PowerExhausted { .. } => "PowerExhausted",
        }
    }
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
