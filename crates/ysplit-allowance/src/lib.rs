//! # ysplit-allowance
//!
//! Capability-scoped draw rights on a shared token buffer.
//!
//! A small set of trusted integrators ("spenders") may pull specific tokens
//! from the buffer. Spender status is granted by the owner; draw rights are
//! granted per token by the owner or guardian, only to active spenders, and
//! are mirrored as unlimited ledger approvals from the buffer's address.
//! Removing a spender zeroes every draw right it held.
//!
//! ## Modules
//!
//! - [`registry`]: Spender whitelist and per-token grants

pub mod registry;

pub use registry::{CapabilityAllowanceRegistry, SpenderRecord};

use ysplit_governance::{AccessDenied, GovernanceError};
use ysplit_ledger::LedgerError;
use ysplit_types::{Address, ErrorClass};

/// Error types for allowance registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllowanceError {
    /// The caller lacks the role the operation requires.
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),

    /// The principal is not an active spender.
    #[error("unapproved spender: {0}")]
    UnapprovedSpender(Address),

    /// A principal, token or recipient was the null identity.
    #[error("zero address")]
    ZeroAddress,

    /// The underlying token movement failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    /// Any other governance failure.
    #[error("governance: {0}")]
    Governance(GovernanceError),
}

impl From<GovernanceError> for AllowanceError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::Unauthorized(denied) => AllowanceError::Unauthorized(denied),
            GovernanceError::ZeroAddress => AllowanceError::ZeroAddress,
            other => AllowanceError::Governance(other),
        }
    }
}

impl AllowanceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AllowanceError::Unauthorized(_)
            | AllowanceError::UnapprovedSpender(_)
            | AllowanceError::ZeroAddress => ErrorClass::Configuration,
            AllowanceError::Governance(err) => err.class(),
            AllowanceError::Ledger(_) => ErrorClass::Fatal,
        }
    }

    /// Stable name of the error kind, for callers that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            AllowanceError::Unauthorized(_) => "Unauthorized",
            AllowanceError::UnapprovedSpender(_) => "UnapprovedSpender",
            AllowanceError::ZeroAddress => "ZeroAddress",
            AllowanceError::Ledger(err) => err.kind(),
            AllowanceError::Governance(err) => err.kind(),
        }
    }
}

/// Convenience result type for allowance registry operations.
pub type Result<T> = std::result::Result<T, AllowanceError>;
