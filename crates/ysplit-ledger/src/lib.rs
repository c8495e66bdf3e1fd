//! # ysplit-ledger
//!
//! In-process model of the external token state the splitter operates on:
//! per-token balances and per-(owner, spender) draw rights, with ERC-20
//! transfer and `transfer_from` semantics.
//!
//! The ledger is a plain value. Multi-step operations that must be
//! all-or-nothing run against a clone and are committed by replacing the
//! original only on success.
//!
//! ## Modules
//!
//! - [`ledger`]: Balances, draw rights and transfers

pub mod ledger;

pub use ledger::{Ledger, UNLIMITED};

use ysplit_types::{Address, TokenAddress};

/// Error types for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The source does not hold enough tokens.
    #[error("insufficient balance of {token} at {owner}: have {available}, need {required}")]
    InsufficientBalance {
        /// Token being moved.
        token: TokenAddress,
        /// Holder being debited.
        owner: Address,
        /// Current balance.
        available: u128,
        /// Amount requested.
        required: u128,
    },

    /// The spender's draw right on the owner is too small.
    #[error(
        "insufficient draw right on {token}: {spender} may take {available} from {owner}, needs {required}"
    )]
    InsufficientAllowance {
        /// Token being drawn.
        token: TokenAddress,
        /// Holder granting the right.
        owner: Address,
        /// Principal drawing.
        spender: Address,
        /// Remaining draw right.
        available: u128,
        /// Amount requested.
        required: u128,
    },

    /// A transfer names the null address as recipient.
    #[error("transfer to the zero address")]
    ZeroAddress,

    /// Arithmetic overflow.
    #[error("arithmetic overflow in ledger")]
    Overflow,
}

impl LedgerError {
    /// Stable name of the error kind, for callers that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
            LedgerError::InsufficientAllowance { .. } => "InsufficientAllowance",
            LedgerError::ZeroAddress => "ZeroAddress",
            LedgerError::Overflow => "Overflow",
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
