//! # ysplit-governance
//!
//! Roles and gauge categorisation.
//!
//! Three principals administer the splitter: an owner with full authority,
//! a guardian that may trigger splits and revoke capabilities, and an
//! operator that may feed admin fees in directly. Governance targets
//! (gauges) are sorted into three mutually exclusive categories, and each
//! category carries one split rule per income stream.
//!
//! ## Modules
//!
//! - [`access`]: Roles, role checks and the owner/guardian/operator record
//! - [`rules`]: Per-stream, per-category split rules
//! - [`gauges`]: Category sets and the registry that owns them

pub mod access;
pub mod gauges;
pub mod rules;

pub use access::{require_role, AccessControl, AccessDenied, Role, RoleResolver};
pub use gauges::GaugeRegistry;
pub use rules::{SplitRules, StreamRules};

use ysplit_types::{Address, Category, ErrorClass, IncomeStream, RuleScope};

/// Why a target was refused by [`GaugeRegistry::set_category_set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TargetRejection {
    /// The target appears more than once in the new set.
    #[error("duplicate within set")]
    Duplicate,

    /// The vote-weight oracle does not recognise the target.
    #[error("not a recognised gauge")]
    Unrecognised,

    /// The target is the splitter's own address.
    #[error("splitter's own address")]
    SelfAddress,

    /// The target already belongs to another category.
    #[error("already in category {0}")]
    InOtherCategory(Category),
}

/// Error types for governance operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    /// The caller lacks the role the operation requires.
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),

    /// A role holder or recipient was set to the null identity.
    #[error("zero address")]
    ZeroAddress,

    /// A category set contains an unacceptable target.
    #[error("invalid target {target} for {category}: {reason}")]
    InvalidTarget {
        /// Category being replaced.
        category: Category,
        /// Offending target.
        target: Address,
        /// Why it was refused.
        reason: TargetRejection,
    },

    /// A split rule does not sum to exactly 100%.
    #[error("invalid split rule for {scope}/{stream}: parts must sum to 100%")]
    InvalidRule {
        /// Scope of the rule.
        scope: RuleScope,
        /// Income stream of the rule.
        stream: IncomeStream,
    },
}

impl GovernanceError {
    /// Every governance failure is a configuration problem.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Configuration
    }

    /// Stable name of the error kind, for callers that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            GovernanceError::Unauthorized(_) => "Unauthorized",
            GovernanceError::ZeroAddress => "ZeroAddress",
            GovernanceError::InvalidTarget { .. } => "InvalidTarget",
            GovernanceError::InvalidRule { .. } => "InvalidRule",
        }
    }
}

/// Convenience result type for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;
