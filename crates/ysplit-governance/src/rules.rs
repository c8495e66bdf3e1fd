//! Split rules.
//!
//! Each income stream carries four rules: one per category plus a default
//! for weight on targets outside every category. A rule is only ever
//! stored after its parts have been checked to sum to exactly 100%.

use serde::{Deserialize, Serialize};
use ysplit_types::{IncomeStream, RuleScope, Split};

use crate::{GovernanceError, Result};

/// The four rules of one income stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRules {
    pub ycrv: Split,
    pub partner: Split,
    pub discretionary: Split,
    pub uncategorized: Split,
}

impl StreamRules {
    /// The same rule for every scope.
    pub fn uniform(rule: Split) -> Self {
        Self {
            ycrv: rule,
            partner: rule,
            discretionary: rule,
            uncategorized: rule,
        }
    }

    pub fn get(&self, scope: RuleScope) -> Split {
        match scope {
            RuleScope::YCrv => self.ycrv,
            RuleScope::Partner => self.partner,
            RuleScope::Discretionary => self.discretionary,
            RuleScope::Uncategorized => self.uncategorized,
        }
    }

    fn slot(&mut self, scope: RuleScope) -> &mut Split {
        match scope {
            RuleScope::YCrv => &mut self.ycrv,
            RuleScope::Partner => &mut self.partner,
            RuleScope::Discretionary => &mut self.discretionary,
            RuleScope::Uncategorized => &mut self.uncategorized,
        }
    }
}

/// Rules for both income streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRules {
    pub admin_fee: StreamRules,
    pub vote_incentive: StreamRules,
}

impl SplitRules {
    /// The same rule for every stream and scope.
    pub fn uniform(rule: Split) -> Self {
        Self {
            admin_fee: StreamRules::uniform(rule),
            vote_incentive: StreamRules::uniform(rule),
        }
    }

    pub fn stream(&self, stream: IncomeStream) -> &StreamRules {
        match stream {
            IncomeStream::AdminFee => &self.admin_fee,
            IncomeStream::VoteIncentive => &self.vote_incentive,
        }
    }

    pub fn get(&self, stream: IncomeStream, scope: RuleScope) -> Split {
        self.stream(stream).get(scope)
    }

    /// Check every rule sums to 100%.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::InvalidRule`] naming the first incomplete rule
    pub fn validate(&self) -> Result<()> {
        for stream in IncomeStream::ALL {
            for scope in RuleScope::ALL {
                validate_rule(scope, stream, &self.get(stream, scope))?;
            }
        }
        Ok(())
    }

    /// Replace one rule after validating it.
    pub fn set(&mut self, stream: IncomeStream, scope: RuleScope, rule: Split) -> Result<()> {
        validate_rule(scope, stream, &rule)?;
        let rules = match stream {
            IncomeStream::AdminFee => &mut self.admin_fee,
            IncomeStream::VoteIncentive => &mut self.vote_incentive,
        };
        *rules.slot(scope) = rule;
        Ok(())
    }
}

fn validate_rule(scope: RuleScope, stream: IncomeStream, rule: &Split) -> Result<()> {
    if !rule.is_complete() {
        return Err(GovernanceError::InvalidRule { scope, stream });
    }
    Ok(())
}
