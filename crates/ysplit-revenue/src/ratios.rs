//! Split-ratio calculation from live vote weights.
//!
//! For each income stream, the YBS and treasury percentages are the
//! weight-averaged rule values over the voter's categorised weight plus the
//! uncategorised default, divided once by the voter's total weight:
//!
//! ```text
//! pct[B] = (Σ_c weight[c] * rule[c][B] + uncategorised * default[B]) / total
//! ```
//!
//! The remainder is `PRECISION - ybs - treasury`, never summed on its own,
//! so both splits add up to exactly 100%.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use ysplit_governance::{GaugeRegistry, SplitRules};
use ysplit_oracle::VoteWeightOracle;
use ysplit_types::{
    Address, Category, IncomeStream, RuleScope, Split, SplitResult, WeightedSum,
};

use crate::{Result, RevenueError};

/// Weight on one target.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWeight {
    pub target: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub weight: u128,
}

/// Weight on one category, with its per-target breakdown.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub category: Category,
    #[serde_as(as = "DisplayFromStr")]
    pub weight: u128,
    pub targets: Vec<TargetWeight>,
}

/// One voter's weight as seen by the calculator at a single point in time.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteWeightSnapshot {
    pub voter: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub total: u128,
    /// One entry per category, in [`Category::ALL`] order.
    pub categories: Vec<CategoryWeight>,
    /// Weight outside every category; `None` when categorised weight
    /// exceeds the total.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub uncategorized: Option<u128>,
}

impl VoteWeightSnapshot {
    /// Sum of weight on categorised targets.
    pub fn categorized(&self) -> u128 {
        self.categories
            .iter()
            .fold(0u128, |acc, c| acc.saturating_add(c.weight))
    }

    pub fn category(&self, category: Category) -> &CategoryWeight {
        &self.categories[category.index()]
    }
}

/// Read the voter's weight on every categorised target.
///
/// Each target and the voter's total are read exactly once.
///
/// # Errors
///
/// - [`RevenueError::Overflow`] if the categorised weights overflow `u128`
pub fn vote_snapshot<O: VoteWeightOracle + ?Sized>(
    registry: &GaugeRegistry,
    oracle: &O,
    voter: &Address,
) -> Result<VoteWeightSnapshot> {
    let total = oracle.total_weight(voter);

    let mut categories = Vec::with_capacity(Category::ALL.len());
    let mut categorized = 0u128;
    for category in Category::ALL {
        let mut weight = 0u128;
        let targets: Vec<TargetWeight> = registry
            .category_set(category)
            .iter()
            .map(|target| TargetWeight {
                target: *target,
                weight: oracle.weight_of(target, voter),
            })
            .collect();
        for t in &targets {
            weight = weight.checked_add(t.weight).ok_or(RevenueError::Overflow)?;
        }
        categorized = categorized
            .checked_add(weight)
            .ok_or(RevenueError::Overflow)?;
        categories.push(CategoryWeight {
            category,
            weight,
            targets,
        });
    }

    Ok(VoteWeightSnapshot {
        voter: *voter,
        total,
        categories,
        uncategorized: total.checked_sub(categorized),
    })
}

/// Compute the admin-fee and vote-incentive splits for `voter`.
///
/// # Errors
///
/// - [`RevenueError::NoVotingPower`] if the voter's total weight is zero
/// - [`RevenueError::InconsistentVoteState`] if categorised weight exceeds the total
pub fn compute_splits<O: VoteWeightOracle + ?Sized>(
    registry: &GaugeRegistry,
    oracle: &O,
    voter: &Address,
) -> Result<SplitResult> {
    let snapshot = vote_snapshot(registry, oracle, voter)?;
    splits_from_snapshot(&snapshot, registry.rules())
}

/// Compute both splits from an already-taken snapshot.
pub fn splits_from_snapshot(snapshot: &VoteWeightSnapshot, rules: &SplitRules) -> Result<SplitResult> {
    if snapshot.total == 0 {
        tracing::debug!(voter = %snapshot.voter, "no voting power");
        return Err(RevenueError::NoVotingPower {
            voter: snapshot.voter,
        });
    }
    let uncategorized = snapshot.uncategorized.ok_or_else(|| {
        let categorized = snapshot.categorized();
        tracing::warn!(categorized, total = snapshot.total, "categorised weight exceeds total");
        RevenueError::InconsistentVoteState {
            categorized,
            total: snapshot.total,
        }
    })?;

    let admin_fee = stream_split(snapshot, uncategorized, rules, IncomeStream::AdminFee)?;
    let vote_incentive = stream_split(snapshot, uncategorized, rules, IncomeStream::VoteIncentive)?;

    tracing::debug!(
        total = snapshot.total,
        uncategorized,
        admin_ybs = admin_fee.ybs,
        admin_treasury = admin_fee.treasury,
        vi_ybs = vote_incentive.ybs,
        vi_treasury = vote_incentive.treasury,
        "splits computed"
    );

    Ok(SplitResult {
        admin_fee,
        vote_incentive,
    })
}

fn stream_split(
    snapshot: &VoteWeightSnapshot,
    uncategorized: u128,
    rules: &SplitRules,
    stream: IncomeStream,
) -> Result<Split> {
    let mut ybs = WeightedSum::zero();
    let mut treasury = WeightedSum::zero();

    for entry in &snapshot.categories {
        let rule = rules.get(stream, RuleScope::from(entry.category));
        ybs.add(entry.weight, rule.ybs);
        treasury.add(entry.weight, rule.treasury);
    }
    let default = rules.get(stream, RuleScope::Uncategorized);
    ybs.add(uncategorized, default.ybs);
    treasury.add(uncategorized, default.treasury);

    let ybs = ybs.div(snapshot.total).ok_or(RevenueError::Overflow)?;
    let treasury = treasury.div(snapshot.total).ok_or(RevenueError::Overflow)?;
    Split::with_remainder(ybs, treasury).ok_or(RevenueError::Overflow)
}
