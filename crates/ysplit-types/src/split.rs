//! Split tuples, income streams and gauge categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::fixed::{self, PRECISION};
use crate::Address;

/// The two kinds of revenue routed by the splitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeStream {
    /// Protocol fee revenue from the fee-collection relay.
    AdminFee,
    /// Bribes, converted to the settlement token.
    VoteIncentive,
}

impl IncomeStream {
    /// Both streams in stable order.
    pub const ALL: [IncomeStream; 2] = [IncomeStream::AdminFee, IncomeStream::VoteIncentive];

    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeStream::AdminFee => "admin_fee",
            IncomeStream::VoteIncentive => "vote_incentive",
        }
    }

    /// Parse the string form produced by [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stream| stream.as_str() == s)
    }
}

impl fmt::Display for IncomeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An address revenue is collected from, tagged with the stream it feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSource {
    pub address: Address,
    pub stream: IncomeStream,
}

/// A named, mutually exclusive set of governance targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Gauges for the protocol's own liquidity.
    #[serde(rename = "ycrv")]
    YCrv,
    /// Gauges of partner protocols.
    Partner,
    /// Gauges voted at the team's discretion.
    Discretionary,
}

impl Category {
    /// All categories in stable order.
    pub const ALL: [Category; 3] = [Category::YCrv, Category::Partner, Category::Discretionary];

    /// Position in [`ALL`](Self::ALL).
    pub fn index(&self) -> usize {
        match self {
            Category::YCrv => 0,
            Category::Partner => 1,
            Category::Discretionary => 2,
        }
    }

    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::YCrv => "ycrv",
            Category::Partner => "partner",
            Category::Discretionary => "discretionary",
        }
    }

    /// Parse the string form produced by [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule a split-rule update addresses: a category, or the default
/// applied to weight on targets outside every category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    #[serde(rename = "ycrv")]
    YCrv,
    Partner,
    Discretionary,
    Uncategorized,
}

impl RuleScope {
    /// All scopes in stable order.
    pub const ALL: [RuleScope; 4] = [
        RuleScope::YCrv,
        RuleScope::Partner,
        RuleScope::Discretionary,
        RuleScope::Uncategorized,
    ];

    /// The category this scope names, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            RuleScope::YCrv => Some(Category::YCrv),
            RuleScope::Partner => Some(Category::Partner),
            RuleScope::Discretionary => Some(Category::Discretionary),
            RuleScope::Uncategorized => None,
        }
    }

    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self.category() {
            Some(category) => category.as_str(),
            None => "uncategorized",
        }
    }

    /// Parse the string form produced by [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scope| scope.as_str() == s)
    }
}

impl From<Category> for RuleScope {
    fn from(category: Category) -> Self {
        match category {
            Category::YCrv => RuleScope::YCrv,
            Category::Partner => RuleScope::Partner,
            Category::Discretionary => RuleScope::Discretionary,
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three beneficiaries of a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Ybs,
    Treasury,
    Remainder,
}

/// A (YBS, Treasury, Remainder) percentage tuple in [`PRECISION`] units.
///
/// Used both for configured rules and for computed splits. A complete split
/// sums to exactly `PRECISION`.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split {
    #[serde_as(as = "DisplayFromStr")]
    pub ybs: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub treasury: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub remainder: u128,
}

impl Split {
    /// Build a split from raw fixed-point parts.
    pub const fn new(ybs: u128, treasury: u128, remainder: u128) -> Self {
        Self {
            ybs,
            treasury,
            remainder,
        }
    }

    /// Build a split from basis points.
    pub fn from_bps(ybs: u16, treasury: u16, remainder: u16) -> Self {
        Self::new(
            fixed::from_bps(ybs),
            fixed::from_bps(treasury),
            fixed::from_bps(remainder),
        )
    }

    /// Build a split from whole percentages.
    pub fn from_percent(ybs: u8, treasury: u8, remainder: u8) -> Self {
        Self::new(
            fixed::from_percent(ybs),
            fixed::from_percent(treasury),
            fixed::from_percent(remainder),
        )
    }

    /// Build a split whose remainder absorbs everything not assigned to YBS
    /// or the treasury. `None` if the two parts exceed 100%.
    pub fn with_remainder(ybs: u128, treasury: u128) -> Option<Self> {
        let assigned = ybs.checked_add(treasury)?;
        let remainder = PRECISION.checked_sub(assigned)?;
        Some(Self::new(ybs, treasury, remainder))
    }

    /// Sum of the three parts, `None` on overflow.
    pub fn sum(&self) -> Option<u128> {
        self.ybs
            .checked_add(self.treasury)?
            .checked_add(self.remainder)
    }

    /// Whether the parts sum to exactly 100%.
    pub fn is_complete(&self) -> bool {
        self.sum() == Some(PRECISION)
    }

    /// The share assigned to one bucket.
    pub fn get(&self, bucket: Bucket) -> u128 {
        match bucket {
            Bucket::Ybs => self.ybs,
            Bucket::Treasury => self.treasury,
            Bucket::Remainder => self.remainder,
        }
    }
}

/// Splits for both income streams, computed together from one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub admin_fee: Split,
    pub vote_incentive: Split,
}

impl SplitResult {
    /// The split for one stream.
    pub fn for_stream(&self, stream: IncomeStream) -> &Split {
        match stream {
            IncomeStream::AdminFee => &self.admin_fee,
            IncomeStream::VoteIncentive => &self.vote_incentive,
        }
    }
}

/// Token amounts realized by applying a [`Split`] to a pulled total.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    #[serde_as(as = "DisplayFromStr")]
    pub ybs: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub treasury: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub remainder: u128,
}

impl Allocation {
    /// Amount leaving the sources (YBS plus treasury).
    pub fn distributed(&self) -> u128 {
        self.ybs.saturating_add(self.treasury)
    }

    /// Total covered by this allocation.
    pub fn total(&self) -> u128 {
        self.distributed().saturating_add(self.remainder)
    }
}
