//! Audit events.
//!
//! Every state-mutating entry point records one of these after it commits.
//! The daemon drains them into the audit log in emission order.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::split::{Allocation, Category, IncomeStream, RevenueSource, RuleScope, Split};
use crate::{Address, TokenAddress};

/// One committed state change and the principal that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: Address,
    pub kind: EventKind,
}

impl AuditEvent {
    pub fn new(actor: Address, kind: EventKind) -> Self {
        Self { actor, kind }
    }
}

/// All audit event kinds.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // Governance
    OwnerChanged {
        previous: Address,
        new: Address,
    },
    GuardianChanged {
        previous: Address,
        new: Address,
    },
    OperatorChanged {
        previous: Option<Address>,
        new: Address,
    },
    CategorySetUpdated {
        category: Category,
        targets: Vec<Address>,
    },
    SplitRuleUpdated {
        scope: RuleScope,
        stream: IncomeStream,
        rule: Split,
    },

    // Allowance registry
    SpenderApproved {
        spender: Address,
    },
    SpenderRevoked {
        spender: Address,
        revoked_tokens: Vec<TokenAddress>,
    },
    AllowanceGranted {
        spender: Address,
        /// Tokens newly granted by this call; re-grants are omitted.
        tokens: Vec<TokenAddress>,
    },
    AllowanceRevoked {
        spender: Address,
        tokens: Vec<TokenAddress>,
    },

    // Executor
    AdminFeesDeposited {
        #[serde_as(as = "DisplayFromStr")]
        amount: u128,
    },
    AdminFeeSplit {
        allocation: Allocation,
    },
    VoteIncentiveSplit {
        allocation: Allocation,
    },
    SourcesUpdated {
        sources: Vec<RevenueSource>,
    },
    TreasuryChanged {
        previous: Address,
        new: Address,
    },

    // Shared
    Swept {
        token: TokenAddress,
        to: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: u128,
    },
}

impl EventKind {
    /// Stable event name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::OwnerChanged { .. } => "owner_changed",
            EventKind::GuardianChanged { .. } => "guardian_changed",
            EventKind::OperatorChanged { .. } => "operator_changed",
            EventKind::CategorySetUpdated { .. } => "category_set_updated",
            EventKind::SplitRuleUpdated { .. } => "split_rule_updated",
            EventKind::SpenderApproved { .. } => "spender_approved",
            EventKind::SpenderRevoked { .. } => "spender_revoked",
            EventKind::AllowanceGranted { .. } => "allowance_granted",
            EventKind::AllowanceRevoked { .. } => "allowance_revoked",
            EventKind::AdminFeesDeposited { .. } => "admin_fees_deposited",
            EventKind::AdminFeeSplit { .. } => "admin_fee_split",
            EventKind::VoteIncentiveSplit { .. } => "vote_incentive_split",
            EventKind::SourcesUpdated { .. } => "sources_updated",
            EventKind::TreasuryChanged { .. } => "treasury_changed",
            EventKind::Swept { .. } => "swept",
        }
    }

    /// The split event for a stream.
    pub fn split_for(stream: IncomeStream, allocation: Allocation) -> Self {
        match stream {
            IncomeStream::AdminFee => EventKind::AdminFeeSplit { allocation },
            IncomeStream::VoteIncentive => EventKind::VoteIncentiveSplit { allocation },
        }
    }
}

/// Collects audit events until the owner drains them.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    pending: Vec<AuditEvent>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn record(&mut self, actor: Address, kind: EventKind) {
        self.pending.push(AuditEvent::new(actor, kind));
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Events recorded and not yet drained.
    pub fn pending(&self) -> &[AuditEvent] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_matches_tag() {
        let kind = EventKind::Swept {
            token: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            amount: 5,
        };
        let json = serde_json::to_value(&kind).expect("serialize");
        assert_eq!(json["type"], kind.name());
        assert_eq!(json["amount"], "5");
    }

    #[test]
    fn test_split_for_stream() {
        let allocation = Allocation {
            ybs: 1,
            treasury: 2,
            remainder: 3,
        };
        assert_eq!(
            EventKind::split_for(IncomeStream::AdminFee, allocation).name(),
            "admin_fee_split"
        );
        assert_eq!(
            EventKind::split_for(IncomeStream::VoteIncentive, allocation).name(),
            "vote_incentive_split"
        );
    }

    #[test]
    fn test_journal_drains_in_order() {
        let mut journal = Journal::new();
        let actor = Address::repeat_byte(9);
        journal.record(actor, EventKind::SpenderApproved { spender: Address::repeat_byte(1) });
        journal.record(actor, EventKind::SpenderApproved { spender: Address::repeat_byte(2) });
        assert_eq!(journal.pending().len(), 2);

        let events = journal.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].kind,
            EventKind::SpenderApproved { spender: Address::repeat_byte(1) }
        );
        assert!(journal.drain().is_empty());
    }

    #[test]
    fn test_event_roundtrip_json() {
        let event = AuditEvent::new(
            Address::repeat_byte(3),
            EventKind::CategorySetUpdated {
                category: Category::Partner,
                targets: vec![Address::repeat_byte(4)],
            },
        );
        let text = serde_json::to_string(&event).expect("serialize");
        let back: AuditEvent = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, event);
    }
}
