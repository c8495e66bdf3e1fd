//! Category sets and the gauge registry.
//!
//! The registry owns the splitter's role record, its three category sets
//! and its split rules. Category sets are only ever replaced whole: the new
//! set is validated in full against the oracle and the other two sets, and
//! nothing changes unless every target passes.

use std::collections::HashSet;

use ysplit_oracle::VoteWeightOracle;
use ysplit_types::events::{AuditEvent, EventKind, Journal};
use ysplit_types::{Address, Category, IncomeStream, RuleScope, Split};

use crate::access::{require_role, AccessControl, Role, RoleResolver};
use crate::rules::SplitRules;
use crate::{GovernanceError, Result, TargetRejection};

/// Category sets, split rules and roles of one splitter.
#[derive(Clone, Debug)]
pub struct GaugeRegistry {
    address: Address,
    access: AccessControl,
    categories: [Vec<Address>; 3],
    rules: SplitRules,
    journal: Journal,
}

impl GaugeRegistry {
    /// Create a registry with empty category sets.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::ZeroAddress`] if `address` is the null identity
    /// - [`GovernanceError::InvalidRule`] if any rule does not sum to 100%
    pub fn new(address: Address, access: AccessControl, rules: SplitRules) -> Result<Self> {
        if address.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        rules.validate()?;
        Ok(Self {
            address,
            access,
            categories: Default::default(),
            rules,
            journal: Journal::new(),
        })
    }

    /// The splitter's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn rules(&self) -> &SplitRules {
        &self.rules
    }

    pub fn rule(&self, stream: IncomeStream, scope: RuleScope) -> Split {
        self.rules.get(stream, scope)
    }

    /// Targets of one category in the order they were set.
    pub fn category_set(&self, category: Category) -> &[Address] {
        &self.categories[category.index()]
    }

    pub fn category_len(&self, category: Category) -> usize {
        self.categories[category.index()].len()
    }

    /// The category `target` belongs to, if any.
    pub fn category_of(&self, target: &Address) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| self.category_set(*category).contains(target))
    }

    /// Replace a category set. Owner only.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::Unauthorized`] if `caller` is not the owner
    /// - [`GovernanceError::InvalidTarget`] for the first target that is
    ///   duplicated, unknown to the oracle, the splitter itself, or already
    ///   in another category; the existing set is left untouched
    pub fn set_category_set<O: VoteWeightOracle + ?Sized>(
        &mut self,
        caller: Address,
        category: Category,
        targets: Vec<Address>,
        oracle: &O,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        self.check_targets(category, &targets)?;
        for target in &targets {
            if !oracle.is_valid_target(target) {
                return Err(reject(category, *target, TargetRejection::Unrecognised));
            }
        }

        tracing::info!(%category, len = targets.len(), "category set replaced");
        self.categories[category.index()] = targets.clone();
        self.journal
            .record(caller, EventKind::CategorySetUpdated { category, targets });
        Ok(())
    }

    /// Load a persisted category set.
    ///
    /// Applies the structural checks of [`set_category_set`](Self::set_category_set)
    /// but neither consults the oracle nor records an event.
    pub fn restore_category_set(&mut self, category: Category, targets: Vec<Address>) -> Result<()> {
        self.check_targets(category, &targets)?;
        self.categories[category.index()] = targets;
        Ok(())
    }

    /// Replace one split rule. Owner only.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::Unauthorized`] if `caller` is not the owner
    /// - [`GovernanceError::InvalidRule`] if the rule does not sum to 100%
    pub fn set_split_rule(
        &mut self,
        caller: Address,
        scope: RuleScope,
        stream: IncomeStream,
        rule: Split,
    ) -> Result<()> {
        require_role(&*self, &caller, &[Role::Owner])?;
        self.rules.set(stream, scope, rule)?;
        tracing::info!(%scope, %stream, ybs = rule.ybs, treasury = rule.treasury, "split rule updated");
        self.journal
            .record(caller, EventKind::SplitRuleUpdated { scope, stream, rule });
        Ok(())
    }

    pub fn set_owner(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.access.set_owner(caller, new_owner, &mut self.journal)
    }

    pub fn set_guardian(&mut self, caller: Address, new_guardian: Address) -> Result<()> {
        self.access
            .set_guardian(caller, new_guardian, &mut self.journal)
    }

    pub fn set_operator(&mut self, caller: Address, new_operator: Address) -> Result<()> {
        self.access
            .set_operator(caller, new_operator, &mut self.journal)
    }

    /// Take every audit event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.journal.drain()
    }

    fn check_targets(&self, category: Category, targets: &[Address]) -> Result<()> {
        let mut seen = HashSet::with_capacity(targets.len());
        for target in targets {
            if !seen.insert(*target) {
                return Err(reject(category, *target, TargetRejection::Duplicate));
            }
            if *target == self.address {
                return Err(reject(category, *target, TargetRejection::SelfAddress));
            }
            if let Some(other) = self.category_of(target).filter(|c| *c != category) {
                return Err(reject(category, *target, TargetRejection::InOtherCategory(other)));
            }
        }
        Ok(())
    }
}

fn reject(category: Category, target: Address, reason: TargetRejection) -> GovernanceError {
    tracing::warn!(%category, %target, %reason, "category target rejected");
    GovernanceError::InvalidTarget {
        category,
        target,
        reason,
    }
}

impl RoleResolver for GaugeRegistry {
    fn has_role(&self, principal: &Address, role: Role) -> bool {
        self.access.has_role(principal, role)
    }
}

#[cfg(test)]
mod tests {
    use ysplit_oracle::GaugeController;

    use super::*;

    const SPLITTER: Address = Address::repeat_byte(0x5f);

    fn owner() -> Address {
        Address::repeat_byte(0xa0)
    }

    fn guardian() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn gauge(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn oracle() -> GaugeController {
        let mut controller = GaugeController::new();
        for i in 1..=9 {
            controller.add_gauge(gauge(i)).expect("add gauge");
        }
        controller
    }

    fn registry() -> GaugeRegistry {
        let access = AccessControl::new(owner(), guardian()).expect("access");
        GaugeRegistry::new(SPLITTER, access, SplitRules::uniform(Split::from_percent(100, 0, 0)))
            .expect("registry")
    }

    #[test]
    fn test_set_category_set() {
        let mut registry = registry();
        registry
            .set_category_set(owner(), Category::YCrv, vec![gauge(1), gauge(2)], &oracle())
            .expect("set ycrv");
        assert_eq!(registry.category_set(Category::YCrv), &[gauge(1), gauge(2)]);
        assert_eq!(registry.category_len(Category::YCrv), 2);
        assert_eq!(registry.category_of(&gauge(2)), Some(Category::YCrv));
        assert_eq!(registry.category_of(&gauge(3)), None);

        let events = registry.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor, owner());
    }

    #[test]
    fn test_set_category_set_owner_only() {
        let mut registry = registry();
        let err = registry
            .set_category_set(guardian(), Category::YCrv, vec![gauge(1)], &oracle())
            .expect_err("guardian");
        assert!(matches!(err, GovernanceError::Unauthorized(_)));
        assert_eq!(registry.category_len(Category::YCrv), 0);
    }

    #[test]
    fn test_duplicate_rejected_and_prior_set_kept() {
        let mut registry = registry();
        let oracle = oracle();
        registry
            .set_category_set(owner(), Category::Partner, vec![gauge(1), gauge(2)], &oracle)
            .expect("initial");
        let err = registry
            .set_category_set(
                owner(),
                Category::Partner,
                vec![gauge(1), gauge(2), gauge(1), gauge(2)],
                &oracle,
            )
            .expect_err("duplicates");
        assert!(matches!(
            err,
            GovernanceError::InvalidTarget {
                reason: TargetRejection::Duplicate,
                ..
            }
        ));
        assert_eq!(registry.category_set(Category::Partner), &[gauge(1), gauge(2)]);
    }

    #[test]
    fn test_unrecognised_and_self_rejected() {
        let mut registry = registry();
        let oracle = oracle();
        let err = registry
            .set_category_set(owner(), Category::YCrv, vec![gauge(42)], &oracle)
            .expect_err("unknown gauge");
        assert!(matches!(
            err,
            GovernanceError::InvalidTarget {
                reason: TargetRejection::Unrecognised,
                ..
            }
        ));

        let err = registry
            .set_category_set(owner(), Category::YCrv, vec![SPLITTER], &oracle)
            .expect_err("self address");
        assert!(matches!(
            err,
            GovernanceError::InvalidTarget {
                reason: TargetRejection::SelfAddress,
                ..
            }
        ));
    }

    #[test]
    fn test_cross_category_overlap_rejected() {
        let mut registry = registry();
        let oracle = oracle();
        registry
            .set_category_set(owner(), Category::YCrv, vec![gauge(1)], &oracle)
            .expect("ycrv");
        let err = registry
            .set_category_set(owner(), Category::Discretionary, vec![gauge(3), gauge(1)], &oracle)
            .expect_err("overlap");
        assert_eq!(
            err,
            GovernanceError::InvalidTarget {
                category: Category::Discretionary,
                target: gauge(1),
                reason: TargetRejection::InOtherCategory(Category::YCrv),
            }
        );
        assert_eq!(registry.category_len(Category::Discretionary), 0);

        // Re-setting the same category with an overlapping member is fine.
        registry
            .set_category_set(owner(), Category::YCrv, vec![gauge(1), gauge(4)], &oracle)
            .expect("replace ycrv");
    }

    #[test]
    fn test_empty_set_clears_category() {
        let mut registry = registry();
        let oracle = oracle();
        registry
            .set_category_set(owner(), Category::Partner, vec![gauge(5)], &oracle)
            .expect("set");
        registry
            .set_category_set(owner(), Category::Partner, Vec::new(), &oracle)
            .expect("clear");
        assert_eq!(registry.category_len(Category::Partner), 0);
    }

    #[test]
    fn test_restore_skips_oracle_but_checks_structure() {
        let mut registry = registry();
        registry
            .restore_category_set(Category::YCrv, vec![gauge(42)])
            .expect("restore");
        assert!(registry.drain_events().is_empty());
        assert!(registry
            .restore_category_set(Category::Partner, vec![gauge(42)])
            .is_err());
    }

    #[test]
    fn test_set_split_rule() {
        let mut registry = registry();
        registry
            .set_split_rule(
                owner(),
                RuleScope::Uncategorized,
                IncomeStream::VoteIncentive,
                Split::from_percent(0, 100, 0),
            )
            .expect("set rule");
        assert_eq!(
            registry.rule(IncomeStream::VoteIncentive, RuleScope::Uncategorized),
            Split::from_percent(0, 100, 0)
        );

        let err = registry
            .set_split_rule(
                owner(),
                RuleScope::YCrv,
                IncomeStream::AdminFee,
                Split::from_percent(90, 0, 0),
            )
            .expect_err("incomplete");
        assert!(matches!(err, GovernanceError::InvalidRule { .. }));

        assert!(registry
            .set_split_rule(
                guardian(),
                RuleScope::YCrv,
                IncomeStream::AdminFee,
                Split::from_percent(100, 0, 0),
            )
            .is_err());
    }

    #[test]
    fn test_new_rejects_bad_rules() {
        let access = AccessControl::new(owner(), guardian()).expect("access");
        let err = GaugeRegistry::new(SPLITTER, access, SplitRules::uniform(Split::from_percent(1, 1, 1)))
            .expect_err("bad rules");
        assert!(matches!(err, GovernanceError::InvalidRule { .. }));
    }

    #[test]
    fn test_role_changes_recorded() {
        let mut registry = registry();
        registry
            .set_guardian(owner(), gauge(7))
            .expect("set guardian");
        registry
            .set_operator(owner(), gauge(8))
            .expect("set operator");
        assert!(registry.has_role(&gauge(7), Role::Guardian));
        assert!(registry.has_role(&gauge(8), Role::Operator));
        let names: Vec<_> = registry
            .drain_events()
            .iter()
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(names, vec!["guardian_changed", "operator_changed"]);
    }
}
