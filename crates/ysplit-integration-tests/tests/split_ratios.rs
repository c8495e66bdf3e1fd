//! Integration test: split ratios derived from live vote weights.
//!
//! Exercises the calculator against the in-process gauge controller:
//! 1. Random rules and weight distributions always give complete splits
//! 2. No categorised weight yields the default rule exactly
//! 3. All weight on one ycrv gauge yields that category's rule
//! 4. Zero voting power and inconsistent weights are reported, not clamped
//! 5. Splits follow vote changes with no caching in between

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ysplit_governance::SplitRules;
use ysplit_integration_tests::{gauge, World, VOTER};
use ysplit_revenue::RevenueError;
use ysplit_types::{Category, IncomeStream, RuleScope, Split, PRECISION};

fn random_rule(rng: &mut StdRng) -> Split {
    let ybs = rng.gen_range(0..=PRECISION);
    let treasury = rng.gen_range(0..=PRECISION - ybs);
    Split::with_remainder(ybs, treasury).expect("parts fit")
}

fn random_rules(rng: &mut StdRng) -> SplitRules {
    let mut rules = SplitRules::uniform(Split::from_percent(0, 0, 100));
    for stream in IncomeStream::ALL {
        for scope in RuleScope::ALL {
            rules.set(stream, scope, random_rule(rng)).expect("complete rule");
        }
    }
    rules
}

#[test]
fn splits_always_sum_to_precision() {
    let mut rng = StdRng::seed_from_u64(0x5917);

    for _ in 0..200 {
        let mut world = World::new(random_rules(&mut rng)).expect("world");
        world
            .set_category(Category::YCrv, vec![gauge(1), gauge(2)])
            .expect("ycrv");
        world
            .set_category(Category::Partner, vec![gauge(3), gauge(4)])
            .expect("partner");
        world
            .set_category(Category::Discretionary, vec![gauge(5)])
            .expect("discretionary");

        // Weights on categorised and uncategorised gauges, plus unallocated power.
        let mut weights = Vec::new();
        let mut allocated = 0u128;
        for n in 1..=7 {
            let weight = rng.gen_range(0..=10u128.pow(24));
            allocated += weight;
            weights.push((gauge(n), weight));
        }
        let power = allocated + rng.gen_range(1..=10u128.pow(24));
        world.vote(power, &weights).expect("vote");

        let splits = world.compute_splits().expect("splits");
        for stream in IncomeStream::ALL {
            let split = splits.for_stream(stream);
            assert_eq!(split.sum(), Some(PRECISION), "{stream} split incomplete: {split:?}");
        }
    }
}

#[test]
fn uncategorized_weight_uses_default_rule() {
    let mut rules = SplitRules::uniform(Split::from_percent(100, 0, 0));
    rules
        .set(IncomeStream::AdminFee, RuleScope::Uncategorized, Split::from_percent(10, 20, 70))
        .expect("admin default");
    rules
        .set(IncomeStream::VoteIncentive, RuleScope::Uncategorized, Split::from_percent(0, 45, 55))
        .expect("vote default");
    let mut world = World::new(rules).expect("world");
    world
        .set_category(Category::YCrv, vec![gauge(1)])
        .expect("ycrv");

    // Weight only on a gauge outside every category, plus unallocated power.
    world.vote(1_000, &[(gauge(8), 600)]).expect("vote");

    let splits = world.compute_splits().expect("splits");
    assert_eq!(splits.admin_fee, Split::from_percent(10, 20, 70));
    assert_eq!(splits.vote_incentive, Split::from_percent(0, 45, 55));
}

#[test]
fn single_ycrv_gauge_takes_category_rule() {
    let mut rules = SplitRules::uniform(Split::from_percent(0, 0, 100));
    rules
        .set(IncomeStream::AdminFee, RuleScope::YCrv, Split::from_percent(100, 0, 0))
        .expect("ycrv rule");
    let mut world = World::new(rules).expect("world");
    world
        .set_category(Category::YCrv, vec![gauge(1)])
        .expect("ycrv");
    world.vote(7_777, &[(gauge(1), 7_777)]).expect("vote");

    let splits = world.compute_splits().expect("splits");
    assert_eq!(splits.admin_fee, Split::from_percent(100, 0, 0));
    // The vote-incentive ycrv rule was left at its default.
    assert_eq!(splits.vote_incentive, Split::from_percent(0, 0, 100));
}

#[test]
fn weighted_average_with_dust_in_remainder() {
    let mut rules = SplitRules::uniform(Split::from_percent(0, 0, 100));
    for stream in IncomeStream::ALL {
        rules
            .set(stream, RuleScope::YCrv, Split::from_percent(100, 0, 0))
            .expect("ycrv");
        rules
            .set(stream, RuleScope::Partner, Split::from_percent(0, 100, 0))
            .expect("partner");
    }
    let mut world = World::new(rules).expect("world");
    world
        .set_category(Category::YCrv, vec![gauge(1)])
        .expect("ycrv");
    world
        .set_category(Category::Partner, vec![gauge(2)])
        .expect("partner");
    // One third each: ycrv, partner, unallocated.
    world.vote(3, &[(gauge(1), 1), (gauge(2), 1)]).expect("vote");

    let split = world.compute_splits().expect("splits").admin_fee;
    assert_eq!(split.ybs, PRECISION / 3);
    assert_eq!(split.treasury, PRECISION / 3);
    assert_eq!(split.remainder, PRECISION - 2 * (PRECISION / 3));
}

#[test]
fn zero_voting_power_is_reported() {
    let world = World::new(SplitRules::uniform(Split::from_percent(50, 50, 0))).expect("world");
    assert_eq!(
        world.compute_splits(),
        Err(RevenueError::NoVotingPower { voter: VOTER })
    );
}

#[test]
fn inconsistent_weights_are_reported() {
    let mut world = World::new(SplitRules::uniform(Split::from_percent(50, 50, 0))).expect("world");
    world
        .set_category(Category::Partner, vec![gauge(2), gauge(3)])
        .expect("partner");
    world
        .vote(100, &[(gauge(2), 80), (gauge(3), 30)])
        .expect("vote");

    assert_eq!(
        world.compute_splits(),
        Err(RevenueError::InconsistentVoteState {
            categorized: 110,
            total: 100
        })
    );
}

#[test]
fn splits_track_vote_changes() {
    let mut rules = SplitRules::uniform(Split::from_percent(0, 100, 0));
    rules
        .set(IncomeStream::AdminFee, RuleScope::YCrv, Split::from_percent(100, 0, 0))
        .expect("ycrv");
    let mut world = World::new(rules).expect("world");
    world
        .set_category(Category::YCrv, vec![gauge(1)])
        .expect("ycrv");

    world.oracle.set_voting_power(VOTER, 10_000).expect("power");
    world
        .oracle
        .vote_for_gauge_weights(VOTER, gauge(1), 10_000)
        .expect("vote");
    assert_eq!(world.compute_splits().expect("splits").admin_fee.ybs, PRECISION);

    world
        .oracle
        .vote_for_gauge_weights(VOTER, gauge(1), 2_500)
        .expect("re-vote");
    let split = world.compute_splits().expect("splits").admin_fee;
    assert_eq!(split.ybs, PRECISION / 4);
    assert_eq!(split.treasury, PRECISION * 3 / 4);
}
