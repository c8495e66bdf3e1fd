//! Integration test support for the ysplit workspace.
//!
//! [`World`] wires a gauge registry, an allowance registry and a split
//! executor to an in-process gauge controller, ledger and vault sink, the
//! way the daemon does. Scenarios live under `tests/`.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p ysplit-integration-tests
//! ```

use std::error::Error;

use ysplit_allowance::CapabilityAllowanceRegistry;
use ysplit_governance::{AccessControl, GaugeRegistry, SplitRules};
use ysplit_ledger::{Ledger, UNLIMITED};
use ysplit_oracle::GaugeController;
use ysplit_revenue::{ExecutionReport, RevenueSource, SplitExecutor, VaultSink};
use ysplit_types::{Address, Category, IncomeStream, SplitResult, TokenAddress};

pub type Fallible<T> = std::result::Result<T, Box<dyn Error>>;

pub const OWNER: Address = Address::repeat_byte(0xa0);
pub const GUARDIAN: Address = Address::repeat_byte(0xa1);
pub const OPERATOR: Address = Address::repeat_byte(0xa2);
pub const STRANGER: Address = Address::repeat_byte(0xee);

pub const REGISTRY: Address = Address::repeat_byte(0x51);
pub const BUFFER: Address = Address::repeat_byte(0x52);
pub const EXECUTOR: Address = Address::repeat_byte(0x53);
pub const SINK: Address = Address::repeat_byte(0x55);
pub const TREASURY: Address = Address::repeat_byte(0x7e);
pub const VOTER: Address = Address::repeat_byte(0x77);
pub const SETTLEMENT: TokenAddress = Address::repeat_byte(0xcc);

/// Fee-collection relay: admin-fee income.
pub const FEE_RELAY: Address = Address::repeat_byte(0x10);
/// Bribe-conversion buffer: vote-incentive income.
pub const BRIBE_BUFFER: Address = Address::repeat_byte(0x11);
/// Voting delegate account: vote-incentive income.
pub const DELEGATE: Address = Address::repeat_byte(0x12);

/// Number of gauges registered with the controller.
pub const GAUGES: u8 = 9;

/// Gauge `n`, for `n` in `1..=GAUGES`.
pub fn gauge(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// The whole splitter plus its counterparties.
pub struct World {
    pub registry: GaugeRegistry,
    pub allowances: CapabilityAllowanceRegistry,
    pub executor: SplitExecutor,
    pub oracle: GaugeController,
    pub ledger: Ledger,
    pub sink: VaultSink,
}

impl World {
    /// A world with the given rules, three revenue sources that have each
    /// granted the executor an unlimited draw right, and no votes.
    pub fn new(rules: SplitRules) -> Fallible<Self> {
        let mut oracle = GaugeController::new();
        for n in 1..=GAUGES {
            oracle.add_gauge(gauge(n))?;
        }

        let access = AccessControl::new(OWNER, GUARDIAN)?.with_operator(OPERATOR)?;
        let registry = GaugeRegistry::new(REGISTRY, access, rules)?;
        let allowances =
            CapabilityAllowanceRegistry::new(BUFFER, AccessControl::new(OWNER, GUARDIAN)?)?;
        let sources = vec![
            RevenueSource {
                address: FEE_RELAY,
                stream: IncomeStream::AdminFee,
            },
            RevenueSource {
                address: BRIBE_BUFFER,
                stream: IncomeStream::VoteIncentive,
            },
            RevenueSource {
                address: DELEGATE,
                stream: IncomeStream::VoteIncentive,
            },
        ];
        let executor = SplitExecutor::new(EXECUTOR, SETTLEMENT, VOTER, TREASURY, sources)?;

        let mut ledger = Ledger::new();
        for source in [FEE_RELAY, BRIBE_BUFFER, DELEGATE] {
            ledger.approve(SETTLEMENT, source, EXECUTOR, UNLIMITED);
        }

        Ok(Self {
            registry,
            allowances,
            executor,
            oracle,
            ledger,
            sink: VaultSink::new(SINK)?,
        })
    }

    /// Mint settlement tokens to `to`.
    pub fn fund(&mut self, to: Address, amount: u128) -> Fallible<()> {
        self.ledger.mint(SETTLEMENT, to, amount)?;
        Ok(())
    }

    pub fn balance(&self, owner: &Address) -> u128 {
        self.ledger.balance_of(&SETTLEMENT, owner)
    }

    /// Give the voter `power` and pin raw weights on gauges.
    pub fn vote(&mut self, power: u128, weights: &[(Address, u128)]) -> Fallible<()> {
        self.oracle.set_voting_power(VOTER, power)?;
        for (target, weight) in weights {
            self.oracle.dev_set_vote(VOTER, *target, *weight)?;
        }
        Ok(())
    }

    pub fn set_category(&mut self, category: Category, targets: Vec<Address>) -> Fallible<()> {
        self.registry
            .set_category_set(OWNER, category, targets, &self.oracle)?;
        Ok(())
    }

    pub fn compute_splits(&self) -> ysplit_revenue::Result<SplitResult> {
        ysplit_revenue::compute_splits(&self.registry, &self.oracle, &VOTER)
    }

    pub fn execute_split(&mut self, caller: Address) -> ysplit_revenue::Result<ExecutionReport> {
        self.executor.execute_split(
            caller,
            &self.registry,
            &self.oracle,
            &mut self.ledger,
            &self.sink,
        )
    }

    pub fn deposit_and_split(
        &mut self,
        caller: Address,
        amount: u128,
    ) -> ysplit_revenue::Result<ExecutionReport> {
        self.executor.deposit_and_split(
            caller,
            amount,
            &self.registry,
            &self.oracle,
            &mut self.ledger,
            &self.sink,
        )
    }

    /// Settlement-token balance of every party the splitter touches.
    pub fn balances(&self) -> Vec<(Address, u128)> {
        [FEE_RELAY, BRIBE_BUFFER, DELEGATE, EXECUTOR, TREASURY, SINK, OPERATOR]
            .into_iter()
            .map(|who| (who, self.balance(&who)))
            .collect()
    }
}
