//! Collecting and distributing revenue.
//!
//! One split cycle measures the settlement-token balance at every revenue
//! source, computes both splits once, pulls exactly the YBS and treasury
//! shares out of each stream's sources, pays the treasury and hands the
//! YBS share to the reward sink. The remainder is never pulled, so it stays
//! where it was collected.
//!
//! Every cycle runs against a scratch copy of the ledger and is committed
//! only if every step succeeds.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use ysplit_governance::{require_role, GaugeRegistry, Role};
use ysplit_ledger::{Ledger, LedgerError};
use ysplit_oracle::VoteWeightOracle;
use ysplit_types::events::{AuditEvent, EventKind, Journal};
use ysplit_types::{Address, Allocation, IncomeStream, Split, TokenAddress};

pub use ysplit_types::RevenueSource;

use crate::ratios::compute_splits;
use crate::sink::RewardSink;
use crate::splits::distribute;
use crate::{Result, RevenueError};

/// Claimable balance at one source.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBalance {
    pub address: Address,
    pub stream: IncomeStream,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: u128,
}

/// Claimable balances per source and per stream.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBalances {
    pub sources: Vec<SourceBalance>,
    #[serde_as(as = "DisplayFromStr")]
    pub admin_fee: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub vote_incentive: u128,
}

impl RevenueBalances {
    pub fn for_stream(&self, stream: IncomeStream) -> u128 {
        match stream {
            IncomeStream::AdminFee => self.admin_fee,
            IncomeStream::VoteIncentive => self.vote_incentive,
        }
    }
}

/// Which entry point produced an execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    Split,
    DepositAndSplit,
}

impl ExecutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionKind::Split => "split",
            ExecutionKind::DepositAndSplit => "deposit_and_split",
        }
    }
}

/// Split used and amounts realised for one stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamReport {
    pub split: Split,
    pub allocation: Allocation,
}

impl StreamReport {
    /// Total revenue the stream held when the cycle ran.
    pub fn total(&self) -> u128 {
        self.allocation.total()
    }
}

/// Outcome of one committed split cycle.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub kind: ExecutionKind,
    pub caller: Address,
    pub admin_fee: StreamReport,
    pub vote_incentive: StreamReport,
    /// Amount the reward sink confirmed for the combined YBS share.
    #[serde_as(as = "DisplayFromStr")]
    pub sink_recorded: u128,
}

impl ExecutionReport {
    pub fn stream(&self, stream: IncomeStream) -> &StreamReport {
        match stream {
            IncomeStream::AdminFee => &self.admin_fee,
            IncomeStream::VoteIncentive => &self.vote_incentive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AdminFunding {
    /// Measure and pull from the configured admin-fee sources.
    Sources,
    /// Already deposited at the executor by the operator.
    Deposited(u128),
}

/// Pulls revenue from the configured sources and distributes it.
#[derive(Clone, Debug)]
pub struct SplitExecutor {
    address: Address,
    settlement_token: TokenAddress,
    voter: Address,
    treasury: Address,
    sources: Vec<RevenueSource>,
    journal: Journal,
}

impl SplitExecutor {
    /// Create an executor.
    ///
    /// # Errors
    ///
    /// - [`RevenueError::ZeroAddress`] if any address is the null identity
    /// - [`RevenueError::DuplicateSource`] if a source address repeats
    pub fn new(
        address: Address,
        settlement_token: TokenAddress,
        voter: Address,
        treasury: Address,
        sources: Vec<RevenueSource>,
    ) -> Result<Self> {
        if [address, settlement_token, voter, treasury]
            .iter()
            .any(Address::is_zero)
        {
            return Err(RevenueError::ZeroAddress);
        }
        validate_sources(&sources)?;
        Ok(Self {
            address,
            settlement_token,
            voter,
            treasury,
            sources,
            journal: Journal::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn settlement_token(&self) -> TokenAddress {
        self.settlement_token
    }

    /// The account whose vote weights drive the splits.
    pub fn voter(&self) -> Address {
        self.voter
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    pub fn sources(&self) -> &[RevenueSource] {
        &self.sources
    }

    /// Balances currently claimable at each source.
    pub fn pending_balances(&self, ledger: &Ledger) -> Result<RevenueBalances> {
        let mut balances = RevenueBalances {
            sources: Vec::with_capacity(self.sources.len()),
            admin_fee: 0,
            vote_incentive: 0,
        };
        for source in &self.sources {
            let balance = ledger.balance_of(&self.settlement_token, &source.address);
            let slot = match source.stream {
                IncomeStream::AdminFee => &mut balances.admin_fee,
                IncomeStream::VoteIncentive => &mut balances.vote_incentive,
            };
            *slot = slot.checked_add(balance).ok_or(RevenueError::Overflow)?;
            balances.sources.push(SourceBalance {
                address: source.address,
                stream: source.stream,
                balance,
            });
        }
        Ok(balances)
    }

    /// Run one split cycle over both streams. Owner or guardian.
    ///
    /// # Errors
    ///
    /// - [`RevenueError::Unauthorized`] if `caller` is neither owner nor guardian
    /// - [`RevenueError::NoVotingPower`] / [`RevenueError::InconsistentVoteState`]
    ///   from the ratio calculation
    /// - [`RevenueError::InsufficientExternalAllowance`] if a source has not
    ///   granted the executor a large enough draw right
    /// - [`RevenueError::SinkMismatch`] if the sink records a different amount
    ///
    /// On any error no balance changes.
    pub fn execute_split<O, S>(
        &mut self,
        caller: Address,
        registry: &GaugeRegistry,
        oracle: &O,
        ledger: &mut Ledger,
        sink: &S,
    ) -> Result<ExecutionReport>
    where
        O: VoteWeightOracle + ?Sized,
        S: RewardSink + ?Sized,
    {
        require_role(registry, &caller, &[Role::Owner, Role::Guardian])?;
        self.run_cycle(caller, AdminFunding::Sources, registry, oracle, ledger, sink)
    }

    /// Pull `amount` of admin fees from the operator and split them together
    /// with the pending vote incentives. Operator only.
    ///
    /// The operator must have granted the executor a draw right of at least
    /// `amount`. The admin-fee sources are not touched; the admin-fee
    /// remainder stays at the executor.
    pub fn deposit_and_split<O, S>(
        &mut self,
        caller: Address,
        amount: u128,
        registry: &GaugeRegistry,
        oracle: &O,
        ledger: &mut Ledger,
        sink: &S,
    ) -> Result<ExecutionReport>
    where
        O: VoteWeightOracle + ?Sized,
        S: RewardSink + ?Sized,
    {
        require_role(registry, &caller, &[Role::Operator])?;
        if amount == 0 {
            return Err(RevenueError::ZeroAmount);
        }
        self.run_cycle(
            caller,
            AdminFunding::Deposited(amount),
            registry,
            oracle,
            ledger,
            sink,
        )
    }

    /// Move the executor's whole balance of `token` to `to`. Owner only.
    ///
    /// Returns the amount moved.
    pub fn sweep(
        &mut self,
        caller: Address,
        registry: &GaugeRegistry,
        token: TokenAddress,
        to: Address,
        ledger: &mut Ledger,
    ) -> Result<u128> {
        require_role(registry, &caller, &[Role::Owner])?;
        if to.is_zero() {
            return Err(RevenueError::ZeroAddress);
        }
        let amount = ledger.balance_of(&token, &self.address);
        if amount == 0 {
            return Ok(0);
        }
        ledger.transfer(token, self.address, to, amount)?;
        tracing::info!(%token, %to, amount, "executor swept");
        self.journal
            .record(caller, EventKind::Swept { token, to, amount });
        Ok(amount)
    }

    /// Replace the revenue sources. Owner only.
    pub fn set_sources(
        &mut self,
        caller: Address,
        registry: &GaugeRegistry,
        sources: Vec<RevenueSource>,
    ) -> Result<()> {
        require_role(registry, &caller, &[Role::Owner])?;
        validate_sources(&sources)?;
        tracing::info!(count = sources.len(), "revenue sources replaced");
        self.sources = sources.clone();
        self.journal
            .record(caller, EventKind::SourcesUpdated { sources });
        Ok(())
    }

    /// Replace the treasury address. Owner only.
    pub fn set_treasury(
        &mut self,
        caller: Address,
        registry: &GaugeRegistry,
        treasury: Address,
    ) -> Result<()> {
        require_role(registry, &caller, &[Role::Owner])?;
        if treasury.is_zero() {
            return Err(RevenueError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut self.treasury, treasury);
        tracing::info!(%previous, new = %treasury, "treasury changed");
        self.journal.record(
            caller,
            EventKind::TreasuryChanged {
                previous,
                new: treasury,
            },
        );
        Ok(())
    }

    /// Take every audit event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.journal.drain()
    }

    fn run_cycle<O, S>(
        &mut self,
        caller: Address,
        funding: AdminFunding,
        registry: &GaugeRegistry,
        oracle: &O,
        ledger: &mut Ledger,
        sink: &S,
    ) -> Result<ExecutionReport>
    where
        O: VoteWeightOracle + ?Sized,
        S: RewardSink + ?Sized,
    {
        let splits = compute_splits(registry, oracle, &self.voter)?;
        let mut scratch = ledger.clone();

        let pending = self.pending_balances(&scratch)?;
        let admin_total = match funding {
            AdminFunding::Sources => pending.admin_fee,
            AdminFunding::Deposited(amount) => {
                self.draw(&mut scratch, caller, amount)?;
                amount
            }
        };
        let vote_total = pending.vote_incentive;

        let admin = allocate(admin_total, &splits.admin_fee)?;
        let vote = allocate(vote_total, &splits.vote_incentive)?;

        if funding == AdminFunding::Sources {
            self.pull_stream(&mut scratch, IncomeStream::AdminFee, admin.distributed())?;
        }
        self.pull_stream(&mut scratch, IncomeStream::VoteIncentive, vote.distributed())?;

        let treasury_amount = admin
            .treasury
            .checked_add(vote.treasury)
            .ok_or(RevenueError::Overflow)?;
        if treasury_amount > 0 {
            scratch.transfer(
                self.settlement_token,
                self.address,
                self.treasury,
                treasury_amount,
            )?;
        }

        let ybs_amount = admin.ybs.checked_add(vote.ybs).ok_or(RevenueError::Overflow)?;
        let recorded = if ybs_amount > 0 {
            sink.deposit(&mut scratch, self.settlement_token, self.address, ybs_amount)?
        } else {
            0
        };
        if recorded != ybs_amount {
            tracing::error!(sent = ybs_amount, recorded, "reward sink mismatch, cycle aborted");
            return Err(RevenueError::SinkMismatch {
                sent: ybs_amount,
                recorded,
            });
        }

        *ledger = scratch;

        let kind = match funding {
            AdminFunding::Sources => ExecutionKind::Split,
            AdminFunding::Deposited(amount) => {
                self.journal
                    .record(caller, EventKind::AdminFeesDeposited { amount });
                ExecutionKind::DepositAndSplit
            }
        };
        for (stream, allocation) in [
            (IncomeStream::AdminFee, admin),
            (IncomeStream::VoteIncentive, vote),
        ] {
            if allocation.total() == 0 {
                continue;
            }
            tracing::info!(
                %stream,
                ybs = allocation.ybs,
                treasury = allocation.treasury,
                remainder = allocation.remainder,
                "revenue split"
            );
            self.journal
                .record(caller, EventKind::split_for(stream, allocation));
        }

        Ok(ExecutionReport {
            kind,
            caller,
            admin_fee: StreamReport {
                split: splits.admin_fee,
                allocation: admin,
            },
            vote_incentive: StreamReport {
                split: splits.vote_incentive,
                allocation: vote,
            },
            sink_recorded: recorded,
        })
    }

    /// Pull `amount` from the stream's sources in configured order, each
    /// contributing up to its balance.
    fn pull_stream(&self, scratch: &mut Ledger, stream: IncomeStream, amount: u128) -> Result<()> {
        let mut outstanding = amount;
        for source in self.sources.iter().filter(|s| s.stream == stream) {
            if outstanding == 0 {
                break;
            }
            let take = scratch
                .balance_of(&self.settlement_token, &source.address)
                .min(outstanding);
            if take == 0 {
                continue;
            }
            self.draw(scratch, source.address, take)?;
            outstanding -= take;
            tracing::debug!(%stream, source = %source.address, take, "pulled from source");
        }
        if outstanding > 0 {
            return Err(RevenueError::Ledger(LedgerError::InsufficientBalance {
                token: self.settlement_token,
                owner: self.address,
                available: amount - outstanding,
                required: amount,
            }));
        }
        Ok(())
    }

    /// Move `amount` from `owner` to the executor under the executor's draw right.
    fn draw(&self, scratch: &mut Ledger, owner: Address, amount: u128) -> Result<()> {
        scratch
            .transfer_from(self.settlement_token, self.address, owner, self.address, amount)
            .map_err(|err| match err {
                LedgerError::InsufficientAllowance {
                    token,
                    owner,
                    available,
                    required,
                    ..
                } => {
                    tracing::warn!(%owner, available, required, "executor lacks draw right");
                    RevenueError::InsufficientExternalAllowance {
                        token,
                        owner,
                        available,
                        required,
                    }
                }
                other => RevenueError::Ledger(other),
            })
    }
}

fn allocate(total: u128, split: &Split) -> Result<Allocation> {
    if total == 0 {
        return Ok(Allocation::default());
    }
    distribute(total, split)
}

fn validate_sources(sources: &[RevenueSource]) -> Result<()> {
    let mut seen = HashSet::with_capacity(sources.len());
    for source in sources {
        if source.address.is_zero() {
            return Err(RevenueError::ZeroAddress);
        }
        if !seen.insert(source.address) {
            return Err(RevenueError::DuplicateSource(source.address));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ysplit_governance::{AccessControl, SplitRules, StreamRules};
    use ysplit_ledger::UNLIMITED;
    use ysplit_oracle::GaugeController;
    use ysplit_types::{Category, PRECISION};

    use super::*;
    use crate::sink::VaultSink;

    const SPLITTER: Address = Address::repeat_byte(0x5f);
    const TOKEN: Address = Address::repeat_byte(0xcc);
    const VOTER: Address = Address::repeat_byte(0x77);
    const TREASURY: Address = Address::repeat_byte(0x7e);
    const VAULT: Address = Address::repeat_byte(0x55);
    const RELAY: Address = Address::repeat_byte(0x10);
    const BRIBES: Address = Address::repeat_byte(0x20);

    fn owner() -> Address {
        Address::repeat_byte(0xa0)
    }

    fn guardian() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn operator() -> Address {
        Address::repeat_byte(0xa2)
    }

    fn gauge(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    /// Sink that under-reports every deposit by one percent.
    struct LossySink;

    impl RewardSink for LossySink {
        fn address(&self) -> Address {
            VAULT
        }

        fn deposit(
            &self,
            ledger: &mut Ledger,
            token: TokenAddress,
            from: Address,
            amount: u128,
        ) -> std::result::Result<u128, LedgerError> {
            ledger.transfer(token, from, VAULT, amount)?;
            Ok(amount - amount / 100)
        }
    }

    struct Fixture {
        registry: GaugeRegistry,
        oracle: GaugeController,
        ledger: Ledger,
        executor: SplitExecutor,
        sink: VaultSink,
    }

    fn fixture() -> Fixture {
        let mut oracle = GaugeController::new();
        for i in 1..=3 {
            oracle.add_gauge(gauge(i)).expect("add gauge");
        }
        oracle.set_voting_power(VOTER, 1_000).expect("power");
        oracle
            .vote_for_gauge_weights(VOTER, gauge(1), 10_000)
            .expect("vote");

        let rules = SplitRules {
            admin_fee: StreamRules::uniform(Split::from_percent(50, 30, 20)),
            vote_incentive: StreamRules::uniform(Split::from_percent(60, 40, 0)),
        };
        let access = AccessControl::new(owner(), guardian())
            .expect("access")
            .with_operator(operator())
            .expect("operator");
        let mut registry = GaugeRegistry::new(SPLITTER, access, rules).expect("registry");
        registry
            .set_category_set(owner(), Category::YCrv, vec![gauge(1)], &oracle)
            .expect("ycrv");

        let sources = vec![
            RevenueSource {
                address: RELAY,
                stream: IncomeStream::AdminFee,
            },
            RevenueSource {
                address: BRIBES,
                stream: IncomeStream::VoteIncentive,
            },
        ];
        let executor =
            SplitExecutor::new(SPLITTER, TOKEN, VOTER, TREASURY, sources).expect("executor");

        let mut ledger = Ledger::new();
        for source in [RELAY, BRIBES] {
            ledger.approve(TOKEN, source, SPLITTER, UNLIMITED);
        }

        Fixture {
            registry,
            oracle,
            ledger,
            executor,
            sink: VaultSink::new(VAULT).expect("sink"),
        }
    }

    #[test]
    fn test_execute_split_distributes_both_streams() {
        let mut f = fixture();
        f.ledger.mint(TOKEN, RELAY, 1_000).expect("mint relay");
        f.ledger.mint(TOKEN, BRIBES, 500).expect("mint bribes");

        let report = f
            .executor
            .execute_split(guardian(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect("execute");

        assert_eq!(report.kind, ExecutionKind::Split);
        assert_eq!(report.admin_fee.allocation.ybs, 500);
        assert_eq!(report.admin_fee.allocation.treasury, 300);
        assert_eq!(report.admin_fee.allocation.remainder, 200);
        assert_eq!(report.vote_incentive.allocation.ybs, 300);
        assert_eq!(report.vote_incentive.allocation.treasury, 200);
        assert_eq!(report.sink_recorded, 800);

        assert_eq!(f.ledger.balance_of(&TOKEN, &VAULT), 800);
        assert_eq!(f.ledger.balance_of(&TOKEN, &TREASURY), 500);
        // Remainder stays at the source, nothing lingers at the executor.
        assert_eq!(f.ledger.balance_of(&TOKEN, &RELAY), 200);
        assert_eq!(f.ledger.balance_of(&TOKEN, &BRIBES), 0);
        assert_eq!(f.ledger.balance_of(&TOKEN, &SPLITTER), 0);

        let names: Vec<_> = f
            .executor
            .drain_events()
            .iter()
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(names, vec!["admin_fee_split", "vote_incentive_split"]);
    }

    #[test]
    fn test_execute_split_conserves_each_stream() {
        let mut f = fixture();
        f.ledger.mint(TOKEN, RELAY, 999_999_999_999).expect("mint relay");
        f.ledger.mint(TOKEN, BRIBES, 7).expect("mint bribes");

        let report = f
            .executor
            .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect("execute");
        assert_eq!(report.admin_fee.total(), 999_999_999_999);
        assert_eq!(report.vote_incentive.total(), 7);
    }

    #[test]
    fn test_execute_split_unauthorized() {
        let mut f = fixture();
        let err = f
            .executor
            .execute_split(operator(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect_err("operator cannot execute");
        assert!(matches!(err, RevenueError::Unauthorized(_)));
    }

    #[test]
    fn test_no_voting_power_moves_nothing() {
        let mut f = fixture();
        f.oracle.set_voting_power(VOTER, 0).expect("power");
        f.ledger.mint(TOKEN, RELAY, 1_000).expect("mint");
        let before = f.ledger.clone();

        let err = f
            .executor
            .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect_err("no power");
        assert!(matches!(err, RevenueError::NoVotingPower { .. }));
        assert_eq!(f.ledger, before);
        assert!(f.executor.drain_events().is_empty());
    }

    #[test]
    fn test_missing_draw_right_rolls_back() {
        let mut f = fixture();
        f.ledger.approve(TOKEN, BRIBES, SPLITTER, 0);
        f.ledger.mint(TOKEN, RELAY, 1_000).expect("mint relay");
        f.ledger.mint(TOKEN, BRIBES, 500).expect("mint bribes");
        let before = f.ledger.clone();

        let err = f
            .executor
            .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect_err("bribes not approved");
        assert_eq!(
            err,
            RevenueError::InsufficientExternalAllowance {
                token: TOKEN,
                owner: BRIBES,
                available: 0,
                required: 500,
            }
        );
        // The admin-fee pull that already happened is rolled back too.
        assert_eq!(f.ledger, before);
    }

    #[test]
    fn test_sink_mismatch_rolls_back() {
        let mut f = fixture();
        f.ledger.mint(TOKEN, RELAY, 1_000).expect("mint");
        let before = f.ledger.clone();

        let err = f
            .executor
            .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &LossySink)
            .expect_err("mismatch");
        assert_eq!(
            err,
            RevenueError::SinkMismatch {
                sent: 500,
                recorded: 495
            }
        );
        assert_eq!(f.ledger, before);
    }

    #[test]
    fn test_performance_fee_does_not_block_cycles() {
        let mut f = fixture();
        let fee_to = Address::repeat_byte(0xfe);
        let pool = Address::repeat_byte(0x56);
        let sink = VaultSink::new(VAULT)
            .expect("sink")
            .with_performance_fee(fee_to, 100)
            .expect("fee")
            .with_reward_pool(pool)
            .expect("pool");

        for amount in [10_000u128, 20_000, 50_000] {
            f.ledger.mint(TOKEN, RELAY, amount).expect("mint");
            let report = f
                .executor
                .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &sink)
                .expect("cycle with fee");
            assert_eq!(report.sink_recorded, report.admin_fee.allocation.ybs);
        }
        let deposited = f.ledger.balance_of(&TOKEN, &VAULT);

        let distribution = sink
            .distribute_rewards(&mut f.ledger, TOKEN)
            .expect("distribute");
        assert_eq!(distribution.fee, deposited / 100);
        assert_eq!(distribution.fee + distribution.distributed, deposited);
        assert_eq!(f.ledger.balance_of(&TOKEN, &pool), distribution.distributed);
    }

    #[test]
    fn test_empty_sources_is_a_no_op_cycle() {
        let mut f = fixture();
        let report = f
            .executor
            .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect("execute");
        assert_eq!(report.admin_fee.total(), 0);
        assert_eq!(report.sink_recorded, 0);
        assert!(f.executor.drain_events().is_empty());
    }

    #[test]
    fn test_greedy_pull_across_sources() {
        let mut f = fixture();
        let delegate = Address::repeat_byte(0x30);
        let sources = vec![
            RevenueSource {
                address: BRIBES,
                stream: IncomeStream::VoteIncentive,
            },
            RevenueSource {
                address: delegate,
                stream: IncomeStream::VoteIncentive,
            },
        ];
        f.executor
            .set_sources(owner(), &f.registry, sources)
            .expect("set sources");
        f.ledger.approve(TOKEN, delegate, SPLITTER, UNLIMITED);
        f.ledger.mint(TOKEN, BRIBES, 30).expect("mint bribes");
        f.ledger.mint(TOKEN, delegate, 70).expect("mint delegate");

        // Vote incentives split 60/40/0, so all 100 are pulled.
        f.executor
            .execute_split(owner(), &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect("execute");
        assert_eq!(f.ledger.balance_of(&TOKEN, &BRIBES), 0);
        assert_eq!(f.ledger.balance_of(&TOKEN, &delegate), 0);
        assert_eq!(f.ledger.balance_of(&TOKEN, &VAULT), 60);
        assert_eq!(f.ledger.balance_of(&TOKEN, &TREASURY), 40);
    }

    #[test]
    fn test_deposit_and_split() {
        let mut f = fixture();
        f.ledger.mint(TOKEN, operator(), 1_000).expect("mint operator");
        f.ledger.mint(TOKEN, RELAY, 4_000).expect("mint relay");
        f.ledger.approve(TOKEN, operator(), SPLITTER, UNLIMITED);

        let report = f
            .executor
            .deposit_and_split(operator(), 1_000, &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect("deposit and split");

        assert_eq!(report.kind, ExecutionKind::DepositAndSplit);
        assert_eq!(report.admin_fee.total(), 1_000);
        // Relay untouched; admin remainder stays at the executor.
        assert_eq!(f.ledger.balance_of(&TOKEN, &RELAY), 4_000);
        assert_eq!(f.ledger.balance_of(&TOKEN, &SPLITTER), 200);
        assert_eq!(f.ledger.balance_of(&TOKEN, &VAULT), 500);
        assert_eq!(f.ledger.balance_of(&TOKEN, &TREASURY), 300);
        assert_eq!(f.ledger.balance_of(&TOKEN, &operator()), 0);

        let names: Vec<_> = f
            .executor
            .drain_events()
            .iter()
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(names, vec!["admin_fees_deposited", "admin_fee_split"]);
    }

    #[test]
    fn test_deposit_and_split_checks() {
        let mut f = fixture();
        let err = f
            .executor
            .deposit_and_split(owner(), 1, &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect_err("owner is not operator");
        assert!(matches!(err, RevenueError::Unauthorized(_)));

        let err = f
            .executor
            .deposit_and_split(operator(), 0, &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect_err("zero amount");
        assert_eq!(err, RevenueError::ZeroAmount);

        f.ledger.mint(TOKEN, operator(), 10).expect("mint");
        let err = f
            .executor
            .deposit_and_split(operator(), 10, &f.registry, &f.oracle, &mut f.ledger, &f.sink)
            .expect_err("no approval");
        assert!(matches!(
            err,
            RevenueError::InsufficientExternalAllowance { .. }
        ));
        assert_eq!(f.ledger.balance_of(&TOKEN, &operator()), 10);
    }

    #[test]
    fn test_pending_balances() {
        let mut f = fixture();
        f.ledger.mint(TOKEN, RELAY, 11).expect("mint");
        f.ledger.mint(TOKEN, BRIBES, 22).expect("mint");
        let balances = f.executor.pending_balances(&f.ledger).expect("balances");
        assert_eq!(balances.admin_fee, 11);
        assert_eq!(balances.vote_incentive, 22);
        assert_eq!(balances.for_stream(IncomeStream::VoteIncentive), 22);
        assert_eq!(balances.sources.len(), 2);
    }

    #[test]
    fn test_sweep_dust() {
        let mut f = fixture();
        f.ledger.mint(TOKEN, SPLITTER, 3).expect("mint dust");
        let moved = f
            .executor
            .sweep(owner(), &f.registry, TOKEN, TREASURY, &mut f.ledger)
            .expect("sweep");
        assert_eq!(moved, 3);
        assert_eq!(f.ledger.balance_of(&TOKEN, &TREASURY), 3);
        assert!(f
            .executor
            .sweep(guardian(), &f.registry, TOKEN, TREASURY, &mut f.ledger)
            .is_err());
        assert_eq!(
            f.executor
                .sweep(owner(), &f.registry, TOKEN, Address::ZERO, &mut f.ledger),
            Err(RevenueError::ZeroAddress)
        );
    }

    #[test]
    fn test_set_sources_validation() {
        let mut f = fixture();
        let dup = vec![
            RevenueSource {
                address: RELAY,
                stream: IncomeStream::AdminFee,
            },
            RevenueSource {
                address: RELAY,
                stream: IncomeStream::VoteIncentive,
            },
        ];
        assert_eq!(
            f.executor.set_sources(owner(), &f.registry, dup),
            Err(RevenueError::DuplicateSource(RELAY))
        );
        assert!(f
            .executor
            .set_sources(guardian(), &f.registry, Vec::new())
            .is_err());
        assert_eq!(f.executor.sources().len(), 2);
    }

    #[test]
    fn test_set_treasury() {
        let mut f = fixture();
        let new_treasury = Address::repeat_byte(0x7f);
        f.executor
            .set_treasury(owner(), &f.registry, new_treasury)
            .expect("set treasury");
        assert_eq!(f.executor.treasury(), new_treasury);
        assert_eq!(
            f.executor
                .set_treasury(owner(), &f.registry, Address::ZERO),
            Err(RevenueError::ZeroAddress)
        );
    }

    #[test]
    fn test_report_serializes_amounts_as_strings() {
        let report = ExecutionReport {
            kind: ExecutionKind::Split,
            caller: owner(),
            admin_fee: StreamReport {
                split: Split::from_percent(100, 0, 0),
                allocation: Allocation::default(),
            },
            vote_incentive: StreamReport {
                split: Split::new(PRECISION, 0, 0),
                allocation: Allocation::default(),
            },
            sink_recorded: 42,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["kind"], "split");
        assert_eq!(json["sink_recorded"], "42");
    }
}
