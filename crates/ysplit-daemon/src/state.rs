//! Splitter state held by the daemon.
//!
//! The three components, the in-process oracle, ledger and reward sink live
//! behind one lock. Governance state is written to SQLite after every
//! successful mutation and read back at start-up; the ledger and oracle are
//! in-memory and start empty on every run.

use anyhow::Context;
use rusqlite::Connection;
use ysplit_allowance::{CapabilityAllowanceRegistry, SpenderRecord};
use ysplit_db::queries::{audit, categories, executions, rules, settings, spenders};
use ysplit_governance::{AccessControl, GaugeRegistry};
use ysplit_ledger::Ledger;
use ysplit_oracle::GaugeController;
use ysplit_revenue::{ExecutionReport, RevenueSource, SplitExecutor, VaultSink};
use ysplit_types::{Category, IncomeStream, RuleScope};

use crate::config::{DaemonConfig, RolesConfig};

const KEY_INITIALIZED: &str = "governance_initialized";
const KEY_EXECUTIONS: &str = "executions_total";
const KEY_REGISTRY_ACCESS: &str = "registry.access";
const KEY_ALLOWANCES_ACCESS: &str = "allowances.access";
const KEY_TREASURY: &str = "executor.treasury";
const KEY_SOURCES: &str = "executor.sources";

/// Everything a split cycle touches.
#[derive(Clone)]
pub struct SplitterSystem {
    pub registry: GaugeRegistry,
    pub allowances: CapabilityAllowanceRegistry,
    pub executor: SplitExecutor,
    pub oracle: GaugeController,
    pub ledger: Ledger,
    pub sink: VaultSink,
}

impl SplitterSystem {
    /// Build the initial state described by `config`.
    pub fn from_config(config: &DaemonConfig) -> anyhow::Result<Self> {
        let addresses = &config.addresses;

        let mut oracle = GaugeController::new();
        for gauge in &config.oracle.gauges {
            oracle
                .add_gauge(*gauge)
                .with_context(|| format!("oracle.gauges: {gauge}"))?;
        }

        let access = access_from(&config.roles).context("roles")?;
        let mut registry =
            GaugeRegistry::new(addresses.registry, access.clone(), config.rules.to_split_rules())
                .context("gauge registry")?;
        for category in Category::ALL {
            let targets = config.categories.get(category).to_vec();
            if targets.is_empty() {
                continue;
            }
            registry
                .set_category_set(access.owner(), category, targets, &oracle)
                .with_context(|| format!("categories.{category}"))?;
        }
        // Seeding from config is not a governance action.
        registry.drain_events();

        let allowances = CapabilityAllowanceRegistry::new(
            addresses.allowances,
            AccessControl::new(access.owner(), access.guardian()).context("roles")?,
        )
        .context("allowance registry")?;

        let executor = SplitExecutor::new(
            addresses.executor,
            addresses.settlement_token,
            addresses.voter,
            addresses.treasury,
            config.sources.clone(),
        )
        .context("split executor")?;

        let mut sink = VaultSink::new(addresses.reward_sink).context("addresses.reward_sink")?;
        if config.sink.performance_fee_bps > 0 {
            let recipient = config.sink.fee_recipient.unwrap_or(addresses.reward_sink);
            sink = sink
                .with_performance_fee(recipient, config.sink.performance_fee_bps)
                .context("sink")?;
        }
        if let Some(pool) = config.sink.reward_pool {
            sink = sink.with_reward_pool(pool).context("sink.reward_pool")?;
        }

        Ok(Self {
            registry,
            allowances,
            executor,
            oracle,
            ledger: Ledger::new(),
            sink,
        })
    }

    /// Replace config-derived governance state with what was persisted.
    ///
    /// Returns `false` if the database holds no governance state yet.
    pub fn restore(&mut self, conn: &Connection) -> anyhow::Result<bool> {
        if !settings::get_bool(conn, KEY_INITIALIZED, false)? {
            return Ok(false);
        }

        let access: AccessControl = settings::get_json(conn, KEY_REGISTRY_ACCESS)?
            .unwrap_or_else(|| self.registry.access().clone());
        let mut split_rules = *self.registry.rules();
        for row in rules::list(conn)? {
            split_rules
                .set(row.stream, row.scope, row.rule)
                .with_context(|| format!("stored rule {}/{}", row.stream, row.scope))?;
        }
        let mut registry = GaugeRegistry::new(self.registry.address(), access, split_rules)?;
        for (category, targets) in categories::list_all(conn)? {
            for target in &targets {
                if !self.oracle.gauges().any(|gauge| gauge == target) {
                    tracing::warn!(%category, %target, "stored target unknown to oracle, registering");
                    self.oracle.add_gauge(*target)?;
                }
            }
            registry.restore_category_set(category, targets)?;
        }

        let allowance_access: AccessControl = settings::get_json(conn, KEY_ALLOWANCES_ACCESS)?
            .unwrap_or_else(|| self.allowances.access().clone());
        let mut allowances =
            CapabilityAllowanceRegistry::new(self.allowances.address(), allowance_access)?;
        for (spender, tokens) in spenders::list(conn)? {
            allowances.restore_spender(&SpenderRecord { spender, tokens }, &mut self.ledger)?;
        }

        let treasury = settings::get_address(conn, KEY_TREASURY)?.unwrap_or(self.executor.treasury());
        let sources: Vec<RevenueSource> = settings::get_json(conn, KEY_SOURCES)?
            .unwrap_or_else(|| self.executor.sources().to_vec());
        let executor = SplitExecutor::new(
            self.executor.address(),
            self.executor.settlement_token(),
            self.executor.voter(),
            treasury,
            sources,
        )?;

        self.registry = registry;
        self.allowances = allowances;
        self.executor = executor;
        Ok(true)
    }

    /// Persist governance state and pending audit events in one transaction,
    /// plus the execution that produced them, if any.
    pub fn checkpoint(
        &mut self,
        conn: &Connection,
        now: u64,
        execution: Option<&ExecutionReport>,
    ) -> ysplit_db::Result<()> {
        let tx = conn.unchecked_transaction()?;
        self.write_snapshot(&tx, now)?;

        for (component, events) in [
            ("registry", self.registry.drain_events()),
            ("allowances", self.allowances.drain_events()),
            ("executor", self.executor.drain_events()),
        ] {
            audit::append(&tx, component, &events, now)?;
        }

        if let Some(report) = execution {
            let id = executions::record(
                &tx,
                &executions::NewExecution {
                    kind: report.kind.as_str(),
                    caller: report.caller,
                    admin_fee_split: &report.admin_fee.split,
                    admin_fee: &report.admin_fee.allocation,
                    vote_incentive_split: &report.vote_incentive.split,
                    vote_incentive: &report.vote_incentive.allocation,
                    sink_recorded: report.sink_recorded,
                },
                now,
            )?;
            let total = settings::get_u64(&tx, KEY_EXECUTIONS, 0)?;
            settings::set(&tx, KEY_EXECUTIONS, &(total + 1).to_string())?;
            tracing::debug!(id, "execution recorded");
        }

        tx.commit()?;
        Ok(())
    }

    fn write_snapshot(&self, conn: &Connection, now: u64) -> ysplit_db::Result<()> {
        settings::set_json(conn, KEY_REGISTRY_ACCESS, self.registry.access())?;
        settings::set_json(conn, KEY_ALLOWANCES_ACCESS, self.allowances.access())?;
        settings::set_address(conn, KEY_TREASURY, &self.executor.treasury())?;
        settings::set_json(conn, KEY_SOURCES, &self.executor.sources())?;

        categories::clear(conn)?;
        for category in Category::ALL {
            categories::replace(conn, category, self.registry.category_set(category), now)?;
        }

        for stream in IncomeStream::ALL {
            for scope in RuleScope::ALL {
                rules::upsert(conn, stream, scope, &self.registry.rule(stream, scope), now)?;
            }
        }

        let current = self.allowances.spenders();
        for (stored, _) in spenders::list(conn)? {
            if !current.iter().any(|record| record.spender == stored) {
                spenders::remove(conn, &stored)?;
            }
        }
        for record in &current {
            spenders::approve(conn, &record.spender, now)?;
            spenders::set_grants(conn, &record.spender, &record.tokens, now)?;
        }

        settings::set(conn, KEY_INITIALIZED, "true")
    }
}

fn access_from(roles: &RolesConfig) -> anyhow::Result<AccessControl> {
    let access = AccessControl::new(roles.owner, roles.guardian)
        .context("owner and guardian must be set")?;
    Ok(match roles.operator {
        Some(operator) => access.with_operator(operator)?,
        None => access,
    })
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Addresses currently holding a role anywhere in the system, for status output.
pub fn role_holders(system: &SplitterSystem) -> serde_json::Value {
    let registry = system.registry.access();
    let allowances = system.allowances.access();
    serde_json::json!({
        "registry": {
            "owner": registry.owner(),
            "guardian": registry.guardian(),
            "operator": registry.operator(),
        },
        "allowances": {
            "owner": allowances.owner(),
            "guardian": allowances.guardian(),
        },
    })
}
