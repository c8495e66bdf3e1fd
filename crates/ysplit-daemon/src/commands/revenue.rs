//! Split calculation and execution commands.

use std::sync::Arc;

use serde_json::{json, Value};
use ysplit_revenue::{ExecutionReport, RevenueSource};

use super::{
    caller, mutate, param, param_address, param_amount, to_value, token_or_settlement, Result,
};
use crate::rpc::RpcError;
use crate::state::{unix_now, SplitterSystem};
use crate::DaemonState;

/// Current splits for the configured voter.
pub async fn compute_splits(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    let splits = ysplit_revenue::compute_splits(
        &system.registry,
        &system.oracle,
        &system.executor.voter(),
    )?;
    to_value(&splits)
}

/// The vote weights the split calculation reads, per category and target.
pub async fn vote_snapshot(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    let snapshot = ysplit_revenue::vote_snapshot(
        &system.registry,
        &system.oracle,
        &system.executor.voter(),
    )?;
    to_value(&snapshot)
}

pub async fn pending_balances(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    let balances = system.executor.pending_balances(&system.ledger)?;
    to_value(&balances)
}

pub async fn execute_split(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let mut guard = state.system.lock().await;
    let before = guard.clone();
    let system = &mut *guard;
    let report = system.executor.execute_split(
        caller,
        &system.registry,
        &system.oracle,
        &mut system.ledger,
        &system.sink,
    )?;
    record(state, system, before, &report).await?;
    to_value(&report)
}

pub async fn deposit_and_split(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let amount = param_amount(params, "amount")?;
    let mut guard = state.system.lock().await;
    let before = guard.clone();
    let system = &mut *guard;
    let report = system.executor.deposit_and_split(
        caller,
        amount,
        &system.registry,
        &system.oracle,
        &mut system.ledger,
        &system.sink,
    )?;
    record(state, system, before, &report).await?;
    to_value(&report)
}

/// Persist a completed execution. If that fails, the cycle is undone by
/// restoring `before`.
async fn record(
    state: &Arc<DaemonState>,
    system: &mut SplitterSystem,
    before: SplitterSystem,
    report: &ExecutionReport,
) -> std::result::Result<(), RpcError> {
    let db = state.db.lock().await;
    if let Err(e) = system.checkpoint(&db, unix_now(), Some(report)) {
        tracing::error!(kind = report.kind.as_str(), "execution not recorded, cycle rolled back: {e}");
        *system = before;
        return Err(e.into());
    }
    Ok(())
}

pub async fn get_sources(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    Ok(json!({
        "sources": system.executor.sources(),
        "treasury": system.executor.treasury(),
        "settlement_token": system.executor.settlement_token(),
        "voter": system.executor.voter(),
    }))
}

pub async fn set_sources(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let sources: Vec<RevenueSource> = serde_json::from_value(param(params, "sources")?.clone())
        .map_err(|e| RpcError::invalid_params(&format!("sources: {e}")))?;
    mutate(state, |system| {
        system
            .executor
            .set_sources(caller, &system.registry, sources)?;
        Ok(json!({"count": system.executor.sources().len()}))
    })
    .await
}

pub async fn set_treasury(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let treasury = param_address(params, "treasury")?;
    mutate(state, |system| {
        system
            .executor
            .set_treasury(caller, &system.registry, treasury)?;
        Ok(json!({"treasury": treasury}))
    })
    .await
}

/// Sweep the executor, or with `"from": "buffer"` a fixed amount out of the
/// allowance registry.
pub async fn sweep(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let token = param_address(params, "token")?;
    let to = param_address(params, "to")?;
    let from_buffer = params.get("from").and_then(Value::as_str) == Some("buffer");
    let amount = if from_buffer {
        Some(param_amount(params, "amount")?)
    } else {
        None
    };
    mutate(state, |system| {
        let moved = match amount {
            Some(amount) => {
                system
                    .allowances
                    .sweep(caller, token, to, amount, &mut system.ledger)?;
                amount
            }
            None => system
                .executor
                .sweep(caller, &system.registry, token, to, &mut system.ledger)?,
        };
        Ok(json!({"amount": moved.to_string()}))
    })
    .await
}

/// Forward the reward sink's accumulated `token` (default: settlement) to
/// the reward pool, taking the performance fee.
pub async fn distribute_rewards(state: &Arc<DaemonState>, params: &Value) -> Result {
    let mut guard = state.system.lock().await;
    let system = &mut *guard;
    let token = token_or_settlement(params, system.executor.settlement_token())?;
    let distribution = system.sink.distribute_rewards(&mut system.ledger, token)?;
    to_value(&distribution)
}
