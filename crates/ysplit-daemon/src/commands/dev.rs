//! Development commands.
//!
//! Drive the in-process ledger and gauge controller. Only dispatched when
//! `advanced.dev_methods` is set. Nothing here is persisted.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{param_address, param_amount, param_u16, token_or_settlement, Result};
use crate::DaemonState;

pub async fn mint(state: &Arc<DaemonState>, params: &Value) -> Result {
    let to = param_address(params, "to")?;
    let amount = param_amount(params, "amount")?;
    let mut system = state.system.lock().await;
    let token = token_or_settlement(params, system.executor.settlement_token())?;
    system.ledger.mint(token, to, amount)?;
    tracing::debug!(%token, %to, amount, "dev mint");
    Ok(json!({"balance": system.ledger.balance_of(&token, &to).to_string()}))
}

/// Set the draw right `owner` grants `spender`, as a source or operator would.
pub async fn approve(state: &Arc<DaemonState>, params: &Value) -> Result {
    let owner = param_address(params, "owner")?;
    let spender = param_address(params, "spender")?;
    let amount = param_amount(params, "amount")?;
    let mut system = state.system.lock().await;
    let token = token_or_settlement(params, system.executor.settlement_token())?;
    system.ledger.approve(token, owner, spender, amount);
    Ok(json!({"allowance": system.ledger.allowance(&token, &owner, &spender).to_string()}))
}

pub async fn balance_of(state: &Arc<DaemonState>, params: &Value) -> Result {
    let owner = param_address(params, "owner")?;
    let system = state.system.lock().await;
    let token = token_or_settlement(params, system.executor.settlement_token())?;
    Ok(json!(system.ledger.balance_of(&token, &owner).to_string()))
}

pub async fn add_gauge(state: &Arc<DaemonState>, params: &Value) -> Result {
    let gauge = param_address(params, "gauge")?;
    let mut system = state.system.lock().await;
    system.oracle.add_gauge(gauge)?;
    Ok(json!({"gauge": gauge}))
}

pub async fn set_voting_power(state: &Arc<DaemonState>, params: &Value) -> Result {
    let voter = param_address(params, "voter")?;
    let power = param_amount(params, "power")?;
    let mut system = state.system.lock().await;
    system.oracle.set_voting_power(voter, power)?;
    Ok(json!({"voter": voter, "power": power.to_string()}))
}

/// Vote a share of the voter's power, in basis points.
pub async fn vote(state: &Arc<DaemonState>, params: &Value) -> Result {
    let voter = param_address(params, "voter")?;
    let gauge = param_address(params, "gauge")?;
    let bps = param_u16(params, "bps")?;
    let mut system = state.system.lock().await;
    system.oracle.vote_for_gauge_weights(voter, gauge, bps)?;
    Ok(json!({"used_bps": system.oracle.vote_user_power(&voter)}))
}

/// Pin a raw weight, independent of the voter's power.
pub async fn set_vote(state: &Arc<DaemonState>, params: &Value) -> Result {
    let voter = param_address(params, "voter")?;
    let gauge = param_address(params, "gauge")?;
    let weight = param_amount(params, "weight")?;
    let mut system = state.system.lock().await;
    system.oracle.dev_set_vote(voter, gauge, weight)?;
    Ok(json!({"votes": system.oracle.votes_of(&voter)}))
}
