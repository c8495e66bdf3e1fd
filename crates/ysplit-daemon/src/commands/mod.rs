//! IPC command handlers.
//!
//! Each submodule implements the commands for one component. Mutating
//! commands run under the splitter lock and checkpoint state and audit
//! events to the database before the lock is released.

pub mod allowances;
pub mod dev;
pub mod governance;
pub mod history;
pub mod revenue;

use std::sync::Arc;

use serde_json::Value;
use ysplit_types::{Address, Category, IncomeStream, RuleScope, TokenAddress};

use crate::rpc::RpcError;
use crate::state::{unix_now, SplitterSystem};
use crate::DaemonState;

pub(crate) type Result = std::result::Result<Value, RpcError>;

/// Run a mutation, then checkpoint. If either fails the in-memory state is
/// left as it was before the call.
pub(crate) async fn mutate<F>(state: &Arc<DaemonState>, apply: F) -> Result
where
    F: FnOnce(&mut SplitterSystem) -> Result,
{
    let mut system = state.system.lock().await;
    let before = system.clone();
    let value = match apply(&mut *system) {
        Ok(value) => value,
        Err(e) => {
            *system = before;
            return Err(e);
        }
    };
    let db = state.db.lock().await;
    if let Err(e) = system.checkpoint(&db, unix_now(), None) {
        tracing::error!("checkpoint failed, change rolled back: {e}");
        *system = before;
        return Err(e.into());
    }
    Ok(value)
}

pub(crate) fn param<'a>(params: &'a Value, key: &str) -> std::result::Result<&'a Value, RpcError> {
    params
        .get(key)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

pub(crate) fn param_str<'a>(params: &'a Value, key: &str) -> std::result::Result<&'a str, RpcError> {
    param(params, key)?
        .as_str()
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a string")))
}

pub(crate) fn param_address(params: &Value, key: &str) -> std::result::Result<Address, RpcError> {
    param_str(params, key)?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

/// The principal the call is made on behalf of.
pub(crate) fn caller(params: &Value) -> std::result::Result<Address, RpcError> {
    param_address(params, "caller")
}

/// `token` param, defaulting to the settlement token.
pub(crate) fn token_or_settlement(
    params: &Value,
    settlement: TokenAddress,
) -> std::result::Result<TokenAddress, RpcError> {
    if params.get("token").is_some() {
        param_address(params, "token")
    } else {
        Ok(settlement)
    }
}

pub(crate) fn param_addresses(params: &Value, key: &str) -> std::result::Result<Vec<Address>, RpcError> {
    param(params, key)?
        .as_array()
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be an array")))?
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|text| text.parse().ok())
                .ok_or_else(|| RpcError::invalid_params(&format!("{key}: invalid address {item}")))
        })
        .collect()
}

/// A `u128` given as a decimal string or a JSON integer.
pub(crate) fn param_amount(params: &Value, key: &str) -> std::result::Result<u128, RpcError> {
    let value = param(params, key)?;
    let parsed = match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_u64().map(u128::from),
        _ => None,
    };
    parsed.ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a non-negative integer")))
}

pub(crate) fn param_u16(params: &Value, key: &str) -> std::result::Result<u16, RpcError> {
    param(params, key)?
        .as_u64()
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must fit in u16")))
}

pub(crate) fn param_category(params: &Value) -> std::result::Result<Category, RpcError> {
    let text = param_str(params, "category")?;
    Category::parse(text)
        .ok_or_else(|| RpcError::invalid_params(&format!("unknown category '{text}'")))
}

pub(crate) fn param_stream(params: &Value) -> std::result::Result<IncomeStream, RpcError> {
    let text = param_str(params, "stream")?;
    IncomeStream::parse(text)
        .ok_or_else(|| RpcError::invalid_params(&format!("unknown stream '{text}'")))
}

pub(crate) fn param_scope(params: &Value) -> std::result::Result<RuleScope, RpcError> {
    let text = param_str(params, "scope")?;
    RuleScope::parse(text)
        .ok_or_else(|| RpcError::invalid_params(&format!("unknown scope '{text}'")))
}

/// Optional row limit, capped.
pub(crate) fn param_limit(params: &Value) -> u32 {
    params
        .get("limit")
        .and_then(Value::as_u64)
        .map_or(50, |n| n.min(1_000) as u32)
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}
