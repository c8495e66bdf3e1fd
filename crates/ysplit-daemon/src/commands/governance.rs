//! Gauge registry and role commands.

use std::sync::Arc;

use serde_json::{json, Value};
use ysplit_types::{Category, Split};

use super::{
    caller, mutate, param_address, param_addresses, param_amount, param_category, param_scope,
    param_stream, param_u16, to_value, Result,
};
use crate::rpc::RpcError;
use crate::state::role_holders;
use crate::DaemonState;

/// Targets of one category, or of all three when no category is given.
pub async fn category_set(state: &Arc<DaemonState>, params: &Value) -> Result {
    let system = state.system.lock().await;
    if params.get("category").is_some() {
        let category = param_category(params)?;
        return Ok(json!({
            "category": category,
            "targets": system.registry.category_set(category),
        }));
    }
    let all: serde_json::Map<String, Value> = Category::ALL
        .iter()
        .map(|category| {
            (
                category.as_str().to_string(),
                json!(system.registry.category_set(*category)),
            )
        })
        .collect();
    Ok(Value::Object(all))
}

pub async fn set_category_set(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let category = param_category(params)?;
    let targets = param_addresses(params, "targets")?;
    mutate(state, |system| {
        system
            .registry
            .set_category_set(caller, category, targets, &system.oracle)?;
        Ok(json!({
            "category": category,
            "len": system.registry.category_len(category),
        }))
    })
    .await
}

pub async fn get_split_rules(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    to_value(system.registry.rules())
}

/// Set one rule. Parts are given either as basis points (`ybs_bps`,
/// `treasury_bps`, `remainder_bps`) or as raw fixed-point values.
pub async fn set_split_rule(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let stream = param_stream(params)?;
    let scope = param_scope(params)?;
    let rule = rule_from_params(params)?;
    mutate(state, |system| {
        system
            .registry
            .set_split_rule(caller, scope, stream, rule)?;
        Ok(json!({"stream": stream, "scope": scope, "rule": rule}))
    })
    .await
}

fn rule_from_params(params: &Value) -> std::result::Result<Split, RpcError> {
    if params.get("ybs_bps").is_some() {
        return Ok(Split::from_bps(
            param_u16(params, "ybs_bps")?,
            param_u16(params, "treasury_bps")?,
            param_u16(params, "remainder_bps")?,
        ));
    }
    Ok(Split::new(
        param_amount(params, "ybs")?,
        param_amount(params, "treasury")?,
        param_amount(params, "remainder")?,
    ))
}

pub async fn get_roles(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    Ok(role_holders(&system))
}

/// Which registry a role change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleTarget {
    Registry,
    Allowances,
}

fn role_target(params: &Value) -> std::result::Result<RoleTarget, RpcError> {
    match params.get("component").and_then(Value::as_str) {
        None | Some("registry") => Ok(RoleTarget::Registry),
        Some("allowances") => Ok(RoleTarget::Allowances),
        Some(other) => Err(RpcError::invalid_params(&format!("unknown component '{other}'"))),
    }
}

pub async fn set_owner(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let owner = param_address(params, "owner")?;
    let target = role_target(params)?;
    mutate(state, |system| {
        match target {
            RoleTarget::Registry => system.registry.set_owner(caller, owner)?,
            RoleTarget::Allowances => system.allowances.set_owner(caller, owner)?,
        }
        Ok(json!({"owner": owner}))
    })
    .await
}

pub async fn set_guardian(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let guardian = param_address(params, "guardian")?;
    let target = role_target(params)?;
    mutate(state, |system| {
        match target {
            RoleTarget::Registry => system.registry.set_guardian(caller, guardian)?,
            RoleTarget::Allowances => system.allowances.set_guardian(caller, guardian)?,
        }
        Ok(json!({"guardian": guardian}))
    })
    .await
}

/// The operator only exists on the gauge registry.
pub async fn set_operator(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let operator = param_address(params, "operator")?;
    mutate(state, |system| {
        system.registry.set_operator(caller, operator)?;
        Ok(json!({"operator": operator}))
    })
    .await
}
