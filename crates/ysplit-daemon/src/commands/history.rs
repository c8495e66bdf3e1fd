//! Audit log, execution history and status commands.

use std::sync::Arc;

use serde_json::{json, Value};
use ysplit_db::queries::{audit, executions, settings};

use super::{param_limit, Result};
use crate::state::role_holders;
use crate::DaemonState;

pub async fn get_audit_log(state: &Arc<DaemonState>, params: &Value) -> Result {
    let limit = param_limit(params);
    let event_type = params.get("event_type").and_then(Value::as_str);
    let db = state.db.lock().await;
    let rows = audit::recent(&db, limit, event_type)?;
    Ok(Value::Array(
        rows.into_iter()
            .map(|row| {
                json!({
                    "id": row.id,
                    "component": row.component,
                    "actor": row.event.actor,
                    "event": row.event.kind,
                    "created_at": row.created_at,
                })
            })
            .collect(),
    ))
}

pub async fn get_executions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let limit = param_limit(params);
    let db = state.db.lock().await;
    let rows = executions::recent(&db, limit)?;
    Ok(Value::Array(
        rows.into_iter()
            .map(|row| {
                json!({
                    "id": row.id,
                    "kind": row.kind,
                    "caller": row.caller,
                    "admin_fee": {"split": row.admin_fee_split, "allocation": row.admin_fee},
                    "vote_incentive": {"split": row.vote_incentive_split, "allocation": row.vote_incentive},
                    "sink_recorded": row.sink_recorded.to_string(),
                    "executed_at": row.executed_at,
                })
            })
            .collect(),
    ))
}

/// Lifetime totals across every recorded execution.
pub async fn get_execution_totals(state: &Arc<DaemonState>) -> Result {
    let db = state.db.lock().await;
    let totals = executions::totals(&db)?;
    Ok(json!({
        "executions": totals.executions,
        "ybs": totals.ybs.to_string(),
        "treasury": totals.treasury.to_string(),
        "remainder": totals.remainder.to_string(),
    }))
}

pub async fn get_status(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    let db = state.db.lock().await;
    let balances = system.executor.pending_balances(&system.ledger)?;
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "roles": role_holders(&system),
        "sources": system.executor.sources().len(),
        "pending": {
            "admin_fee": balances.admin_fee.to_string(),
            "vote_incentive": balances.vote_incentive.to_string(),
        },
        "executions_total": settings::get_u64(&db, "executions_total", 0)?,
        "audit_entries": audit::count(&db)?,
        "dev_methods": state.config.advanced.dev_methods,
    }))
}
