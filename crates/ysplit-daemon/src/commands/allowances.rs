//! Allowance registry commands.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{caller, mutate, param_address, param_addresses, to_value, Result};
use crate::DaemonState;

pub async fn approve_spender(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let spender = param_address(params, "spender")?;
    mutate(state, |system| {
        system.allowances.approve_spender(caller, spender)?;
        Ok(json!({"spender": spender, "active": true}))
    })
    .await
}

/// Deactivate a spender and zero every draw right it held.
pub async fn revoke_spender(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let spender = param_address(params, "spender")?;
    mutate(state, |system| {
        system
            .allowances
            .revoke_spender(caller, spender, &mut system.ledger)?;
        Ok(json!({"spender": spender, "active": false}))
    })
    .await
}

pub async fn grant_allowance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let spender = param_address(params, "spender")?;
    let tokens = param_addresses(params, "tokens")?;
    mutate(state, |system| {
        system
            .allowances
            .grant_allowance(caller, spender, &tokens, &mut system.ledger)?;
        Ok(json!({"spender": spender, "tokens": system.allowances.get_approvals(&spender)}))
    })
    .await
}

pub async fn revoke_allowance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let spender = param_address(params, "spender")?;
    let tokens = param_addresses(params, "tokens")?;
    mutate(state, |system| {
        system
            .allowances
            .revoke_allowance(caller, spender, &tokens, &mut system.ledger)?;
        Ok(json!({"spender": spender, "tokens": system.allowances.get_approvals(&spender)}))
    })
    .await
}

pub async fn get_approvals(state: &Arc<DaemonState>, params: &Value) -> Result {
    let spender = param_address(params, "spender")?;
    let system = state.system.lock().await;
    Ok(json!({"spender": spender, "tokens": system.allowances.get_approvals(&spender)}))
}

pub async fn is_spender(state: &Arc<DaemonState>, params: &Value) -> Result {
    let principal = param_address(params, "principal")?;
    let system = state.system.lock().await;
    Ok(json!(system.allowances.is_spender(&principal)))
}

pub async fn get_spenders(state: &Arc<DaemonState>) -> Result {
    let system = state.system.lock().await;
    to_value(&system.allowances.spenders())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::daemon_state;
    use crate::state::tests::{guardian, owner, test_config};
    use ysplit_db::queries::spenders;
    use ysplit_types::Address;

    fn spender() -> Address {
        Address::repeat_byte(0x5a)
    }

    fn token(n: u8) -> Address {
        Address::repeat_byte(0xc0 + n)
    }

    #[tokio::test]
    async fn test_grant_flow() {
        let state = daemon_state(test_config());
        approve_spender(
            &state,
            &json!({"caller": owner().to_string(), "spender": spender().to_string()}),
        )
        .await
        .expect("approve");

        let params = json!({
            "caller": guardian().to_string(),
            "spender": spender().to_string(),
            "tokens": [token(2).to_string(), token(1).to_string()],
        });
        let value = grant_allowance(&state, &params).await.expect("grant");
        assert_eq!(value["tokens"], json!([token(1).to_string(), token(2).to_string()]));

        let active = is_spender(&state, &json!({"principal": spender().to_string()}))
            .await
            .expect("is_spender");
        assert_eq!(active, json!(true));

        let db = state.db.lock().await;
        assert_eq!(
            spenders::grants(&db, &spender()).expect("grants"),
            vec![token(1), token(2)]
        );
    }

    #[tokio::test]
    async fn test_grant_to_unapproved_spender() {
        let state = daemon_state(test_config());
        let params = json!({
            "caller": owner().to_string(),
            "spender": spender().to_string(),
            "tokens": [token(1).to_string()],
        });
        let err = grant_allowance(&state, &params).await.expect_err("unapproved");
        assert_eq!(err.message, "CONFIGURATION");
    }

    #[tokio::test]
    async fn test_revoke_spender_clears_ledger() {
        let state = daemon_state(test_config());
        let caller = json!(owner().to_string());
        approve_spender(&state, &json!({"caller": caller, "spender": spender().to_string()}))
            .await
            .expect("approve");
        grant_allowance(
            &state,
            &json!({"caller": caller, "spender": spender().to_string(), "tokens": [token(1).to_string()]}),
        )
        .await
        .expect("grant");
        revoke_spender(&state, &json!({"caller": caller, "spender": spender().to_string()}))
            .await
            .expect("revoke");

        let system = state.system.lock().await;
        let buffer = system.allowances.address();
        assert_eq!(system.ledger.allowance(&token(1), &buffer, &spender()), 0);
        assert!(!system.allowances.is_spender(&spender()));
        drop(system);

        let listed = get_spenders(&state).await.expect("spenders");
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_revoke_allowance_unapproved_ok() {
        let state = daemon_state(test_config());
        let params = json!({
            "caller": guardian().to_string(),
            "spender": spender().to_string(),
            "tokens": [token(1).to_string()],
        });
        let value = revoke_allowance(&state, &params).await.expect("revoke");
        assert_eq!(value["tokens"], json!([]));
    }
}
