//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};
use ysplit_allowance::AllowanceError;
use ysplit_governance::GovernanceError;
use ysplit_oracle::OracleError;
use ysplit_revenue::RevenueError;
use ysplit_types::ErrorClass;

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Splitter errors, one code per class

    /// A splitter operation failed; the code tells the caller how to react
    /// and `data.kind` names the specific error.
    pub fn splitter(class: ErrorClass, kind: &str, detail: &str) -> Self {
        let (code, message) = match class {
            ErrorClass::RetryLater => (-32020, "RETRY_LATER"),
            ErrorClass::Configuration => (-32030, "CONFIGURATION"),
            ErrorClass::MissingExternalSetup => (-32040, "MISSING_EXTERNAL_SETUP"),
            ErrorClass::Fatal => (-32050, "FATAL"),
        };
        Self {
            code,
            message: message.to_string(),
            data: Some(serde_json::json!({"kind": kind, "detail": detail})),
        }
    }
}

impl From<GovernanceError> for RpcError {
    fn from(err: GovernanceError) -> Self {
        Self::splitter(err.class(), err.kind(), &err.to_string())
    }
}

impl From<AllowanceError> for RpcError {
    fn from(err: AllowanceError) -> Self {
        Self::splitter(err.class(), err.kind(), &err.to_string())
    }
}

impl From<RevenueError> for RpcError {
    fn from(err: RevenueError) -> Self {
        Self::splitter(err.class(), err.kind(), &err.to_string())
    }
}

impl From<OracleError> for RpcError {
    fn from(err: OracleError) -> Self {
        Self::splitter(ErrorClass::Configuration, err.kind(), &err.to_string())
    }
}

impl From<ysplit_ledger::LedgerError> for RpcError {
    fn from(err: ysplit_ledger::LedgerError) -> Self {
        Self::splitter(ErrorClass::Fatal, err.kind(), &err.to_string())
    }
}

impl From<ysplit_db::DbError> for RpcError {
    fn from(err: ysplit_db::DbError) -> Self {
        error!("database error: {err}");
        Self::internal_error(&format!("db error: {err}"))
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) if request.jsonrpc == "2.0" => dispatch_request(state.clone(), request).await,
            Ok(request) => RpcResponse::error(request.id, RpcError::invalid_request()),
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    if method.starts_with("dev_") && !state.config.advanced.dev_methods {
        return RpcResponse::error(id, RpcError::method_not_found(method));
    }

    let result = match method {
        // Ratio calculation
        "compute_splits" => commands::revenue::compute_splits(&state).await,
        "vote_snapshot" => commands::revenue::vote_snapshot(&state).await,
        "pending_balances" => commands::revenue::pending_balances(&state).await,

        // Execution
        "execute_split" => commands::revenue::execute_split(&state, params).await,
        "deposit_and_split" => commands::revenue::deposit_and_split(&state, params).await,
        "get_sources" => commands::revenue::get_sources(&state).await,
        "set_sources" => commands::revenue::set_sources(&state, params).await,
        "set_treasury" => commands::revenue::set_treasury(&state, params).await,
        "sweep" => commands::revenue::sweep(&state, params).await,
        "distribute_rewards" => commands::revenue::distribute_rewards(&state, params).await,

        // Gauge registry and roles
        "category_set" => commands::governance::category_set(&state, params).await,
        "set_category_set" => commands::governance::set_category_set(&state, params).await,
        "get_split_rules" => commands::governance::get_split_rules(&state).await,
        "set_split_rule" => commands::governance::set_split_rule(&state, params).await,
        "get_roles" => commands::governance::get_roles(&state).await,
        "set_owner" => commands::governance::set_owner(&state, params).await,
        "set_guardian" => commands::governance::set_guardian(&state, params).await,
        "set_operator" => commands::governance::set_operator(&state, params).await,

        // Allowance registry
        "approve_spender" => commands::allowances::approve_spender(&state, params).await,
        "revoke_spender" => commands::allowances::revoke_spender(&state, params).await,
        "grant_allowance" => commands::allowances::grant_allowance(&state, params).await,
        "revoke_allowance" => commands::allowances::revoke_allowance(&state, params).await,
        "get_approvals" => commands::allowances::get_approvals(&state, params).await,
        "is_spender" => commands::allowances::is_spender(&state, params).await,
        "get_spenders" => commands::allowances::get_spenders(&state).await,

        // History and status
        "get_audit_log" => commands::history::get_audit_log(&state, params).await,
        "get_executions" => commands::history::get_executions(&state, params).await,
        "get_execution_totals" => commands::history::get_execution_totals(&state).await,
        "get_status" => commands::history::get_status(&state).await,

        // Dev-only commands
        "dev_mint" => commands::dev::mint(&state, params).await,
        "dev_approve" => commands::dev::approve(&state, params).await,
        "dev_balance_of" => commands::dev::balance_of(&state, params).await,
        "dev_add_gauge" => commands::dev::add_gauge(&state, params).await,
        "dev_set_voting_power" => commands::dev::set_voting_power(&state, params).await,
        "dev_vote" => commands::dev::vote(&state, params).await,
        "dev_set_vote" => commands::dev::set_vote(&state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ysplit_governance::TargetRejection;
    use ysplit_types::{Address, Category};

    fn kind(err: &RpcError) -> &str {
        err.data
            .as_ref()
            .and_then(|data| data["kind"].as_str())
            .unwrap_or_default()
    }

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);

        let err = RpcError::from(RevenueError::NoVotingPower {
            voter: Address::repeat_byte(1),
        });
        assert_eq!(err.code, -32020);
        assert_eq!(err.message, "RETRY_LATER");
        assert_eq!(kind(&err), "NoVotingPower");

        // Same class and code, different kind.
        let err = RpcError::from(RevenueError::InconsistentVoteState {
            categorized: 2,
            total: 1,
        });
        assert_eq!(err.code, -32020);
        assert_eq!(kind(&err), "InconsistentVoteState");

        let err = RpcError::from(AllowanceError::UnapprovedSpender(Address::repeat_byte(1)));
        assert_eq!(err.code, -32030);
        assert_eq!(kind(&err), "UnapprovedSpender");

        // Wrapped governance errors keep their own kind.
        let err = RpcError::from(RevenueError::from(GovernanceError::InvalidTarget {
            category: Category::Partner,
            target: Address::repeat_byte(3),
            reason: TargetRejection::Duplicate,
        }));
        assert_eq!(err.code, -32030);
        assert_eq!(kind(&err), "InvalidTarget");

        let err = RpcError::from(RevenueError::InsufficientExternalAllowance {
            token: Address::repeat_byte(1),
            owner: Address::repeat_byte(2),
            available: 0,
            required: 1,
        });
        assert_eq!(err.message, "MISSING_EXTERNAL_SETUP");
        assert_eq!(kind(&err), "InsufficientExternalAllowance");

        let err = RpcError::from(RevenueError::Overflow);
        assert_eq!(err.code, -32050);
        assert_eq!(kind(&err), "Overflow");
        assert!(err.data.as_ref().and_then(|d| d.get("detail")).is_some());
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(
            serde_json::json!(1),
            serde_json::json!({"ok": true}),
        );
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(
            serde_json::json!(1),
            RpcError::internal_error("test"),
        );
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32603);
    }
}
