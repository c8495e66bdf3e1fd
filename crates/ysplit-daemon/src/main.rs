//! ysplit-daemon: hosts the revenue splitter.
//!
//! Single OS process running a Tokio async runtime. Operators and keepers
//! drive the splitter via JSON-RPC over a Unix socket; governance state and
//! the audit trail live in SQLite.

mod commands;
mod config;
mod rpc;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;
use crate::state::{unix_now, SplitterSystem};

/// Daemon-wide shared state.
///
/// Handlers that need both locks take `system` before `db`.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// The splitter components and their in-process counterparties.
    pub system: Mutex<SplitterSystem>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ysplit={}", config.advanced.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("ysplit daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    // 2. Open database
    let db_path = data_dir.join("ysplit.db");
    let conn = ysplit_db::open(&db_path)?;

    // 3. Build the splitter, preferring persisted governance state
    let mut system = SplitterSystem::from_config(&config)?;
    if system.restore(&conn)? {
        info!("governance state restored from {:?}", db_path);
    } else {
        system.checkpoint(&conn, unix_now(), None)?;
        info!("governance state initialised from config");
    }

    let socket_path = data_dir.join(&config.network.socket_name);
    let state = Arc::new(DaemonState {
        db: Arc::new(Mutex::new(conn)),
        config,
        system: Mutex::new(system),
    });

    // 4. Run the RPC server until Ctrl-C
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
