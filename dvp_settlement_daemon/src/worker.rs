use dvp_settlement_engine::{ledger::HttpLedgerClient, SettlementFlowApi, SqliteDatabase};
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{config::DaemonConfig, errors::DaemonError, shutdown::listen_for_shutdown};

/// Installs the shutdown handlers and runs the coordinator until a stop signal arrives.
pub async fn run(config: DaemonConfig) -> Result<(), DaemonError> {
    let shutdown = listen_for_shutdown()?;
    run_coordinator(config, shutdown).await
}

/// Runs the coordinator loop until the shutdown token is cancelled.
///
/// Each tick runs the three passes in order against a fresh snapshot of the store. A failing tick
/// is logged and the loop carries on: every transition the tick did commit is durable, and the
/// next tick simply resumes from the persisted state.
pub async fn run_coordinator(config: DaemonConfig, shutdown: CancellationToken) -> Result<(), DaemonError> {
    let db = SqliteDatabase::new_with_url(&config.database_url).await?;
    db.run_migrations().await?;
    let ledger = HttpLedgerClient::new(config.ledger_rpc_url.as_str());
    let api = SettlementFlowApi::new(db, ledger, config.receipt_timeout);
    info!("🚀️ Settlement coordinator started. Ticking every {:?}", config.tick_interval);

    while !shutdown.is_cancelled() {
        match api.run_tick(&shutdown).await {
            Ok(summary) => debug!("🔄️ Tick complete: {summary}"),
            Err(e) => error!("🔄️ Tick aborted on a store error: {e}"),
        }
        tokio::select! {
            _ = shutdown.cancelled() => {},
            _ = tokio::time::sleep(config.tick_interval) => {},
        }
    }
    info!("🛑️ Settlement coordinator stopped");
    Ok(())
}
