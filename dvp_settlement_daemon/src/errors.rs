use dvp_settlement_engine::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Settlement store error: {0}")]
    Store(#[from] StoreError),
    #[error("Could not install the shutdown signal handlers: {0}")]
    SignalHandler(#[from] std::io::Error),
}
