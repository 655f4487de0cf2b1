use std::{env, time::Duration};

use dvp_settlement_engine::db_url;
use log::*;

const DEFAULT_TICK_INTERVAL_SECS: u64 = 10;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 1;
const DEFAULT_LEDGER_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub database_url: String,
    /// The ledger node the coordinator submits transactions to and polls receipts from.
    pub ledger_rpc_url: String,
    /// How long to sleep between coordinator ticks.
    pub tick_interval: Duration,
    /// How long a single receipt poll may block within a pass. Keep this short: a slow receipt is
    /// simply picked up on a later tick.
    pub receipt_timeout: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            ledger_rpc_url: DEFAULT_LEDGER_RPC_URL.to_string(),
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
        }
    }
}

impl DaemonConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = db_url();
        let ledger_rpc_url = env::var("DVP_LEDGER_RPC_URL").ok().unwrap_or_else(|| {
            info!("🪛️ DVP_LEDGER_RPC_URL is not set. Using the default, {DEFAULT_LEDGER_RPC_URL}, instead.");
            DEFAULT_LEDGER_RPC_URL.into()
        });
        let tick_interval =
            Duration::from_secs(u64_var("DVP_TICK_INTERVAL_SECS", DEFAULT_TICK_INTERVAL_SECS));
        let receipt_timeout =
            Duration::from_secs(u64_var("DVP_RECEIPT_TIMEOUT_SECS", DEFAULT_RECEIPT_TIMEOUT_SECS));
        Self { database_url, ledger_rpc_url, tick_interval, receipt_timeout }
    }
}

fn u64_var(name: &str, default: u64) -> u64 {
    env::var(name)
        .map(|s| {
            s.parse::<u64>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invalid_numeric_vars_fall_back_to_defaults() {
        env::set_var("DVP_TICK_INTERVAL_SECS", "soon");
        let config = DaemonConfig::from_env_or_default();
        assert_eq!(config.tick_interval, Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS));
        env::remove_var("DVP_TICK_INTERVAL_SECS");
    }

    #[test]
    fn defaults_are_sane() {
        let config = DaemonConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(10));
        assert_eq!(config.receipt_timeout, Duration::from_secs(1));
    }
}
