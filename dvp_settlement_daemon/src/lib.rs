//! The settlement daemon wires the coordinator to the real world: configuration from the
//! environment, a sqlite store, a JSON-RPC ledger client, and a tick loop with graceful shutdown.
pub mod config;
pub mod errors;
pub mod shutdown;
pub mod worker;
