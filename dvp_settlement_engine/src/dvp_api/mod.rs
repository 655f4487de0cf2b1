//! The coordinator API: three idempotent passes over the settlement record store.
mod settlement_flow_api;

pub use settlement_flow_api::{PassSummary, SettlementFlowApi, TickSummary};
