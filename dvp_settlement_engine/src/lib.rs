//! DVP Settlement Engine
//!
//! This library drives asynchronous delivery-versus-payment (DVP) settlements for tokenized
//! securities to completion. A settlement is a small saga: the intake API performs step 0
//! synchronously (an escrow deposit, or the cancel/finish/abort call itself) and records a
//! [`db_types::SettlementProcess`] row; from then on the coordinator owns the row and advances it
//! through step 1, compensating with a partial withdrawal when a step reverts on the ledger.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should
//!    never need to access the database directly; use the public API instead. The exception is
//!    the data types used in the database, which are defined in [`db_types`] and are public.
//! 2. External ledger plumbing: the [`ledger`] module defines the [`ledger::LedgerClient`]
//!    contract plus a JSON-RPC implementation, and [`keys`] resolves an issuer's signing key from
//!    the registered account records.
//! 3. The coordinator itself ([`SettlementFlowApi`]): three idempotent passes (send step
//!    transactions, synchronize step results, synchronize revert results) that communicate only
//!    through persisted state, so the process can be stopped and restarted at any point.
mod db;

pub mod db_types;
mod dvp_api;
pub mod keys;
pub mod ledger;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, SqliteDatabase};
pub use db::traits;
pub use db::traits::{AccountManagement, SettlementStore, StoreError};
pub use dvp_api::{PassSummary, SettlementFlowApi, TickSummary};
