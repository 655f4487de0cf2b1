//! # Settlement store management and control.
//!
//! This module defines the interface contracts that a database backend must expose in order to
//! act as the settlement record store.
//!
//! ## Settlement records
//! A settlement record tracks one settlement attempt from intake to a terminal outcome. The
//! coordinator passes never hold state of their own: every transition is a guarded, single-row
//! atomic update through [`SettlementStore`], so a crash between rows loses no completed work.
//!
//! ## Traits
//! * [`SettlementStore`] defines row selection for the three coordinator passes and the guarded
//!   state transitions they may apply.
//! * [`AccountManagement`] provides access to the registered issuer accounts that signing keys
//!   are resolved from.
mod account_management;
mod errors;
mod settlement_store;

pub use account_management::AccountManagement;
pub use errors::StoreError;
pub use settlement_store::SettlementStore;
