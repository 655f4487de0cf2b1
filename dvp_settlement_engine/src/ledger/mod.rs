//! Ledger client contract and wire types.
//!
//! The coordinator consumes the ledger through two operations only: fire-and-forget submission of
//! a signed transaction, and a bounded wait for a transaction receipt. Submission never waits for
//! the receipt itself; receipts are synchronized by the coordinator passes on later ticks.
mod rpc;

use std::time::Duration;

pub use rpc::HttpLedgerClient;
use thiserror::Error;

use crate::{
    db_types::{Address, TxRef},
    keys::SigningKey,
};
use dvp_common::TokenAmount;

#[derive(Debug, Error)]
pub enum LedgerClientError {
    /// The ledger rejected or failed to accept the transaction at send time. The caller logs and
    /// leaves the row for a later tick; this is never escalated automatically.
    #[error("The ledger did not accept the transaction: {0}")]
    SubmissionFailed(String),
    /// No receipt was available inside the bounded wait. Not an error condition: try again on the
    /// next tick.
    #[error("No receipt is available for {0} yet")]
    ReceiptNotAvailable(TxRef),
    #[error("Ledger RPC transport error: {0}")]
    Transport(String),
    #[error("Unexpected ledger RPC response: {0}")]
    InvalidResponse(String),
}

/// A ledger receipt for a mined transaction. `succeeded == false` means the transaction was
/// mined but reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub succeeded: bool,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct CreateDeliveryParams {
    pub token_address: Address,
    pub counterparty_address: Address,
    pub amount: TokenAmount,
    pub agent_address: Address,
    pub payload: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WithdrawPartialParams {
    pub token_address: Address,
    pub amount: TokenAmount,
}

/// The ledger operations the coordinator can submit against the DVP contract.
#[derive(Debug, Clone)]
pub enum LedgerOperation {
    CreateDelivery(CreateDeliveryParams),
    WithdrawPartial(WithdrawPartialParams),
}

impl LedgerOperation {
    pub fn method(&self) -> &'static str {
        match self {
            LedgerOperation::CreateDelivery(_) => "dvp_createDelivery",
            LedgerOperation::WithdrawPartial(_) => "dvp_withdrawPartial",
        }
    }
}

/// The ledger client contract consumed by the coordinator passes.
#[allow(async_fn_in_trait)]
pub trait LedgerClient: Clone {
    /// Submits the operation against the given DVP contract, signed with the sender's key, and
    /// returns the transaction reference without waiting for the receipt.
    async fn submit(
        &self,
        contract: &Address,
        op: &LedgerOperation,
        sender: &Address,
        key: &SigningKey,
    ) -> Result<TxRef, LedgerClientError>;

    /// Polls for the transaction receipt, waiting at most `timeout`. Returns
    /// [`LedgerClientError::ReceiptNotAvailable`] when the timeout lapses without a receipt.
    async fn wait_for_receipt(&self, tx_ref: &TxRef, timeout: Duration) -> Result<TxReceipt, LedgerClientError>;
}
