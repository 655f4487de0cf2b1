//! A scripted in-memory ledger client for driving the coordinator passes in tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use dvp_settlement_engine::{
    db_types::{Address, TxRef},
    keys::SigningKey,
    ledger::{LedgerClient, LedgerClientError, LedgerOperation, TxReceipt},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub method: String,
    pub contract: Address,
    pub sender: Address,
    pub tx_ref: TxRef,
}

#[derive(Default)]
struct LedgerState {
    next_tx: u64,
    submissions: Vec<Submission>,
    receipts: HashMap<TxRef, TxReceipt>,
    reject_submissions: bool,
    cancel_on_submit: Option<CancellationToken>,
}

/// Accepts submissions, handing out sequential transaction references, and serves receipts that
/// have been scripted with [`FakeLedger::set_receipt`]. Unscripted references behave like
/// transactions that have not been mined yet.
#[derive(Clone, Default)]
pub struct FakeLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    /// When set, every submission is refused with a `SubmissionFailed` error.
    pub fn reject_submissions(&self, reject: bool) {
        self.state.lock().unwrap().reject_submissions = reject;
    }

    /// Scripts the receipt for a transaction reference. `succeeded == false` models a mined but
    /// reverted transaction.
    pub fn set_receipt(&self, tx_ref: &TxRef, succeeded: bool) {
        self.state.lock().unwrap().receipts.insert(tx_ref.clone(), TxReceipt { succeeded, block_number: 42 });
    }

    /// Cancels the given token as a side effect of the next successful submission. Used to model
    /// a shutdown request landing in the middle of a pass.
    pub fn cancel_on_submit(&self, token: CancellationToken) {
        self.state.lock().unwrap().cancel_on_submit = Some(token);
    }
}

impl LedgerClient for FakeLedger {
    async fn submit(
        &self,
        contract: &Address,
        op: &LedgerOperation,
        sender: &Address,
        _key: &SigningKey,
    ) -> Result<TxRef, LedgerClientError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_submissions {
            return Err(LedgerClientError::SubmissionFailed("refused by test ledger".to_string()));
        }
        state.next_tx += 1;
        let tx_ref = TxRef::from(format!("0xfake{:04}", state.next_tx));
        state.submissions.push(Submission {
            method: op.method().to_string(),
            contract: contract.clone(),
            sender: sender.clone(),
            tx_ref: tx_ref.clone(),
        });
        if let Some(token) = state.cancel_on_submit.take() {
            token.cancel();
        }
        Ok(tx_ref)
    }

    async fn wait_for_receipt(&self, tx_ref: &TxRef, _timeout: Duration) -> Result<TxReceipt, LedgerClientError> {
        let state = self.state.lock().unwrap();
        state.receipts.get(tx_ref).copied().ok_or_else(|| LedgerClientError::ReceiptNotAvailable(tx_ref.clone()))
    }
}
