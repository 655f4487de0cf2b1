use crate::{
    db_types::{NewSettlementProcess, SettlementProcess, TxRef},
    traits::StoreError,
};

/// This trait defines the behaviour a backend must support to act as the settlement record store.
///
/// Row selection and row mutation are deliberately separate: each coordinator pass selects a
/// snapshot of eligible rows, then applies at most one guarded transition per row. Every
/// transition is committed individually, and every `mark_*` method carries a WHERE guard on the
/// current state, so a transition can never resurrect a terminal row or run twice.
#[allow(async_fn_in_trait)]
pub trait SettlementStore: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Inserts a new settlement record, as the intake API does after performing step 0
    /// synchronously. Returns the full row, including its assigned id.
    async fn insert_settlement(&self, settlement: NewSettlementProcess) -> Result<SettlementProcess, StoreError>;

    /// Fetches a single settlement row by id.
    async fn fetch_settlement(&self, id: i64) -> Result<Option<SettlementProcess>, StoreError>;

    /// Rows eligible for the send-step pass: `Processing` with a step transaction status of
    /// `Done` (previous step complete) or `Retry` (previous attempt reverted). These are
    /// independent starts, so no ordering is applied.
    async fn fetch_executable(&self) -> Result<Vec<SettlementProcess>, StoreError>;

    /// Rows eligible for the step-result pass: `Processing` with a `Pending` step transaction,
    /// oldest-modified first so that no settlement is starved.
    async fn fetch_awaiting_receipt(&self) -> Result<Vec<SettlementProcess>, StoreError>;

    /// Rows eligible for the revert-result pass: `Processing` with a `Pending` compensating
    /// transaction, oldest-modified first.
    async fn fetch_awaiting_revert(&self) -> Result<Vec<SettlementProcess>, StoreError>;

    /// Records a successful step submission: `step` moves to 1 and the step transaction becomes
    /// `Pending` with the given reference.
    async fn mark_step_submitted(&self, id: i64, tx_ref: TxRef) -> Result<SettlementProcess, StoreError>;

    /// A reverted step with no compensation path: the step transaction reference is cleared and
    /// the status set to `Retry`, making the row eligible for the send-step pass again.
    async fn mark_step_retry(&self, id: i64) -> Result<SettlementProcess, StoreError>;

    /// A confirmed step transaction with further steps outstanding: the step transaction becomes
    /// `Done` and the process stays `Processing`.
    async fn mark_step_done(&self, id: i64) -> Result<SettlementProcess, StoreError>;

    /// A confirmed final step: the step transaction becomes `Done` and the process terminates in
    /// `DoneSuccess`.
    async fn mark_settled(&self, id: i64) -> Result<SettlementProcess, StoreError>;

    /// A reverted step with a compensating transaction in flight: the step transaction becomes
    /// `Failed` and the revert transaction `Pending` with the given reference.
    async fn mark_step_failed(&self, id: i64, revert_tx_ref: TxRef) -> Result<SettlementProcess, StoreError>;

    /// A reverted compensating transaction that has been submitted again: the revert reference is
    /// replaced and the revert status stays `Pending`.
    async fn mark_revert_resubmitted(&self, id: i64, revert_tx_ref: TxRef) -> Result<SettlementProcess, StoreError>;

    /// A confirmed compensating transaction: the revert transaction becomes `Done` and the
    /// process terminates in `DoneFailed`.
    async fn mark_reverted(&self, id: i64) -> Result<SettlementProcess, StoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
