use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewSettlementProcess, ProcessStatus, RevertTxStatus, SettlementProcess, StepTxStatus, TxRef},
    traits::StoreError,
};

/// Inserts a new settlement row. Step 0 has already been performed synchronously by the caller,
/// so the row starts at `step = 0` with the step transaction `Done`.
pub async fn insert_settlement(
    settlement: NewSettlementProcess,
    conn: &mut SqliteConnection,
) -> Result<SettlementProcess, StoreError> {
    let row = sqlx::query_as(
        r#"
            INSERT INTO settlement_processes (
                party_address,
                counterparty_address,
                agent_address,
                token_address,
                contract_address,
                amount,
                payload,
                delivery_ref,
                process_type,
                process_status,
                step,
                step_tx_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11)
            RETURNING *;
        "#,
    )
    .bind(settlement.party_address)
    .bind(settlement.counterparty_address)
    .bind(settlement.agent_address)
    .bind(settlement.token_address)
    .bind(settlement.contract_address)
    .bind(settlement.amount)
    .bind(settlement.payload)
    .bind(settlement.delivery_ref)
    .bind(settlement.process_type)
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Done)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn fetch_settlement(id: i64, conn: &mut SqliteConnection) -> Result<Option<SettlementProcess>, sqlx::Error> {
    let row = sqlx::query_as("SELECT * FROM settlement_processes WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Rows ready for the send-step pass. These are independent settlement starts, so no ordering is
/// applied.
pub(crate) async fn fetch_executable(conn: &mut SqliteConnection) -> Result<Vec<SettlementProcess>, sqlx::Error> {
    let rows = sqlx::query_as(
        "SELECT * FROM settlement_processes WHERE process_status = $1 AND step_tx_status IN ($2, $3)",
    )
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Done)
    .bind(StepTxStatus::Retry)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ fetch_executable returned {} rows", rows.len());
    Ok(rows)
}

/// Rows with a pending step transaction, oldest-modified first for fairness across settlements.
pub(crate) async fn fetch_awaiting_receipt(conn: &mut SqliteConnection) -> Result<Vec<SettlementProcess>, sqlx::Error> {
    let rows = sqlx::query_as(
        "SELECT * FROM settlement_processes WHERE process_status = $1 AND step_tx_status = $2 ORDER BY updated_at ASC",
    )
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Pending)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ fetch_awaiting_receipt returned {} rows", rows.len());
    Ok(rows)
}

/// Rows with a pending compensating transaction, oldest-modified first.
pub(crate) async fn fetch_awaiting_revert(conn: &mut SqliteConnection) -> Result<Vec<SettlementProcess>, sqlx::Error> {
    let rows = sqlx::query_as(
        "SELECT * FROM settlement_processes WHERE process_status = $1 AND revert_tx_status = $2 ORDER BY updated_at \
         ASC",
    )
    .bind(ProcessStatus::Processing)
    .bind(RevertTxStatus::Pending)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ fetch_awaiting_revert returned {} rows", rows.len());
    Ok(rows)
}

/// The step transaction has been accepted by the ledger: move to step 1 and wait for the receipt.
///
/// The guard re-checks the selection criteria of the send-step pass, so a row that has been
/// mutated since it was selected (or that is terminal) is never touched; in that case an
/// [`StoreError::IllegalTransition`] is returned.
pub(crate) async fn mark_step_submitted(
    id: i64,
    tx_ref: TxRef,
    conn: &mut SqliteConnection,
) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET step = 1, step_tx_ref = $1, step_tx_status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND process_status = $4 AND step_tx_status IN ($5, $6)
            RETURNING *;
        "#,
    )
    .bind(tx_ref)
    .bind(StepTxStatus::Pending)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Done)
    .bind(StepTxStatus::Retry)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement is not awaiting a step submission"))
}

/// The step transaction reverted and there is no compensation path: clear the reference and make
/// the row eligible for the send-step pass again.
pub(crate) async fn mark_step_retry(id: i64, conn: &mut SqliteConnection) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET step_tx_ref = NULL, step_tx_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND process_status = $3 AND step_tx_status = $4
            RETURNING *;
        "#,
    )
    .bind(StepTxStatus::Retry)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Pending)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement has no pending step transaction to retry"))
}

/// The step transaction confirmed, with further steps outstanding.
pub(crate) async fn mark_step_done(id: i64, conn: &mut SqliteConnection) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET step_tx_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND process_status = $3 AND step_tx_status = $4
            RETURNING *;
        "#,
    )
    .bind(StepTxStatus::Done)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Pending)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement has no pending step transaction to confirm"))
}

/// The final step confirmed: the settlement terminates in `DoneSuccess`.
pub(crate) async fn mark_settled(id: i64, conn: &mut SqliteConnection) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET step_tx_status = $1, process_status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND process_status = $4 AND step_tx_status = $5
            RETURNING *;
        "#,
    )
    .bind(StepTxStatus::Done)
    .bind(ProcessStatus::DoneSuccess)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Pending)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement has no pending step transaction to confirm"))
}

/// The step transaction reverted and a compensating withdrawal has been submitted.
pub(crate) async fn mark_step_failed(
    id: i64,
    revert_tx_ref: TxRef,
    conn: &mut SqliteConnection,
) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET step_tx_status = $1, revert_tx_ref = $2, revert_tx_status = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $4 AND process_status = $5 AND step_tx_status = $6
            RETURNING *;
        "#,
    )
    .bind(StepTxStatus::Failed)
    .bind(revert_tx_ref)
    .bind(RevertTxStatus::Pending)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(StepTxStatus::Pending)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement has no pending step transaction to fail"))
}

/// The compensating transaction itself reverted and has been submitted again. The revert status
/// stays `Pending`; this can repeat until the compensation lands.
pub(crate) async fn mark_revert_resubmitted(
    id: i64,
    revert_tx_ref: TxRef,
    conn: &mut SqliteConnection,
) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET revert_tx_ref = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND process_status = $3 AND revert_tx_status = $4
            RETURNING *;
        "#,
    )
    .bind(revert_tx_ref)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(RevertTxStatus::Pending)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement has no pending compensating transaction"))
}

/// The compensating transaction confirmed: the settlement terminates in `DoneFailed`.
pub(crate) async fn mark_reverted(id: i64, conn: &mut SqliteConnection) -> Result<SettlementProcess, StoreError> {
    let row: Option<SettlementProcess> = sqlx::query_as(
        r#"
            UPDATE settlement_processes
            SET revert_tx_status = $1, process_status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND process_status = $4 AND revert_tx_status = $5
            RETURNING *;
        "#,
    )
    .bind(RevertTxStatus::Done)
    .bind(ProcessStatus::DoneFailed)
    .bind(id)
    .bind(ProcessStatus::Processing)
    .bind(RevertTxStatus::Pending)
    .fetch_optional(conn)
    .await?;
    row.ok_or_else(|| illegal(id, "the settlement has no pending compensating transaction"))
}

fn illegal(id: i64, reason: &str) -> StoreError {
    StoreError::IllegalTransition { id, reason: reason.to_string() }
}
