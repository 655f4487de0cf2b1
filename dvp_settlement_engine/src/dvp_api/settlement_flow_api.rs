use std::{
    fmt::{Debug, Display},
    time::Duration,
};

use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    db_types::{ProcessType, SettlementProcess, StepTxStatus},
    keys::KeyResolver,
    ledger::{CreateDeliveryParams, LedgerClient, LedgerClientError, LedgerOperation, WithdrawPartialParams},
    traits::{AccountManagement, SettlementStore, StoreError},
};

/// Counts for a single pass over the store: how many eligible rows were selected, and how many
/// were advanced to a new state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub selected: usize,
    pub advanced: usize,
}

impl PassSummary {
    fn selected(n: usize) -> Self {
        Self { selected: n, advanced: 0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub step_send: PassSummary,
    pub step_sync: PassSummary,
    pub revert_sync: PassSummary,
}

impl Display for TickSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sent {}/{} step txs, synced {}/{} step results, synced {}/{} revert results",
            self.step_send.advanced,
            self.step_send.selected,
            self.step_sync.advanced,
            self.step_sync.selected,
            self.revert_sync.advanced,
            self.revert_sync.selected
        )
    }
}

/// `SettlementFlowApi` drives settlement records through their remaining ledger steps.
///
/// All coordination happens through persisted state: no pass calls another, each state transition
/// is committed as a single-row update the moment it is computed, and every pass is safe to
/// re-run at any time. Ledger and key-resolution failures are handled (and logged) per row and
/// never abort a pass; only store failures propagate to the caller.
pub struct SettlementFlowApi<B, L> {
    db: B,
    ledger: L,
    keys: KeyResolver<B>,
    receipt_timeout: Duration,
}

impl<B, L> Debug for SettlementFlowApi<B, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementFlowApi")
    }
}

impl<B, L> SettlementFlowApi<B, L>
where
    B: SettlementStore + AccountManagement,
    L: LedgerClient,
{
    pub fn new(db: B, ledger: L, receipt_timeout: Duration) -> Self {
        let keys = KeyResolver::new(db.clone());
        Self { db, ledger, keys, receipt_timeout }
    }

    /// Runs one coordinator tick: send step transactions, synchronize step results, synchronize
    /// revert results, in that fixed order, each against the current store state.
    pub async fn run_tick(&self, shutdown: &CancellationToken) -> Result<TickSummary, StoreError> {
        let step_send = self.send_step_txs(shutdown).await?;
        let step_sync = self.sync_step_tx_results(shutdown).await?;
        let revert_sync = self.sync_revert_tx_results(shutdown).await?;
        Ok(TickSummary { step_send, step_sync, revert_sync })
    }

    /// Pass 1: submit the next step transaction for every settlement whose previous step is
    /// complete (`Done`) or due for another attempt (`Retry`).
    ///
    /// A row whose submission fails is left untouched and logged; it is picked up again on a
    /// later tick because it still matches the selection filter.
    pub async fn send_step_txs(&self, shutdown: &CancellationToken) -> Result<PassSummary, StoreError> {
        let records = self.db.fetch_executable().await?;
        let mut summary = PassSummary::selected(records.len());
        for record in records {
            if shutdown.is_cancelled() {
                info!("🔄️ [SendStepTx] Shutdown requested. Remaining settlements are left for the next tick");
                break;
            }
            trace!("🔄️ [SendStepTx] Start: settlement={}", record.id);

            let key = match self.keys.resolve(&record.party_address).await {
                Ok(key) => key,
                Err(e) => {
                    warn!("🔄️ [SendStepTx] Could not resolve a signing key for settlement {}: {e}", record.id);
                    continue;
                },
            };

            let op = step_operation(&record);
            match self.ledger.submit(&record.contract_address, &op, &record.party_address, &key).await {
                Ok(tx_ref) => {
                    self.db.mark_step_submitted(record.id, tx_ref.clone()).await?;
                    info!(
                        "🔄️ [SendStepTx] Sent step transaction: settlement={}, type={}, step=1, tx={tx_ref}",
                        record.id, record.process_type
                    );
                    summary.advanced += 1;
                },
                Err(e) => {
                    error!("🔄️ [SendStepTx] Failed to send step transaction for settlement {}: {e}", record.id);
                },
            }
        }
        Ok(summary)
    }

    /// Pass 2: poll for receipts on pending step transactions, oldest-modified first.
    ///
    /// A confirmed final step terminates the settlement in `DoneSuccess`. A reverted step either
    /// triggers a compensating withdrawal (`CreateDelivery`) or resets the row for a fresh
    /// attempt (all other types, which have no compensation path).
    pub async fn sync_step_tx_results(&self, shutdown: &CancellationToken) -> Result<PassSummary, StoreError> {
        let records = self.db.fetch_awaiting_receipt().await?;
        let mut summary = PassSummary::selected(records.len());
        for record in records {
            if shutdown.is_cancelled() {
                info!("🔄️ [SyncStepTxResult] Shutdown requested. Remaining settlements are left for the next tick");
                break;
            }
            trace!("🔄️ [SyncStepTxResult] Start: settlement={}", record.id);

            let Some(tx_ref) = record.step_tx_ref.clone() else {
                error!("🔄️ [SyncStepTxResult] Settlement {} is pending but has no step transaction", record.id);
                continue;
            };
            let receipt = match self.ledger.wait_for_receipt(&tx_ref, self.receipt_timeout).await {
                Ok(receipt) => receipt,
                Err(LedgerClientError::ReceiptNotAvailable(_)) => {
                    trace!("🔄️ [SyncStepTxResult] No receipt yet for settlement {}", record.id);
                    continue;
                },
                Err(e) => {
                    warn!("🔄️ [SyncStepTxResult] Receipt lookup failed for settlement {}: {e}", record.id);
                    continue;
                },
            };

            if receipt.succeeded {
                // Every process type currently finishes at step 1.
                if record.step == 1 {
                    self.db.mark_settled(record.id).await?;
                    info!("🔄️ [SyncStepTxResult] Settlement {} completed successfully", record.id);
                } else {
                    self.db.mark_step_done(record.id).await?;
                    info!("🔄️ [SyncStepTxResult] Settlement {} step {} confirmed", record.id, record.step);
                }
                summary.advanced += 1;
            } else {
                warn!(
                    "🔄️ [SyncStepTxResult] Step transaction reverted: settlement={}, type={}, step={}",
                    record.id, record.process_type, record.step
                );
                if record.process_type == ProcessType::CreateDelivery {
                    summary.advanced += usize::from(self.compensate_failed_step(&record).await?);
                } else {
                    self.db.mark_step_retry(record.id).await?;
                    info!("🔄️ [SyncStepTxResult] Settlement {} scheduled for a retry", record.id);
                    summary.advanced += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Pass 3: poll for receipts on pending compensating transactions, oldest-modified first.
    ///
    /// A confirmed compensation terminates the settlement in `DoneFailed`. A reverted
    /// compensation is submitted again and stays `Pending`; this can repeat indefinitely until
    /// the withdrawal lands.
    pub async fn sync_revert_tx_results(&self, shutdown: &CancellationToken) -> Result<PassSummary, StoreError> {
        let records = self.db.fetch_awaiting_revert().await?;
        let mut summary = PassSummary::selected(records.len());
        for record in records {
            if shutdown.is_cancelled() {
                info!("🔄️ [SyncRevertTxResult] Shutdown requested. Remaining settlements are left for the next tick");
                break;
            }
            trace!("🔄️ [SyncRevertTxResult] Start: settlement={}", record.id);

            let Some(revert_tx_ref) = record.revert_tx_ref.clone() else {
                error!("🔄️ [SyncRevertTxResult] Settlement {} has no compensating transaction", record.id);
                continue;
            };
            let receipt = match self.ledger.wait_for_receipt(&revert_tx_ref, self.receipt_timeout).await {
                Ok(receipt) => receipt,
                Err(LedgerClientError::ReceiptNotAvailable(_)) => {
                    trace!("🔄️ [SyncRevertTxResult] No receipt yet for settlement {}", record.id);
                    continue;
                },
                Err(e) => {
                    warn!("🔄️ [SyncRevertTxResult] Receipt lookup failed for settlement {}: {e}", record.id);
                    continue;
                },
            };

            if receipt.succeeded {
                self.db.mark_reverted(record.id).await?;
                info!("🔄️ [SyncRevertTxResult] Settlement {} has been compensated", record.id);
                summary.advanced += 1;
            } else {
                warn!(
                    "🔄️ [SyncRevertTxResult] Compensating transaction reverted: settlement={}, type={}",
                    record.id, record.process_type
                );
                let key = match self.keys.resolve(&record.party_address).await {
                    Ok(key) => key,
                    Err(e) => {
                        warn!(
                            "🔄️ [SyncRevertTxResult] Could not resolve a signing key for settlement {}: {e}",
                            record.id
                        );
                        continue;
                    },
                };
                let op = withdraw_operation(&record);
                match self.ledger.submit(&record.contract_address, &op, &record.party_address, &key).await {
                    Ok(tx_ref) => {
                        self.db.mark_revert_resubmitted(record.id, tx_ref.clone()).await?;
                        info!(
                            "🔄️ [SyncRevertTxResult] Resent compensating transaction: settlement={}, tx={tx_ref}",
                            record.id
                        );
                        summary.advanced += 1;
                    },
                    Err(e) => {
                        error!(
                            "🔄️ [SyncRevertTxResult] Failed to resend compensating transaction for settlement {}: \
                             {e}",
                            record.id
                        );
                    },
                }
            }
        }
        Ok(summary)
    }

    /// Submits the compensating withdrawal for a reverted `CreateDelivery` step. Returns whether
    /// the row was advanced. Key or submission failures leave the row untouched (still `Pending`)
    /// so the receipt is re-examined on a later tick.
    async fn compensate_failed_step(&self, record: &SettlementProcess) -> Result<bool, StoreError> {
        debug_assert_eq!(record.step_tx_status, Some(StepTxStatus::Pending));
        let key = match self.keys.resolve(&record.party_address).await {
            Ok(key) => key,
            Err(e) => {
                warn!("🔄️ [SyncStepTxResult] Could not resolve a signing key for settlement {}: {e}", record.id);
                return Ok(false);
            },
        };
        let op = withdraw_operation(record);
        match self.ledger.submit(&record.contract_address, &op, &record.party_address, &key).await {
            Ok(tx_ref) => {
                self.db.mark_step_failed(record.id, tx_ref.clone()).await?;
                info!(
                    "🔄️ [SyncStepTxResult] Sent compensating transaction: settlement={}, type={}, tx={tx_ref}",
                    record.id, record.process_type
                );
                Ok(true)
            },
            Err(e) => {
                error!(
                    "🔄️ [SyncStepTxResult] Failed to send compensating transaction for settlement {}: {e}",
                    record.id
                );
                Ok(false)
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// The ledger operation for a settlement's next step. `CreateDelivery` submits the delivery
/// itself; the other three types already performed their ledger call at step 0 and finish with a
/// partial withdrawal of the escrowed amount.
fn step_operation(record: &SettlementProcess) -> LedgerOperation {
    match record.process_type {
        ProcessType::CreateDelivery => LedgerOperation::CreateDelivery(CreateDeliveryParams {
            token_address: record.token_address.clone(),
            counterparty_address: record.counterparty_address.clone(),
            amount: record.amount,
            agent_address: record.agent_address.clone(),
            payload: record.payload.clone(),
        }),
        ProcessType::CancelDelivery | ProcessType::FinishDelivery | ProcessType::AbortDelivery => {
            withdraw_operation(record)
        },
    }
}

fn withdraw_operation(record: &SettlementProcess) -> LedgerOperation {
    LedgerOperation::WithdrawPartial(WithdrawPartialParams {
        token_address: record.token_address.clone(),
        amount: record.amount,
    })
}
