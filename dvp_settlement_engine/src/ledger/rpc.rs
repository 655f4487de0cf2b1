//! JSON-RPC implementation of [`LedgerClient`].
//!
//! The ledger node exposes the DVP contract operations as a private JSON-RPC namespace on a
//! permissioned network. Submission methods accept the transaction parameters together with the
//! sender's key (the node signs on a private, authenticated endpoint) and return a transaction
//! hash immediately; receipts are fetched separately with `dvp_getTransactionReceipt`, which
//! returns `null` until the transaction has been mined.
use std::time::Duration;

use log::trace;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;

use super::{LedgerClient, LedgerClientError, LedgerOperation, TxReceipt};
use crate::{
    db_types::{Address, TxRef},
    keys::SigningKey,
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct HttpLedgerClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct ReceiptPayload {
    status: i64,
    #[serde(rename = "blockNumber")]
    block_number: u64,
}

impl HttpLedgerClient {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }

    async fn call<T: for<'de> Deserialize<'de>>(&self, method: &str, params: Value) -> Result<RpcResponse<T>, LedgerClientError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        trace!("📡️ Ledger RPC call: {method}");
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerClientError::Transport(e.to_string()))?;
        response.json().await.map_err(|e| LedgerClientError::InvalidResponse(e.to_string()))
    }

    async fn fetch_receipt(&self, tx_ref: &TxRef) -> Result<Option<TxReceipt>, LedgerClientError> {
        let response = self.call("dvp_getTransactionReceipt", json!([tx_ref.as_str()])).await?;
        receipt_from_response(response)
    }
}

fn rpc_error_message(err: &RpcError) -> String {
    format!("{} (code {})", err.message, err.code)
}

/// A rejection of a submission method is a [`LedgerClientError::SubmissionFailed`]: the caller
/// leaves the row untouched and retries on a later tick.
fn tx_ref_from_response(response: RpcResponse<String>) -> Result<TxRef, LedgerClientError> {
    if let Some(err) = response.error {
        return Err(LedgerClientError::SubmissionFailed(rpc_error_message(&err)));
    }
    response
        .result
        .map(TxRef::from)
        .ok_or_else(|| LedgerClientError::InvalidResponse("submission returned no hash".to_string()))
}

/// Receipt lookups never submit anything, so an RPC-level error here is a malformed or unexpected
/// response, not a failed submission. A `null` result means the transaction is not mined yet.
fn receipt_from_response(response: RpcResponse<ReceiptPayload>) -> Result<Option<TxReceipt>, LedgerClientError> {
    if let Some(err) = response.error {
        return Err(LedgerClientError::InvalidResponse(rpc_error_message(&err)));
    }
    Ok(response.result.map(|r| TxReceipt { succeeded: r.status != 0, block_number: r.block_number }))
}

fn submission_params(contract: &Address, op: &LedgerOperation, sender: &Address, key: &SigningKey) -> Value {
    let data = match op {
        LedgerOperation::CreateDelivery(p) => json!({
            "token": p.token_address,
            "buyer": p.counterparty_address,
            "amount": p.amount,
            "agent": p.agent_address,
            "data": p.payload,
        }),
        LedgerOperation::WithdrawPartial(p) => json!({
            "token": p.token_address,
            "value": p.amount,
        }),
    };
    json!([{
        "to": contract,
        "from": sender,
        "key": key.to_hex(),
        "data": data,
    }])
}

impl LedgerClient for HttpLedgerClient {
    async fn submit(
        &self,
        contract: &Address,
        op: &LedgerOperation,
        sender: &Address,
        key: &SigningKey,
    ) -> Result<TxRef, LedgerClientError> {
        let params = submission_params(contract, op, sender, key);
        let response = self.call(op.method(), params).await?;
        tx_ref_from_response(response)
    }

    async fn wait_for_receipt(&self, tx_ref: &TxRef, timeout: Duration) -> Result<TxReceipt, LedgerClientError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.fetch_receipt(tx_ref).await? {
                return Ok(receipt);
            }
            if Instant::now() + RECEIPT_POLL_INTERVAL > deadline {
                return Err(LedgerClientError::ReceiptNotAvailable(tx_ref.clone()));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
