use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dvp_common::{Secret, TokenAmount};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------      Address       ----------------------------------------------------------
/// A lightweight wrapper around a string representing a ledger address.
#[derive(Clone, Debug, Type, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Address(pub String);

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       TxRef        ----------------------------------------------------------
/// A ledger transaction reference (hash), as returned by the ledger on submission.
#[derive(Clone, Debug, Type, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TxRef(pub String);

impl FromStr for TxRef {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TxRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TxRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    ProcessType     ----------------------------------------------------------
/// The kind of settlement being driven. Immutable after the intake API creates the record.
///
/// Step 0 is always performed synchronously by the intake API. Step 1 is owned by the coordinator:
/// * `CreateDelivery`:  0) Deposit          -> 1) CreateDelivery   (<Reverted> -> WithdrawPartial)
/// * `CancelDelivery`:  0) CancelDelivery   -> 1) WithdrawPartial
/// * `FinishDelivery`:  0) FinishDelivery   -> 1) WithdrawPartial
/// * `AbortDelivery`:   0) AbortDelivery    -> 1) WithdrawPartial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum ProcessType {
    CreateDelivery,
    CancelDelivery,
    FinishDelivery,
    AbortDelivery,
}

impl Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessType::CreateDelivery => write!(f, "CreateDelivery"),
            ProcessType::CancelDelivery => write!(f, "CancelDelivery"),
            ProcessType::FinishDelivery => write!(f, "FinishDelivery"),
            ProcessType::AbortDelivery => write!(f, "AbortDelivery"),
        }
    }
}

impl FromStr for ProcessType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CreateDelivery" => Ok(Self::CreateDelivery),
            "CancelDelivery" => Ok(Self::CancelDelivery),
            "FinishDelivery" => Ok(Self::FinishDelivery),
            "AbortDelivery" => Ok(Self::AbortDelivery),
            s => Err(ConversionError(format!("Invalid process type: {s}"))),
        }
    }
}

//--------------------------------------   ProcessStatus    ----------------------------------------------------------
/// The overall status of a settlement process. `DoneSuccess`, `DoneFailed` and `Error` are
/// terminal: once set, no field of the row may change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum ProcessStatus {
    /// The coordinator still owns the row and will advance it on the next tick.
    Processing,
    /// All steps completed successfully.
    DoneSuccess,
    /// A step reverted and the compensating withdrawal has landed.
    DoneFailed,
    /// Reserved for administrative intervention. No coordinator pass sets this status.
    Error,
}

impl Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessStatus::Processing => write!(f, "Processing"),
            ProcessStatus::DoneSuccess => write!(f, "DoneSuccess"),
            ProcessStatus::DoneFailed => write!(f, "DoneFailed"),
            ProcessStatus::Error => write!(f, "Error"),
        }
    }
}

impl FromStr for ProcessStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(Self::Processing),
            "DoneSuccess" => Ok(Self::DoneSuccess),
            "DoneFailed" => Ok(Self::DoneFailed),
            "Error" => Ok(Self::Error),
            s => Err(ConversionError(format!("Invalid process status: {s}"))),
        }
    }
}

impl ProcessStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessStatus::Processing)
    }
}

//--------------------------------------   StepTxStatus     ----------------------------------------------------------
/// The status of the latest step transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum StepTxStatus {
    /// The transaction was submitted and is waiting to be mined into the ledger.
    Pending,
    /// The transaction has been confirmed on the ledger.
    Done,
    /// The transaction reverted and a compensating transaction has been submitted.
    Failed,
    /// The transaction reverted and the step must be submitted again from scratch.
    Retry,
}

impl Display for StepTxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepTxStatus::Pending => write!(f, "Pending"),
            StepTxStatus::Done => write!(f, "Done"),
            StepTxStatus::Failed => write!(f, "Failed"),
            StepTxStatus::Retry => write!(f, "Retry"),
        }
    }
}

impl FromStr for StepTxStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Done" => Ok(Self::Done),
            "Failed" => Ok(Self::Failed),
            "Retry" => Ok(Self::Retry),
            s => Err(ConversionError(format!("Invalid step tx status: {s}"))),
        }
    }
}

//--------------------------------------  RevertTxStatus    ----------------------------------------------------------
/// The status of the compensating (revert) transaction. Only ever set after the step transaction
/// has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
pub enum RevertTxStatus {
    Pending,
    Done,
    Failed,
}

impl Display for RevertTxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertTxStatus::Pending => write!(f, "Pending"),
            RevertTxStatus::Done => write!(f, "Done"),
            RevertTxStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for RevertTxStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Done" => Ok(Self::Done),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid revert tx status: {s}"))),
        }
    }
}

//-------------------------------------- SettlementProcess  ----------------------------------------------------------
/// One row per settlement attempt. Rows are never deleted; they form the settlement audit trail.
#[derive(Debug, Clone, FromRow)]
pub struct SettlementProcess {
    pub id: i64,
    /// The issuer/initiator of the settlement. Step and revert transactions are signed with this
    /// party's key.
    pub party_address: Address,
    pub counterparty_address: Address,
    pub agent_address: Address,
    pub token_address: Address,
    /// The DVP ledger contract the settlement runs against.
    pub contract_address: Address,
    pub amount: TokenAmount,
    /// Opaque data carried to the ledger with the create-delivery call.
    pub payload: Option<String>,
    /// The delivery identifier assigned by the ledger on the first step, if any.
    pub delivery_ref: Option<i64>,
    pub process_type: ProcessType,
    pub process_status: ProcessStatus,
    /// 0 or 1. Monotonically non-decreasing.
    pub step: i64,
    pub step_tx_ref: Option<TxRef>,
    pub step_tx_status: Option<StepTxStatus>,
    pub revert_tx_ref: Option<TxRef>,
    pub revert_tx_status: Option<RevertTxStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//-------------------------------------- NewSettlementProcess -------------------------------------------------------
/// The insert payload for a settlement row. The intake API performs step 0 synchronously before
/// creating the record, so new rows always start at `step = 0` with the step transaction `Done`
/// and the process `Processing`.
#[derive(Debug, Clone)]
pub struct NewSettlementProcess {
    pub process_type: ProcessType,
    pub party_address: Address,
    pub counterparty_address: Address,
    pub agent_address: Address,
    pub token_address: Address,
    pub contract_address: Address,
    pub amount: TokenAmount,
    pub payload: Option<String>,
    pub delivery_ref: Option<i64>,
}

impl NewSettlementProcess {
    pub fn new(
        process_type: ProcessType,
        party_address: Address,
        counterparty_address: Address,
        agent_address: Address,
        token_address: Address,
        contract_address: Address,
        amount: TokenAmount,
    ) -> Self {
        Self {
            process_type,
            party_address,
            counterparty_address,
            agent_address,
            token_address,
            contract_address,
            amount,
            payload: None,
            delivery_ref: None,
        }
    }

    pub fn with_payload(mut self, payload: String) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_delivery_ref(mut self, delivery_ref: i64) -> Self {
        self.delivery_ref = Some(delivery_ref);
        self
    }
}

//--------------------------------------   IssuerAccount    ----------------------------------------------------------
/// A registered issuer account. The secret key is held hex-encoded and only revealed when a
/// transaction must be signed.
#[derive(Debug, Clone)]
pub struct IssuerAccount {
    pub address: Address,
    pub secret_key: Secret<String>,
    pub is_deleted: bool,
}

impl IssuerAccount {
    pub fn new<S: Into<String>>(address: Address, secret_key_hex: S) -> Self {
        Self { address, secret_key: Secret::new(secret_key_hex.into()), is_deleted: false }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in
            [ProcessStatus::Processing, ProcessStatus::DoneSuccess, ProcessStatus::DoneFailed, ProcessStatus::Error]
        {
            assert_eq!(status.to_string().parse::<ProcessStatus>().unwrap(), status);
        }
        assert!("Finished".parse::<ProcessStatus>().is_err());
    }

    #[test]
    fn step_tx_status_strings_round_trip() {
        for status in [StepTxStatus::Pending, StepTxStatus::Done, StepTxStatus::Failed, StepTxStatus::Retry] {
            assert_eq!(status.to_string().parse::<StepTxStatus>().unwrap(), status);
        }
        assert!("pending".parse::<StepTxStatus>().is_err());
    }

    #[test]
    fn process_type_strings_round_trip() {
        for ty in [
            ProcessType::CreateDelivery,
            ProcessType::CancelDelivery,
            ProcessType::FinishDelivery,
            ProcessType::AbortDelivery,
        ] {
            assert_eq!(ty.to_string().parse::<ProcessType>().unwrap(), ty);
        }
    }

    #[test]
    fn only_processing_is_non_terminal() {
        assert!(!ProcessStatus::Processing.is_terminal());
        assert!(ProcessStatus::DoneSuccess.is_terminal());
        assert!(ProcessStatus::DoneFailed.is_terminal());
        assert!(ProcessStatus::Error.is_terminal());
    }
}
