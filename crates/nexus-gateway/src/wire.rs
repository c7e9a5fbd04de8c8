//! JSON wire types for the five endpoints. Amounts and hash codes travel
//! as their canonical text forms (`CUR:V[.FFFFFFFF]`, Base32-Crockford) —
//! plain `String` fields here, parsed/validated in the handler, the same
//! division the teacher draws between `src/types.rs`'s wire structs and
//! the scheme handlers that interpret them.

use payment_domain::TalerTimestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub request_uid: String,
    pub amount: String,
    pub exchange_base_url: String,
    pub wtid: String,
    pub credit_account: String,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub timestamp: TalerTimestamp,
    pub row_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddIncomingRequest {
    pub amount: String,
    pub reserve_pub: String,
    pub debit_account: String,
}

#[derive(Debug, Serialize)]
pub struct AddIncomingResponse {
    pub timestamp: TalerTimestamp,
    pub row_id: i64,
}

#[derive(Debug, Serialize)]
pub struct IncomingHistory {
    pub incoming_transactions: Vec<IncomingReserveTransaction>,
    pub credit_account: String,
}

#[derive(Debug, Serialize)]
pub struct OutgoingHistory {
    pub outgoing_transactions: Vec<OutgoingTransaction>,
    pub debit_account: String,
}

#[derive(Debug, Serialize)]
pub struct IncomingReserveTransaction {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub row_id: i64,
    pub date: TalerTimestamp,
    pub amount: String,
    pub debit_account: String,
    pub reserve_pub: String,
}

#[derive(Debug, Serialize)]
pub struct OutgoingTransaction {
    pub row_id: i64,
    pub date: TalerTimestamp,
    pub amount: String,
    pub credit_account: String,
    pub wtid: String,
    pub exchange_base_url: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub version: &'static str,
    pub name: &'static str,
    pub currency: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    pub delta: Option<i64>,
    pub start: Option<i64>,
    pub long_poll_ms: Option<u64>,
}
