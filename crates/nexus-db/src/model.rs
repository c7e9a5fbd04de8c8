//! Row types for the five persisted entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "initiation_state", rename_all = "lowercase")]
pub enum InitiationState {
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub subject: String,
    pub credit_payto: String,
    pub initiation_time: DateTime<Utc>,
    pub request_uid: String,
    pub state: InitiationState,
    pub message_id: Option<String>,
    pub end_to_end_id: Option<String>,
    pub confirmation_tx: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewInitiatedPayment {
    pub amount: Decimal,
    pub currency: String,
    pub subject: String,
    pub credit_payto: String,
    pub request_uid: String,
}

#[derive(Debug, Clone)]
pub struct IncomingPayment {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub debit_payto: String,
    pub subject: String,
    pub execution_time: DateTime<Utc>,
    pub bank_id: String,
    pub reserve_pub: Option<String>,
    pub refunded: bool,
}

#[derive(Debug, Clone)]
pub struct NewIncomingPayment {
    pub amount: Decimal,
    pub currency: String,
    pub debit_payto: String,
    pub subject: String,
    pub execution_time: DateTime<Utc>,
    pub bank_id: String,
    pub reserve_pub: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OutgoingPayment {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub credit_payto: String,
    pub subject: String,
    pub execution_time: DateTime<Utc>,
    pub bank_id: String,
    pub wtid: Option<String>,
    pub exchange_base_url: Option<String>,
    pub initiated_payment: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewOutgoingPayment {
    pub amount: Decimal,
    pub currency: String,
    pub credit_payto: String,
    pub subject: String,
    pub execution_time: DateTime<Utc>,
    pub bank_id: String,
    pub wtid: Option<String>,
    pub exchange_base_url: Option<String>,
}

/// `record_if_new` reports whether the `bank_id` was already known, since
/// the fetcher needs to know whether to run subject-metadata extraction
/// and notify, or skip a row it has already processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome<T> {
    Created(T),
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "bank_message_code", rename_all = "UPPERCASE")]
pub enum BankMessageCode {
    C52,
    C53,
    C54,
}

#[derive(Debug, Clone)]
pub struct BankMessage {
    pub id: i64,
    pub subscriber_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub code: BankMessageCode,
    pub content: Vec<u8>,
    pub processed: bool,
    pub errors: bool,
}
