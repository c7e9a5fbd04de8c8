//! ISO 20022 statement parsing (camt.052/053/054) and credit-transfer
//! generation (pain.001), the two document shapes this gateway exchanges
//! with a bank once EBICS has moved the bytes.

pub mod credit_transfer;
pub mod error;
pub mod statement;

pub use credit_transfer::{build_pain001, CreditTransferRequest};
pub use error::StatementError;
pub use statement::{parse_statement, CreditDebitIndicator, Entry, EntryStatus, Party, TransactionDetail};
