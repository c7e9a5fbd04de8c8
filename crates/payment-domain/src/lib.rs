//! The Taler-side payment domain model: fixed-precision amounts, payto
//! URIs, IBAN validation, subject-line reserve-pub/WTID extraction, and
//! the Taler wire-format timestamp.

pub mod amount;
pub mod error;
pub mod iban;
pub mod payto;
pub mod subject;
pub mod timestamp;

pub use amount::TalerAmount;
pub use error::DomainError;
pub use iban::Iban;
pub use payto::Payto;
pub use subject::{extract_reserve_pub, parse_wtid_and_url};
pub use timestamp::TalerTimestamp;
