#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("amount fraction {0} is not less than 10^8")]
    FractionOutOfRange(u32),
    #[error("amount value {0} exceeds 2^52")]
    ValueOutOfRange(u64),
    #[error("{0:?} is not a valid amount")]
    MalformedAmount(String),
    #[error("currency {0:?} must be 1-11 uppercase letters")]
    InvalidCurrency(String),
    #[error("{0:?} is not a valid payto URI")]
    MalformedPayto(String),
    #[error("IBAN {0:?} failed the mod-97 check")]
    InvalidIban(String),
}
