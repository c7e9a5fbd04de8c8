#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    #[error("{0}")]
    Destruction(#[from] ebics_codec::xml::DestructionError),
    #[error("unsupported document root element {0:?}; expected a camt.05x Document")]
    UnsupportedRoot(String),
    #[error("amount {0:?} is not a valid decimal")]
    BadAmount(String),
}
