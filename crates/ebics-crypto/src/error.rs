#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("malformed key material: {0}")]
    MalformedKey(String),
    #[error("recipient public key digest does not match any of our keys")]
    UnknownRecipient,
    #[error("RSA operation failed: {0}")]
    Rsa(#[from] rsa::Error),
    #[error("symmetric encryption failed: {0}")]
    Encryption(String),
}
