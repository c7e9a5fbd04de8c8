use crate::return_code::EbicsReturnCode;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("xml build error: {0}")]
    Build(#[from] ebics_codec::xml::XmlBuildError),
    #[error("xml destructuring error: {0}")]
    Destruction(#[from] ebics_codec::xml::DestructionError),
    #[error("crypto error: {0}")]
    Crypto(#[from] ebics_crypto::CryptoError),
    #[error("deflate error: {0}")]
    Deflate(#[from] ebics_codec::deflate::DeflateError),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("{0} returned by the bank")]
    BankReturnCode(EbicsReturnCode),
    #[error("AuthSignature element not found under the document root")]
    MissingAuthSignature,
    #[error("authentication signature did not validate")]
    AuthenticationFailed,
    #[error("no locally held key matches the bank's recipient digest")]
    UnknownRecipientDigest,
    #[error("key file is malformed: {0}")]
    MalformedKeyFile(String),
    #[error("key file passphrase was rejected")]
    WrongPassphrase,
    #[error("subscriber is in state {state:?}, which cannot {attempted}")]
    WrongSubscriberState {
        state: crate::subscriber::KeyManagementState,
        attempted: &'static str,
    },
    #[error("segment {expected} expected but bank requested recovery at {got}")]
    SegmentOutOfOrder { expected: u32, got: u32 },
    #[error("transport error: {0}")]
    Transport(String),
}
