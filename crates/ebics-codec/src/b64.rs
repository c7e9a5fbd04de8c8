//! Thin base64 newtype wrapper, used for EBICS order-data chunking and for
//! embedding binary fields (signatures, transaction keys) in XML text nodes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use std::borrow::Cow;
use std::fmt::Display;

/// Bytes that are (or will be) base64-encoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Text<'a>(pub Cow<'a, str>);

impl Base64Text<'_> {
    /// Decodes the wrapped base64 text into raw binary.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        B64.decode(self.0.as_bytes())
    }

    /// Encodes raw binary into a new owned `Base64Text`.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Text<'static> {
        Base64Text(Cow::Owned(B64.encode(input.as_ref())))
    }
}

impl AsRef<str> for Base64Text<'_> {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl<'a> From<&'a str> for Base64Text<'a> {
    fn from(s: &'a str) -> Self {
        Base64Text(Cow::Borrowed(s))
    }
}

impl Display for Base64Text<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits base64 text into chunks of at most `max_len` characters, the way
/// the upload state machine segments order data for the EBICS `1..N` wire
/// protocol. Chunk boundaries never split a byte since this operates on the
/// already-encoded base64 string.
pub fn chunk(encoded: &str, max_len: usize) -> Vec<&str> {
    if max_len == 0 {
        return vec![encoded];
    }
    encoded
        .as_bytes()
        .chunks(max_len)
        .map(|c| std::str::from_utf8(c).expect("base64 text is ASCII"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let text = Base64Text::encode(b"hello world");
        assert_eq!(text.decode().unwrap(), b"hello world");
    }

    #[test]
    fn chunk_reassembles() {
        let text = Base64Text::encode(vec![42u8; 5000]);
        let parts = chunk(text.as_ref(), 1024);
        assert!(parts.len() > 1);
        let joined: String = parts.concat();
        assert_eq!(joined, text.0);
    }
}
