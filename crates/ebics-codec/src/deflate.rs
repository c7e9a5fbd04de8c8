//! Raw DEFLATE (RFC 1951) compression, applied by EBICS directly to order
//! data before E002 encryption — no gzip/zlib framing.

use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum DeflateError {
    #[error("compression failed: {0}")]
    Compress(#[source] std::io::Error),
    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
}

pub fn deflate(payload: &[u8]) -> Result<Vec<u8>, DeflateError> {
    let mut encoder = DeflateEncoder::new(payload, Compression::default());
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .map_err(DeflateError::Compress)?;
    Ok(out)
}

pub fn inflate(payload: &[u8]) -> Result<Vec<u8>, DeflateError> {
    let mut decoder = DeflateDecoder::new(payload);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(DeflateError::Decompress)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let payload = b"<xml>some order data, repeated some order data</xml>".repeat(10);
        let compressed = deflate(&payload).unwrap();
        assert!(compressed.len() < payload.len());
        let decompressed = inflate(&compressed).unwrap();
        assert_eq!(decompressed, payload);
    }
}
