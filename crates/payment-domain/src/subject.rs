//! Subject-line metadata extraction: reserve public keys on incoming
//! payments, and wire-transfer IDs + exchange URLs on outgoing payments.

use ebics_codec::{CrockfordError, HashCode32};
use regex::Regex;
use std::sync::OnceLock;

fn reserve_pub_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-Za-z0-9]{52}\b").unwrap())
}

/// Looks for a 52-character Base32-Crockford token in the whitespace-
/// normalised subject and decodes it as a reserve public key. Returns
/// `None` (rather than an error) on no match or a malformed match — both
/// cases mean "this is not a reservable incoming payment, schedule a
/// refund".
pub fn extract_reserve_pub(subject: &str) -> Option<HashCode32> {
    let normalized = normalize_whitespace(subject);
    let candidate = reserve_pub_pattern().find(&normalized)?;
    HashCode32::parse(candidate.as_str()).ok()
}

/// Splits an outgoing payment's subject at the first space into a WTID
/// (32-byte hash code) and the exchange's base URL.
pub fn parse_wtid_and_url(subject: &str) -> Result<(HashCode32, url::Url), CrockfordError> {
    let (wtid_part, url_part) = subject
        .split_once(' ')
        .ok_or(CrockfordError::WrongLength {
            expected: 52,
            actual: 0,
        })?;
    let wtid = HashCode32::parse(wtid_part)?;
    let url = url::Url::parse(url_part.trim())
        .map_err(|_| CrockfordError::WrongLength { expected: 52, actual: 0 })?;
    Ok((wtid, url))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_reserve_pub_from_subject() {
        let token = ebics_codec::HashCode32([7u8; 32]).to_string();
        assert_eq!(token.len(), 52);
        let subject = format!("deposit for {token} thanks");
        let extracted = extract_reserve_pub(&subject).unwrap();
        assert_eq!(extracted.to_string(), token);
    }

    #[test]
    fn no_token_yields_none() {
        assert!(extract_reserve_pub("just a regular transfer").is_none());
    }

    #[test]
    fn parses_wtid_and_trailing_url() {
        let token = ebics_codec::HashCode32([7u8; 32]).to_string();
        let subject = format!("{token} https://exchange.example.com/");
        let (wtid, url) = parse_wtid_and_url(&subject).unwrap();
        assert_eq!(wtid.to_string(), token);
        assert_eq!(url.as_str(), "https://exchange.example.com/");
    }

    #[test]
    fn malformed_subject_fails() {
        assert!(parse_wtid_and_url("not-a-valid-subject").is_err());
    }
}
