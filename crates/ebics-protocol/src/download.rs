//! Download (fetch) state machine: init → transfer(1..N) → receipt.

use crate::error::ProtocolError;
use crate::return_code::EbicsReturnCode;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ebics_crypto::{decrypt_e002, public_key_fingerprint, EncryptedEnvelope};
use rsa::RsaPrivateKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPhase {
    Init,
    Transfer { next_segment: u32, total_segments: u32 },
    Receipt,
}

/// The outcome of an init request: either there is data to fetch, or the
/// bank told us there's nothing new.
pub enum InitOutcome {
    Data {
        phase: DownloadPhase,
        first_segment: String,
        transaction_key: Vec<u8>,
        recipient_digest: [u8; 32],
    },
    NoDataAvailable,
}

pub fn handle_init_response(
    return_code: EbicsReturnCode,
    total_segments: u32,
    first_segment: String,
    transaction_key: Vec<u8>,
    recipient_digest: [u8; 32],
) -> Result<InitOutcome, ProtocolError> {
    if return_code == EbicsReturnCode::NoDownloadDataAvailable {
        return Ok(InitOutcome::NoDataAvailable);
    }
    if !return_code.is_ok() {
        return Err(ProtocolError::BankReturnCode(return_code));
    }
    let phase = if total_segments <= 1 {
        DownloadPhase::Receipt
    } else {
        DownloadPhase::Transfer {
            next_segment: 2,
            total_segments,
        }
    };
    Ok(InitOutcome::Data {
        phase,
        first_segment,
        transaction_key,
        recipient_digest,
    })
}

pub fn advance_transfer(current: DownloadPhase) -> DownloadPhase {
    match current {
        DownloadPhase::Transfer {
            next_segment,
            total_segments,
        } => {
            if next_segment >= total_segments {
                DownloadPhase::Receipt
            } else {
                DownloadPhase::Transfer {
                    next_segment: next_segment + 1,
                    total_segments,
                }
            }
        }
        other => other,
    }
}

/// Concatenates the collected base64 segments, decrypts (matching
/// `recipient_digest` against our own key fingerprints to pick the right
/// private key), and inflates back to the plaintext order data.
pub fn finish_download(
    segments: &[String],
    transaction_key: Vec<u8>,
    recipient_digest: [u8; 32],
    our_keys: &[(&'static str, &RsaPrivateKey)],
) -> Result<Vec<u8>, ProtocolError> {
    let our_priv = our_keys
        .iter()
        .find(|(_, k)| public_key_fingerprint(&rsa::RsaPublicKey::from(*k)) == recipient_digest)
        .map(|(_, k)| *k)
        .ok_or(ProtocolError::UnknownRecipientDigest)?;

    let joined: String = segments.concat();
    let ciphertext = B64.decode(joined).map_err(ProtocolError::Base64)?;

    let envelope = EncryptedEnvelope {
        transaction_key,
        ciphertext,
        recipient_digest,
    };
    let compressed = decrypt_e002(&envelope, our_priv)?;
    Ok(ebics_codec::deflate::inflate(&compressed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_crypto::{encrypt_e002, generate_rsa_keypair};

    #[test]
    fn no_data_available_short_circuits() {
        let outcome = handle_init_response(
            EbicsReturnCode::NoDownloadDataAvailable,
            0,
            String::new(),
            Vec::new(),
            [0u8; 32],
        )
        .unwrap();
        assert!(matches!(outcome, InitOutcome::NoDataAvailable));
    }

    #[test]
    fn single_segment_goes_straight_to_receipt() {
        let outcome = handle_init_response(
            EbicsReturnCode::Ok,
            1,
            "c2VnbWVudA==".to_string(),
            vec![1, 2, 3],
            [0u8; 32],
        )
        .unwrap();
        match outcome {
            InitOutcome::Data { phase, .. } => assert_eq!(phase, DownloadPhase::Receipt),
            _ => panic!("expected data"),
        }
    }

    #[test]
    fn finish_download_round_trips() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let plaintext = b"camt.053 statement";
        let compressed = ebics_codec::deflate::deflate(plaintext).unwrap();
        let envelope = encrypt_e002(&compressed, &pair.public).unwrap();
        let encoded = B64.encode(&envelope.ciphertext);

        let result = finish_download(
            &[encoded],
            envelope.transaction_key,
            envelope.recipient_digest,
            &[("default", &pair.private)],
        )
        .unwrap();
        assert_eq!(result, plaintext);
    }
}
