//! Upload (file submit) state machine: init → transfer(1..N) → done.

use crate::backoff::DecorrelatedJitter;
use crate::error::ProtocolError;
use crate::return_code::EbicsReturnCode;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ebics_codec::{b64, deflate};
use ebics_crypto::{digest_ebics_order_a006, encrypt_e002, sign_a006, EncryptedEnvelope};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Segments are capped at 1 MiB of base64 text per EBICS convention.
pub const MAX_SEGMENT_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Init,
    Transfer { next_segment: u32, total_segments: u32 },
    Done,
}

/// Prepared ciphertext plus signature payload for an upload, segmented for
/// transfer. Construction (compress, encrypt, sign, chunk) happens once in
/// [`prepare_upload`]; the rest of this module only walks the resulting
/// segments against the bank's replies.
pub struct PreparedUpload {
    pub order_data_segments: Vec<String>,
    pub signature_envelope: EncryptedEnvelope,
    pub signature_value: Vec<u8>,
    pub order_data_envelope_key: EncryptedEnvelope,
}

/// Compresses, E002-encrypts and base64-segments the plaintext order data
/// (a pain.001 document), and produces the A006 signature over the
/// plaintext's digest, itself compressed and encrypted the same way.
pub fn prepare_upload(
    plaintext_order_data: &[u8],
    recipient_enc_pub: &RsaPublicKey,
    sig_priv: &RsaPrivateKey,
) -> Result<PreparedUpload, ProtocolError> {
    let compressed = deflate::deflate(plaintext_order_data)?;
    let envelope = encrypt_e002(&compressed, recipient_enc_pub)?;
    let encoded = B64.encode(&envelope.ciphertext);
    let segments: Vec<String> = b64::chunk(&encoded, MAX_SEGMENT_LEN)
        .into_iter()
        .map(str::to_string)
        .collect();

    let digest = digest_ebics_order_a006(plaintext_order_data);
    let signature_value = sign_a006(&digest, sig_priv)?;

    Ok(PreparedUpload {
        order_data_segments: segments,
        signature_envelope: encrypt_e002(&signature_value, recipient_enc_pub)?,
        signature_value,
        order_data_envelope_key: envelope,
    })
}

/// Drives the upload transaction's phase transitions in response to the
/// bank's return code for the segment just sent. Returns the next phase,
/// or an error if the bank rejected the transaction outright.
pub fn advance(
    current: UploadPhase,
    bank_return_code: EbicsReturnCode,
    backoff: &mut DecorrelatedJitter,
) -> Result<UploadPhase, ProtocolError> {
    if bank_return_code.is_retriable() {
        backoff.next_delay();
        return Ok(current);
    }
    if !bank_return_code.is_ok() {
        return Err(ProtocolError::BankReturnCode(bank_return_code));
    }
    backoff.reset();

    Ok(match current {
        UploadPhase::Init => UploadPhase::Transfer {
            next_segment: 2,
            total_segments: u32::MAX, // caller substitutes the real NumSegments from the init response
        },
        UploadPhase::Transfer {
            next_segment,
            total_segments,
        } => {
            if next_segment > total_segments {
                UploadPhase::Done
            } else {
                UploadPhase::Transfer {
                    next_segment: next_segment + 1,
                    total_segments,
                }
            }
        }
        UploadPhase::Done => UploadPhase::Done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::BackoffConfig;
    use ebics_crypto::generate_rsa_keypair;

    #[test]
    fn prepare_upload_produces_segments_and_signature() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let prepared = prepare_upload(b"<Document>pain.001</Document>", &pair.public, &pair.private)
            .unwrap();
        assert!(!prepared.order_data_segments.is_empty());
        assert!(!prepared.signature_value.is_empty());
    }

    #[test]
    fn recovery_sync_retries_without_advancing() {
        let mut backoff = DecorrelatedJitter::new(BackoffConfig::default());
        let phase = UploadPhase::Transfer {
            next_segment: 2,
            total_segments: 3,
        };
        let next = advance(phase.clone(), EbicsReturnCode::TxRecoverySync, &mut backoff).unwrap();
        assert_eq!(next, phase);
    }

    #[test]
    fn last_segment_transitions_to_done() {
        let mut backoff = DecorrelatedJitter::new(BackoffConfig::default());
        let phase = UploadPhase::Transfer {
            next_segment: 4,
            total_segments: 3,
        };
        let next = advance(phase, EbicsReturnCode::Ok, &mut backoff).unwrap();
        assert_eq!(next, UploadPhase::Done);
    }

    #[test]
    fn non_ok_non_retriable_code_aborts() {
        let mut backoff = DecorrelatedJitter::new(BackoffConfig::default());
        let phase = UploadPhase::Init;
        let err = advance(phase, EbicsReturnCode::AmountCheckFailed, &mut backoff).unwrap_err();
        assert!(matches!(err, ProtocolError::BankReturnCode(_)));
    }
}
