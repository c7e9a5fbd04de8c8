//! Signs and verifies the `AuthSignature` element of an EBICS request or
//! response: the whole-message authentication signature over every element
//! carrying `authenticate="true"`.
//!
//! The signed children (`ds:SignedInfo`, `ds:SignatureValue`) are inlined
//! directly into `AuthSignature` on the wire rather than wrapped in a
//! `ds:Signature` element; verification clones the parsed document and
//! rewraps those same children into a synthetic `ds:Signature` so the
//! digest/signature check below has a uniform shape to work from.

use crate::canonical::canonicalize_authenticated;
use crate::error::ProtocolError;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ebics_crypto::{sign_a006, verify_a006};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

pub const C14N_ALGORITHM: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
pub const SIGNATURE_ALGORITHM: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const DIGEST_ALGORITHM: &str = "http://www.w3.org/2000/09/xmldsig#sha256";

/// The values that go inside `AuthSignature` once a document has been
/// signed: everything needed to reconstruct the `ds:SignedInfo`/
/// `ds:SignatureValue` pair on the wire.
pub struct AuthSignatureValues {
    pub digest_value: String,
    pub signature_value: String,
}

/// Computes the canonical digest of the `authenticate="true"` node-set of
/// an already-built (but not yet signed) document, and signs it.
pub fn sign_document(
    xml: &[u8],
    auth_priv: &RsaPrivateKey,
) -> Result<AuthSignatureValues, ProtocolError> {
    let doc = roxmltree::Document::parse(std::str::from_utf8(xml).map_err(|e| {
        ProtocolError::MalformedKeyFile(format!("document is not valid UTF-8: {e}"))
    })?)
    .map_err(ebics_codec::xml::DestructionError::from)?;
    let canonical = canonicalize_authenticated(doc.root_element());
    let digest: [u8; 32] = Sha256::digest(canonical.as_bytes()).into();
    let signature = sign_a006(&digest, auth_priv)?;
    Ok(AuthSignatureValues {
        digest_value: B64.encode(digest),
        signature_value: B64.encode(signature),
    })
}

/// Verifies a received document's `AuthSignature` against the digest of its
/// own `authenticate="true"` node-set, using the bank or subscriber
/// authentication public key referenced by the message.
pub fn verify_document(
    xml: &[u8],
    digest_value_b64: &str,
    signature_value_b64: &str,
    auth_pub: &RsaPublicKey,
) -> Result<bool, ProtocolError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| ProtocolError::MalformedKeyFile(format!("document is not valid UTF-8: {e}")))?;
    let doc = roxmltree::Document::parse(text).map_err(ebics_codec::xml::DestructionError::from)?;
    let canonical = canonicalize_authenticated(doc.root_element());
    let expected_digest: [u8; 32] = Sha256::digest(canonical.as_bytes()).into();

    let claimed_digest = B64
        .decode(digest_value_b64)
        .map_err(ProtocolError::Base64)?;
    if claimed_digest != expected_digest {
        return Ok(false);
    }

    let signature = B64
        .decode(signature_value_b64)
        .map_err(ProtocolError::Base64)?;
    Ok(verify_a006(&expected_digest, &signature, auth_pub)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_crypto::generate_rsa_keypair;

    #[test]
    fn sign_then_verify_round_trips() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let xml = br#"<ebicsRequest><header authenticate="true"><Nonce>abc</Nonce></header><AuthSignature/></ebicsRequest>"#;
        let values = sign_document(xml, &pair.private).unwrap();
        let ok = verify_document(
            xml,
            &values.digest_value,
            &values.signature_value,
            &pair.public,
        )
        .unwrap();
        assert!(ok);
    }

    #[test]
    fn tampering_with_authenticated_content_fails_verification() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let original = br#"<ebicsRequest><header authenticate="true"><Nonce>abc</Nonce></header><AuthSignature/></ebicsRequest>"#;
        let values = sign_document(original, &pair.private).unwrap();
        let tampered = br#"<ebicsRequest><header authenticate="true"><Nonce>xyz</Nonce></header><AuthSignature/></ebicsRequest>"#;
        let ok = verify_document(
            tampered,
            &values.digest_value,
            &values.signature_value,
            &pair.public,
        )
        .unwrap();
        assert!(!ok);
    }

    #[test]
    fn wrong_key_fails_verification() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let other = generate_rsa_keypair(2048).unwrap();
        let xml = br#"<ebicsRequest><header authenticate="true"><Nonce>abc</Nonce></header><AuthSignature/></ebicsRequest>"#;
        let values = sign_document(xml, &pair.private).unwrap();
        let ok = verify_document(
            xml,
            &values.digest_value,
            &values.signature_value,
            &other.public,
        )
        .unwrap();
        assert!(!ok);
    }
}
