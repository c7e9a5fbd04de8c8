//! A006: PKCS#1 v1.5 RSA signature over a SHA-256 digest.

use crate::error::CryptoError;
use rsa::Pkcs1v15Sign;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// `digest_ebics_order_A006`: SHA-256 over the payload bytes verbatim.
/// Canonicalisation (for the XML-DSig authentication layer) happens one
/// layer up, in `ebics-protocol`; this is the plain content digest used for
/// the `UserSignatureData` payload signature.
pub fn digest_ebics_order_a006(payload: &[u8]) -> [u8; 32] {
    Sha256::digest(payload).into()
}

/// Signs a precomputed digest with the subscriber's signature key.
pub fn sign_a006(digest: &[u8; 32], sig_priv: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    let padding = Pkcs1v15Sign::new::<Sha256>();
    sig_priv
        .sign(padding, digest)
        .map_err(CryptoError::Rsa)
}

/// Verifies an A006 signature, returning `false` (not an error) on a
/// mismatched signature, matching invariant 7 of the specification.
pub fn verify_a006(
    digest: &[u8; 32],
    signature: &[u8],
    sig_pub: &RsaPublicKey,
) -> Result<bool, CryptoError> {
    let padding = Pkcs1v15Sign::new::<Sha256>();
    match sig_pub.verify(padding, digest, signature) {
        Ok(()) => Ok(true),
        Err(rsa::Error::Verification) => Ok(false),
        Err(other) => Err(CryptoError::Rsa(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_rsa_keypair;

    #[test]
    fn sign_then_verify_succeeds_with_matching_key() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let digest = digest_ebics_order_a006(b"pain.001 document bytes");
        let signature = sign_a006(&digest, &pair.private).unwrap();
        assert!(verify_a006(&digest, &signature, &pair.public).unwrap());
    }

    #[test]
    fn verify_fails_with_other_key() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let other = generate_rsa_keypair(2048).unwrap();
        let digest = digest_ebics_order_a006(b"payload");
        let signature = sign_a006(&digest, &pair.private).unwrap();
        assert!(!verify_a006(&digest, &signature, &other.public).unwrap());
    }
}
