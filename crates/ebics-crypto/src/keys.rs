//! RSA key generation/loading and the EBICS public-key fingerprint.

use crate::error::CryptoError;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// An RSA key pair as used for one of the three EBICS key roles
/// (authentication/X002, encryption/E002, signature/A006).
#[derive(Clone)]
pub struct KeyPair {
    pub public: RsaPublicKey,
    pub private: RsaPrivateKey,
}

/// Generates a fresh RSA key pair. EBICS conventionally uses 2048-bit keys.
pub fn generate_rsa_keypair(bits: usize) -> Result<KeyPair, CryptoError> {
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, bits).map_err(CryptoError::Rsa)?;
    let public = RsaPublicKey::from(&private);
    Ok(KeyPair { public, private })
}

/// Canonicalises a big-endian integer as EBICS expects: strip leading zero
/// bytes, hex-encode upper-case, and left-pad with a single `0` if the hex
/// representation has an odd digit count.
fn canonical_hex(bytes: &[u8]) -> String {
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let trimmed = &bytes[first_nonzero..];
    let mut hex_str = hex::encode_upper(trimmed);
    if hex_str.len() % 2 != 0 {
        hex_str.insert(0, '0');
    }
    hex_str
}

/// The 32-byte SHA-256 fingerprint of a public key, computed over the
/// canonical `"<exp hex> <mod hex>"` representation EBICS uses for the
/// key-management letters and for matching `DataEncryptionInfo` digests to
/// locally held keys.
pub fn public_key_fingerprint(pub_key: &RsaPublicKey) -> [u8; 32] {
    let exponent_hex = canonical_hex(&pub_key.e().to_bytes_be());
    let modulus_hex = canonical_hex(&pub_key.n().to_bytes_be());
    let canonical = format!("{exponent_hex} {modulus_hex}");
    Sha256::digest(canonical.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let a = public_key_fingerprint(&pair.public);
        let b = public_key_fingerprint(&pair.public);
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_hex_pads_to_even_length() {
        assert_eq!(canonical_hex(&[0x0, 0x0, 0x1, 0x23]), "0123");
        assert_eq!(canonical_hex(&[0x01]), "01");
        assert_eq!(canonical_hex(&[0x00]), "00");
    }
}
