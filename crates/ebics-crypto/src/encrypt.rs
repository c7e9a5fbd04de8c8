//! E002: hybrid encryption. The payload is encrypted with a single-use
//! AES-128 key under CBC with a zero IV (EBICS fixes the IV at all-zero
//! bytes; freshness comes from the transaction key, not the IV), and that
//! AES key is itself wrapped with RSA-OAEP under the recipient's encryption
//! key.

use crate::error::CryptoError;
use crate::keys::public_key_fingerprint;
use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const ZERO_IV: [u8; 16] = [0u8; 16];

/// An encrypted order data payload plus the wrapped transaction key, as
/// carried in `DataEncryptionInfo`/`TransactionKey` within the order's
/// `EncryptionPubKeyDigest`.
pub struct EncryptedEnvelope {
    /// The AES-128 transaction key, RSA-OAEP wrapped under the recipient's
    /// encryption public key.
    pub transaction_key: Vec<u8>,
    pub ciphertext: Vec<u8>,
    /// Fingerprint of the encryption public key the transaction key was
    /// wrapped under, so the receiver can pick the right private key.
    pub recipient_digest: [u8; 32],
}

pub fn encrypt_e002(
    payload: &[u8],
    recipient_enc_pub: &RsaPublicKey,
) -> Result<EncryptedEnvelope, CryptoError> {
    let mut rng = rand::thread_rng();
    let mut aes_key = [0u8; 16];
    rng.fill_bytes(&mut aes_key);

    let ciphertext = Aes128CbcEnc::new(&aes_key.into(), &ZERO_IV.into())
        .encrypt_padded_vec_mut::<Pkcs7>(payload);

    let padding = Oaep::new::<Sha256>();
    let transaction_key = recipient_enc_pub
        .encrypt(&mut rng, padding, &aes_key)
        .map_err(CryptoError::Rsa)?;

    Ok(EncryptedEnvelope {
        transaction_key,
        ciphertext,
        recipient_digest: public_key_fingerprint(recipient_enc_pub),
    })
}

pub fn decrypt_e002(
    envelope: &EncryptedEnvelope,
    our_enc_priv: &RsaPrivateKey,
) -> Result<Vec<u8>, CryptoError> {
    let padding = Oaep::new::<Sha256>();
    let aes_key = our_enc_priv
        .decrypt(padding, &envelope.transaction_key)
        .map_err(CryptoError::Rsa)?;
    if aes_key.len() != 16 {
        return Err(CryptoError::Encryption(format!(
            "unwrapped transaction key has wrong length: {}",
            aes_key.len()
        )));
    }

    Aes128CbcDec::new(aes_key.as_slice().into(), &ZERO_IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&envelope.ciphertext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_rsa_keypair;

    #[test]
    fn round_trips_through_aes_and_rsa_oaep() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let payload = b"camt.053 statement bytes, compressed";
        let envelope = encrypt_e002(payload, &pair.public).unwrap();
        let recovered = decrypt_e002(&envelope, &pair.private).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn records_recipient_fingerprint() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let envelope = encrypt_e002(b"x", &pair.public).unwrap();
        assert_eq!(envelope.recipient_digest, public_key_fingerprint(&pair.public));
    }

    #[test]
    fn decrypt_fails_with_wrong_private_key() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let other = generate_rsa_keypair(2048).unwrap();
        let envelope = encrypt_e002(b"payload", &pair.public).unwrap();
        assert!(decrypt_e002(&envelope, &other.private).is_err());
    }
}
