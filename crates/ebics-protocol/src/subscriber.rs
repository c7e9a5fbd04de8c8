//! Subscriber key lifecycle: the INI/HIA/HPB key-management state machine
//! and the sealed key file that holds the subscriber's three RSA key pairs
//! plus the bank's public keys once HPB has returned them.

use crate::dialect::Dialect;
use crate::error::ProtocolError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use ebics_crypto::KeyPair;
use rand::RngCore;
use rsa::RsaPublicKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};

/// Where a subscriber is in the INI/HIA/HPB key-management handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagementState {
    Fresh,
    IniSent,
    HiaSent,
    KeysLetterPrinted,
    HpbReceived,
    Ready,
}

impl KeyManagementState {
    pub fn send_ini(self) -> Result<KeyManagementState, ProtocolError> {
        match self {
            KeyManagementState::Fresh => Ok(KeyManagementState::IniSent),
            other => Err(ProtocolError::WrongSubscriberState {
                state: other,
                attempted: "send INI",
            }),
        }
    }

    pub fn send_hia(self) -> Result<KeyManagementState, ProtocolError> {
        match self {
            KeyManagementState::IniSent => Ok(KeyManagementState::HiaSent),
            other => Err(ProtocolError::WrongSubscriberState {
                state: other,
                attempted: "send HIA",
            }),
        }
    }

    pub fn letter_printed(self) -> Result<KeyManagementState, ProtocolError> {
        match self {
            KeyManagementState::HiaSent => Ok(KeyManagementState::KeysLetterPrinted),
            other => Err(ProtocolError::WrongSubscriberState {
                state: other,
                attempted: "print keys letter",
            }),
        }
    }

    pub fn receive_hpb(self) -> Result<KeyManagementState, ProtocolError> {
        match self {
            KeyManagementState::KeysLetterPrinted => Ok(KeyManagementState::HpbReceived),
            other => Err(ProtocolError::WrongSubscriberState {
                state: other,
                attempted: "receive HPB",
            }),
        }
    }

    /// `HPB_RECEIVED` and `READY` are, for our purposes, the same usable
    /// state; `Ready` is reached once the bank keys have also been
    /// persisted, which the caller records separately.
    pub fn mark_ready(self) -> Result<KeyManagementState, ProtocolError> {
        match self {
            KeyManagementState::HpbReceived => Ok(KeyManagementState::Ready),
            other => Err(ProtocolError::WrongSubscriberState {
                state: other,
                attempted: "mark ready",
            }),
        }
    }

    pub fn can_transact(self) -> bool {
        matches!(self, KeyManagementState::Ready)
    }
}

/// The bank's public keys, captured from a successful HPB response.
#[derive(Clone)]
pub struct BankKeys {
    pub authentication: RsaPublicKey,
    pub encryption: RsaPublicKey,
}

/// The full local record for one EBICS subscriber: our three key pairs,
/// the handshake state, and the bank's keys once known.
#[derive(Clone)]
pub struct Subscriber {
    pub dialect: Dialect,
    pub signature_keys: KeyPair,
    pub authentication_keys: KeyPair,
    pub encryption_keys: KeyPair,
    pub state: KeyManagementState,
    pub bank_keys: Option<BankKeys>,
}

impl Subscriber {
    pub fn new_fresh(dialect: Dialect) -> Result<Subscriber, ProtocolError> {
        Ok(Subscriber {
            dialect,
            signature_keys: ebics_crypto::generate_rsa_keypair(2048)?,
            authentication_keys: ebics_crypto::generate_rsa_keypair(2048)?,
            encryption_keys: ebics_crypto::generate_rsa_keypair(2048)?,
            state: KeyManagementState::Fresh,
            bank_keys: None,
        })
    }
}

/// A serialisable, passphrase-sealed on-disk representation of a
/// [`Subscriber`]. Private keys are PKCS#8 DER, AES-256-GCM sealed under a
/// key derived from the passphrase with Argon2id; public material (our own
/// public keys and, once known, the bank's) is kept in the clear alongside
/// the sealed blob since it isn't secret.
pub struct SealedKeyFile {
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

fn derive_key(passphrase: &str, salt: &[u8; 16]) -> Result<[u8; 32], ProtocolError> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| ProtocolError::MalformedKeyFile(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Seals the three private keys (DER, concatenated with length prefixes)
/// under `passphrase`.
pub fn seal(subscriber: &Subscriber, passphrase: &str) -> Result<SealedKeyFile, ProtocolError> {
    let mut plaintext = Vec::new();
    for key in [
        &subscriber.signature_keys.private,
        &subscriber.authentication_keys.private,
        &subscriber.encryption_keys.private,
    ] {
        let der = key
            .to_pkcs8_der()
            .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))?;
        let bytes = der.as_bytes();
        plaintext.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        plaintext.extend_from_slice(bytes);
    }

    let mut rng = rand::thread_rng();
    let mut salt = [0u8; 16];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; 12];
    rng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))?;

    Ok(SealedKeyFile {
        salt,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Unseals a key file, reconstructing the three private keys. Wrong
/// passphrase surfaces as [`ProtocolError::WrongPassphrase`] rather than a
/// generic crypto error, since it's the one a caller needs to act on
/// differently (re-prompt rather than abort).
pub fn unseal(
    sealed: &SealedKeyFile,
    passphrase: &str,
    dialect: Dialect,
    state: KeyManagementState,
    bank_keys: Option<BankKeys>,
) -> Result<Subscriber, ProtocolError> {
    let key = derive_key(passphrase, &sealed.salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| ProtocolError::WrongPassphrase)?;

    let mut cursor = &plaintext[..];
    let mut next_key = || -> Result<KeyPair, ProtocolError> {
        if cursor.len() < 4 {
            return Err(ProtocolError::MalformedKeyFile("truncated key file".into()));
        }
        let len = u32::from_be_bytes(cursor[..4].try_into().unwrap()) as usize;
        cursor = &cursor[4..];
        if cursor.len() < len {
            return Err(ProtocolError::MalformedKeyFile("truncated key file".into()));
        }
        let der = &cursor[..len];
        cursor = &cursor[len..];
        let private = rsa::RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))?;
        let public = rsa::RsaPublicKey::from(&private);
        Ok(KeyPair { public, private })
    };

    let signature_keys = next_key()?;
    let authentication_keys = next_key()?;
    let encryption_keys = next_key()?;

    Ok(Subscriber {
        dialect,
        signature_keys,
        authentication_keys,
        encryption_keys,
        state,
        bank_keys,
    })
}

/// Encodes a public key as PKCS#8 PEM, the form EBICS key letters print.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, ProtocolError> {
    key.to_public_key_pem(rsa::pkcs8::LineEnding::LF)
        .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_management_state_follows_the_happy_path() {
        let s = KeyManagementState::Fresh;
        let s = s.send_ini().unwrap();
        assert_eq!(s, KeyManagementState::IniSent);
        let s = s.send_hia().unwrap();
        assert_eq!(s, KeyManagementState::HiaSent);
        let s = s.letter_printed().unwrap();
        assert_eq!(s, KeyManagementState::KeysLetterPrinted);
        let s = s.receive_hpb().unwrap();
        assert_eq!(s, KeyManagementState::HpbReceived);
        let s = s.mark_ready().unwrap();
        assert!(s.can_transact());
    }

    #[test]
    fn invalid_user_or_user_state_does_not_advance() {
        let s = KeyManagementState::Fresh;
        assert!(s.send_hia().is_err());
        assert_eq!(s, KeyManagementState::Fresh);
    }

    #[test]
    fn seal_then_unseal_round_trips() {
        let subscriber = Subscriber::new_fresh(Dialect::H004).unwrap();
        let sealed = seal(&subscriber, "correct horse battery staple").unwrap();
        let reopened = unseal(
            &sealed,
            "correct horse battery staple",
            Dialect::H004,
            KeyManagementState::Fresh,
            None,
        )
        .unwrap();
        use rsa::traits::PublicKeyParts;
        assert_eq!(
            reopened.signature_keys.public.n(),
            subscriber.signature_keys.public.n()
        );
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let subscriber = Subscriber::new_fresh(Dialect::H004).unwrap();
        let sealed = seal(&subscriber, "correct horse battery staple").unwrap();
        let err = unseal(
            &sealed,
            "wrong passphrase",
            Dialect::H004,
            KeyManagementState::Fresh,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::WrongPassphrase));
    }
}
