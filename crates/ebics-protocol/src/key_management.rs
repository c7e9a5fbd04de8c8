//! Builds the INI/HIA/HPB key-management requests and parses HPB's
//! response into the bank's public keys.

use crate::dialect::Dialect;
use crate::error::ProtocolError;
use crate::subscriber::BankKeys;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ebics_codec::xml::{Builder, Destructor};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;

fn exponent_modulus_b64(key: &RsaPublicKey) -> (String, String) {
    (
        B64.encode(key.e().to_bytes_be()),
        B64.encode(key.n().to_bytes_be()),
    )
}

/// Builds the unsigned `INI` request carrying the subscriber's signature
/// public key.
pub fn build_ini_request(
    dialect: Dialect,
    partner_id: &str,
    user_id: &str,
    signature_pub: &RsaPublicKey,
) -> Result<Vec<u8>, ProtocolError> {
    let (exponent, modulus) = exponent_modulus_b64(signature_pub);
    let mut builder = Builder::new();
    builder.el("ebicsUnsecuredRequest/header/static", |b| {
        b.el("PartnerID", |b| {
            b.text(partner_id)?;
            Ok(())
        })?;
        b.el("UserID", |b| {
            b.text(user_id)?;
            Ok(())
        })?;
        b.el("OrderDetails/OrderType", |b| {
            b.text("INI")?;
            Ok(())
        })?;
        b.el("SecurityMedium", |b| {
            b.text("0000")?;
            Ok(())
        })?;
        Ok(())
    })?;
    builder.el(
        "ebicsUnsecuredRequest/body/DataTransfer/OrderData/SignaturePubKeyInfo/PubKeyValue/RSAKeyValue/Exponent",
        |b| {
            b.text(&exponent)?;
            Ok(())
        },
    )?;
    builder.el(
        "ebicsUnsecuredRequest/body/DataTransfer/OrderData/SignaturePubKeyInfo/PubKeyValue/RSAKeyValue/Modulus",
        |b| {
            b.text(&modulus)?;
            Ok(())
        },
    )?;
    let _ = dialect;
    Ok(builder.finish())
}

/// Builds the unsigned `HIA` request carrying the authentication and
/// encryption public keys.
pub fn build_hia_request(
    dialect: Dialect,
    partner_id: &str,
    user_id: &str,
    authentication_pub: &RsaPublicKey,
    encryption_pub: &RsaPublicKey,
) -> Result<Vec<u8>, ProtocolError> {
    let (auth_exp, auth_mod) = exponent_modulus_b64(authentication_pub);
    let (enc_exp, enc_mod) = exponent_modulus_b64(encryption_pub);
    let mut builder = Builder::new();
    builder.el("ebicsUnsecuredRequest/header/static", |b| {
        b.el("PartnerID", |b| {
            b.text(partner_id)?;
            Ok(())
        })?;
        b.el("UserID", |b| {
            b.text(user_id)?;
            Ok(())
        })?;
        b.el("OrderDetails/OrderType", |b| {
            b.text("HIA")?;
            Ok(())
        })?;
        Ok(())
    })?;
    builder.el(
        "ebicsUnsecuredRequest/body/DataTransfer/OrderData/AuthenticationPubKeyInfo/PubKeyValue/RSAKeyValue/Exponent",
        |b| {
            b.text(&auth_exp)?;
            Ok(())
        },
    )?;
    builder.el(
        "ebicsUnsecuredRequest/body/DataTransfer/OrderData/AuthenticationPubKeyInfo/PubKeyValue/RSAKeyValue/Modulus",
        |b| {
            b.text(&auth_mod)?;
            Ok(())
        },
    )?;
    builder.el(
        "ebicsUnsecuredRequest/body/DataTransfer/OrderData/EncryptionPubKeyInfo/PubKeyValue/RSAKeyValue/Exponent",
        |b| {
            b.text(&enc_exp)?;
            Ok(())
        },
    )?;
    builder.el(
        "ebicsUnsecuredRequest/body/DataTransfer/OrderData/EncryptionPubKeyInfo/PubKeyValue/RSAKeyValue/Modulus",
        |b| {
            b.text(&enc_mod)?;
            Ok(())
        },
    )?;
    let _ = dialect;
    Ok(builder.finish())
}

/// Parses the decrypted, inflated `HPB` response order data into the
/// bank's public keys.
pub fn parse_hpb_response(order_data: &[u8]) -> Result<BankKeys, ProtocolError> {
    let text = std::str::from_utf8(order_data)
        .map_err(|e| ProtocolError::MalformedKeyFile(format!("HPB order data not UTF-8: {e}")))?;
    let doc = roxmltree::Document::parse(text).map_err(ebics_codec::xml::DestructionError::from)?;
    let root = Destructor::root(&doc);

    let auth_info = root.one("AuthenticationPubKeyInfo")?;
    let auth_key = parse_rsa_key_value(&auth_info.one("PubKeyValue")?.one("RSAKeyValue")?)?;

    let enc_info = root.one("EncryptionPubKeyInfo")?;
    let enc_key = parse_rsa_key_value(&enc_info.one("PubKeyValue")?.one("RSAKeyValue")?)?;

    Ok(BankKeys {
        authentication: auth_key,
        encryption: enc_key,
    })
}

fn parse_rsa_key_value(node: &Destructor) -> Result<RsaPublicKey, ProtocolError> {
    let exponent = B64
        .decode(node.one("Exponent")?.text()?)
        .map_err(ProtocolError::Base64)?;
    let modulus = B64
        .decode(node.one("Modulus")?.text()?)
        .map_err(ProtocolError::Base64)?;
    RsaPublicKey::new(
        rsa::BigUint::from_bytes_be(&modulus),
        rsa::BigUint::from_bytes_be(&exponent),
    )
    .map_err(|e| ProtocolError::MalformedKeyFile(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_crypto::generate_rsa_keypair;

    #[test]
    fn builds_ini_request_with_embedded_exponent_and_modulus() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let xml = build_ini_request(Dialect::H004, "PARTNER1", "USER1", &pair.public).unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(text.contains("<OrderType>INI</OrderType>"));
        assert!(text.contains("<Exponent>"));
    }

    #[test]
    fn hpb_round_trip_recovers_the_same_keys() {
        let auth_pair = generate_rsa_keypair(2048).unwrap();
        let enc_pair = generate_rsa_keypair(2048).unwrap();

        let (auth_exp, auth_mod) = exponent_modulus_b64(&auth_pair.public);
        let (enc_exp, enc_mod) = exponent_modulus_b64(&enc_pair.public);
        let mut builder = Builder::new();
        builder
            .el(
                "HPBResponseOrderData/AuthenticationPubKeyInfo/PubKeyValue/RSAKeyValue/Exponent",
                |b| {
                    b.text(&auth_exp)?;
                    Ok(())
                },
            )
            .unwrap();
        builder
            .el(
                "HPBResponseOrderData/AuthenticationPubKeyInfo/PubKeyValue/RSAKeyValue/Modulus",
                |b| {
                    b.text(&auth_mod)?;
                    Ok(())
                },
            )
            .unwrap();
        builder
            .el(
                "HPBResponseOrderData/EncryptionPubKeyInfo/PubKeyValue/RSAKeyValue/Exponent",
                |b| {
                    b.text(&enc_exp)?;
                    Ok(())
                },
            )
            .unwrap();
        builder
            .el(
                "HPBResponseOrderData/EncryptionPubKeyInfo/PubKeyValue/RSAKeyValue/Modulus",
                |b| {
                    b.text(&enc_mod)?;
                    Ok(())
                },
            )
            .unwrap();
        let xml = builder.finish();

        let bank_keys = parse_hpb_response(&xml).unwrap();
        use rsa::traits::PublicKeyParts;
        assert_eq!(bank_keys.authentication.n(), auth_pair.public.n());
        assert_eq!(bank_keys.encryption.n(), enc_pair.public.n());
    }
}
