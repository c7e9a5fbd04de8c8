//! Builds and parses the upload/download transaction envelopes (`ebicsRequest`
//! / `ebicsResponse`) that wrap the prepared order data and signature from
//! [`crate::upload`] and [`crate::download`]. Key-management (INI/HIA/HPB)
//! has its own, unsecured envelope shape and lives in [`crate::key_management`].

use crate::auth_signature::{sign_document, verify_document};
use crate::dialect::Dialect;
use crate::error::ProtocolError;
use crate::return_code::EbicsReturnCode;
use ebics_codec::xml::Builder;
use rsa::{RsaPrivateKey, RsaPublicKey};

pub struct UploadInitRequest<'a> {
    pub dialect: Dialect,
    pub host_id: &'a str,
    pub partner_id: &'a str,
    pub user_id: &'a str,
    pub order_type: &'a str,
    pub transaction_key_b64: &'a str,
    pub signature_value_b64: &'a str,
    pub first_segment: &'a str,
    pub total_segments: u32,
    pub auth_priv: &'a RsaPrivateKey,
}

/// Builds the signed `Init` phase upload request, embedding the first
/// segment of order data and the A006 signature value.
pub fn build_upload_init_request(req: UploadInitRequest<'_>) -> Result<Vec<u8>, ProtocolError> {
    let mut builder = Builder::new();
    builder.el("ebicsRequest/header", |b| {
        b.el("static", |b| {
            b.el("HostID", |b| {
                b.text(req.host_id)?;
                Ok(())
            })?;
            b.el("PartnerID", |b| {
                b.text(req.partner_id)?;
                Ok(())
            })?;
            b.el("UserID", |b| {
                b.text(req.user_id)?;
                Ok(())
            })?;
            b.el("OrderDetails/OrderType", |b| {
                b.text(req.order_type)?;
                Ok(())
            })?;
            b.el("NumSegments", |b| {
                b.text(&req.total_segments.to_string())?;
                Ok(())
            })?;
            Ok(())
        })?;
        b.el("mutable/TransactionPhase", |b| {
            b.text("Initialisation")?;
            Ok(())
        })?;
        Ok(())
    })?;
    builder.el("ebicsRequest/AuthSignature", |b| {
        b.attr("authenticate", "true")?;
        Ok(())
    })?;
    builder.el("ebicsRequest/body/DataTransfer/SignatureData", |b| {
        b.text(req.signature_value_b64)?;
        Ok(())
    })?;
    builder.el("ebicsRequest/body/DataTransfer/DataEncryptionInfo/TransactionKey", |b| {
        b.text(req.transaction_key_b64)?;
        Ok(())
    })?;
    // H004 inlines the first segment in the init request itself; H005 always
    // sends it as transfer segment 1, same as every later segment.
    if req.dialect.first_segment_inline() {
        builder.el("ebicsRequest/body/DataTransfer/OrderData", |b| {
            b.attr("authenticate", "true")?;
            b.text(req.first_segment)?;
            Ok(())
        })?;
    }

    let xml = builder.finish();
    sign_and_embed(xml, req.auth_priv)
}

/// Builds a `Transfer` phase upload request carrying segment `n`.
pub fn build_upload_transfer_request(
    dialect: Dialect,
    transaction_id: &str,
    segment_number: u32,
    last_segment: bool,
    order_data_segment: &str,
    auth_priv: &RsaPrivateKey,
) -> Result<Vec<u8>, ProtocolError> {
    let mut builder = Builder::new();
    builder.el("ebicsRequest/header", |b| {
        b.el("static/TransactionID", |b| {
            b.text(transaction_id)?;
            Ok(())
        })?;
        b.el("mutable", |b| {
            b.el("TransactionPhase", |b| {
                b.text("Transfer")?;
                Ok(())
            })?;
            b.el("SegmentNumber", |b| {
                b.attr("lastSegment", if last_segment { "true" } else { "false" })?;
                b.text(&segment_number.to_string())?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })?;
    builder.el("ebicsRequest/AuthSignature", |b| {
        b.attr("authenticate", "true")?;
        Ok(())
    })?;
    builder.el("ebicsRequest/body/DataTransfer/OrderData", |b| {
        b.attr("authenticate", "true")?;
        b.text(order_data_segment)?;
        Ok(())
    })?;
    let _ = dialect;
    let xml = builder.finish();
    sign_and_embed(xml, auth_priv)
}

/// Builds the `Init` phase download request for `order_type` (C52/C53/C54)
/// over an optional `[start, end]` date range.
pub fn build_download_init_request(
    dialect: Dialect,
    host_id: &str,
    partner_id: &str,
    user_id: &str,
    order_type: &str,
    date_range: Option<(&str, &str)>,
    auth_priv: &RsaPrivateKey,
) -> Result<Vec<u8>, ProtocolError> {
    let mut builder = Builder::new();
    builder.el("ebicsRequest/header/static", |b| {
        b.el("HostID", |b| {
            b.text(host_id)?;
            Ok(())
        })?;
        b.el("PartnerID", |b| {
            b.text(partner_id)?;
            Ok(())
        })?;
        b.el("UserID", |b| {
            b.text(user_id)?;
            Ok(())
        })?;
        b.el("OrderDetails/OrderType", |b| {
            b.text(order_type)?;
            Ok(())
        })?;
        if let Some((start, end)) = date_range {
            b.el("OrderDetails/DateRange/Start", |b| {
                b.text(start)?;
                Ok(())
            })?;
            b.el("OrderDetails/DateRange/End", |b| {
                b.text(end)?;
                Ok(())
            })?;
        }
        Ok(())
    })?;
    builder.el("ebicsRequest/header/mutable/TransactionPhase", |b| {
        b.text("Initialisation")?;
        Ok(())
    })?;
    builder.el("ebicsRequest/AuthSignature", |b| {
        b.attr("authenticate", "true")?;
        Ok(())
    })?;
    let _ = dialect;
    let xml = builder.finish();
    sign_and_embed(xml, auth_priv)
}

pub fn build_download_transfer_request(
    dialect: Dialect,
    transaction_id: &str,
    segment_number: u32,
    auth_priv: &RsaPrivateKey,
) -> Result<Vec<u8>, ProtocolError> {
    let mut builder = Builder::new();
    builder.el("ebicsRequest/header", |b| {
        b.el("static/TransactionID", |b| {
            b.text(transaction_id)?;
            Ok(())
        })?;
        b.el("mutable", |b| {
            b.el("TransactionPhase", |b| {
                b.text("Transfer")?;
                Ok(())
            })?;
            b.el("SegmentNumber", |b| {
                b.text(&segment_number.to_string())?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })?;
    builder.el("ebicsRequest/AuthSignature", |b| {
        b.attr("authenticate", "true")?;
        Ok(())
    })?;
    let _ = dialect;
    let xml = builder.finish();
    sign_and_embed(xml, auth_priv)
}

pub fn build_download_receipt_request(
    dialect: Dialect,
    transaction_id: &str,
    received_ok: bool,
    auth_priv: &RsaPrivateKey,
) -> Result<Vec<u8>, ProtocolError> {
    let mut builder = Builder::new();
    builder.el("ebicsRequest/header", |b| {
        b.el("static/TransactionID", |b| {
            b.text(transaction_id)?;
            Ok(())
        })?;
        b.el("mutable", |b| {
            b.el("TransactionPhase", |b| {
                b.text("Receipt")?;
                Ok(())
            })?;
            b.el("ReceiptCode", |b| {
                b.text(if received_ok { "0" } else { "1" })?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })?;
    builder.el("ebicsRequest/AuthSignature", |b| {
        b.attr("authenticate", "true")?;
        Ok(())
    })?;
    let _ = dialect;
    let xml = builder.finish();
    sign_and_embed(xml, auth_priv)
}

/// Replaces the empty `<AuthSignature authenticate="true">` placeholder
/// with the computed digest/signature, whichever of the two ways
/// `quick-xml` happened to serialize an empty element.
fn sign_and_embed(xml: Vec<u8>, auth_priv: &RsaPrivateKey) -> Result<Vec<u8>, ProtocolError> {
    let values = sign_document(&xml, auth_priv)?;
    let text = String::from_utf8(xml)
        .map_err(|e| ProtocolError::MalformedKeyFile(format!("built document not UTF-8: {e}")))?;
    let filled = format!(
        "<DigestValue>{}</DigestValue><SignatureValue>{}</SignatureValue></AuthSignature>",
        values.digest_value, values.signature_value
    );
    let placeholder_self_closing = "<AuthSignature authenticate=\"true\"/>";
    let placeholder_pair = "<AuthSignature authenticate=\"true\"></AuthSignature>";
    let replaced = if text.contains(placeholder_self_closing) {
        text.replacen(
            placeholder_self_closing,
            &format!("<AuthSignature authenticate=\"true\">{filled}"),
            1,
        )
    } else {
        text.replacen(
            placeholder_pair,
            &format!("<AuthSignature authenticate=\"true\">{filled}"),
            1,
        )
    };
    Ok(replaced.into_bytes())
}

/// The fields a caller needs out of a bank response envelope, regardless of
/// which phase produced it.
#[derive(Debug, Default, Clone)]
pub struct ParsedResponse {
    pub return_code: EbicsReturnCode,
    pub transaction_id: Option<String>,
    pub num_segments: Option<u32>,
    pub transaction_key_b64: Option<String>,
    pub order_data_segment: Option<String>,
    pub digest_value_b64: Option<String>,
    pub signature_value_b64: Option<String>,
}

/// Parses an `ebicsResponse` document for the fields the transaction engine
/// needs, tolerating the field's absence (not every phase's response
/// carries every field). Elements are looked up anywhere in the document
/// by local name, since their container nesting differs slightly between
/// EBICS 2.5 and 3.0.
pub fn parse_response(xml: &[u8]) -> Result<ParsedResponse, ProtocolError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| ProtocolError::MalformedKeyFile(format!("response not UTF-8: {e}")))?;
    let doc = roxmltree::Document::parse(text).map_err(ebics_codec::xml::DestructionError::from)?;

    let find_text = |tag: &str| -> Option<String> {
        doc.root_element()
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == tag)
            .map(|n| {
                n.descendants()
                    .filter(|d| d.is_text())
                    .filter_map(|d| d.text())
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
    };

    let return_code = find_text("ReturnCode")
        .map(|s| EbicsReturnCode::parse(&s))
        .unwrap_or(EbicsReturnCode::Ok);
    let transaction_id = find_text("TransactionID");
    let num_segments = find_text("NumSegments").and_then(|s| s.parse().ok());
    let transaction_key_b64 = find_text("TransactionKey");
    let order_data_segment = find_text("OrderData");
    let digest_value_b64 = find_text("DigestValue");
    let signature_value_b64 = find_text("SignatureValue");

    Ok(ParsedResponse {
        return_code,
        transaction_id,
        num_segments,
        transaction_key_b64,
        order_data_segment,
        digest_value_b64,
        signature_value_b64,
    })
}

/// Verifies a parsed response's `AuthSignature` against `auth_pub`. A
/// response with no digest/signature at all (the unsecured key-management
/// confirmations) fails verification rather than being treated as trusted
/// by omission.
pub fn verify_response_auth(
    xml: &[u8],
    parsed: &ParsedResponse,
    auth_pub: &RsaPublicKey,
) -> Result<(), ProtocolError> {
    let (digest, signature) = match (&parsed.digest_value_b64, &parsed.signature_value_b64) {
        (Some(digest), Some(signature)) => (digest, signature),
        _ => return Err(ProtocolError::MissingAuthSignature),
    };
    if verify_document(xml, digest, signature, auth_pub)? {
        Ok(())
    } else {
        Err(ProtocolError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_crypto::generate_rsa_keypair;

    #[test]
    fn upload_init_request_embeds_signature_and_order_data() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let xml = build_upload_init_request(UploadInitRequest {
            dialect: Dialect::H004,
            host_id: "HOST",
            partner_id: "PARTNER1",
            user_id: "USER1",
            order_type: "CCT",
            transaction_key_b64: "a2V5",
            signature_value_b64: "c2ln",
            first_segment: "c2VnbWVudA==",
            total_segments: 1,
            auth_priv: &pair.private,
        })
        .unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(text.contains("<DigestValue>"));
        assert!(text.contains("<OrderType>CCT</OrderType>"));
    }

    #[test]
    fn upload_init_request_h005_defers_first_segment_to_transfer() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let xml = build_upload_init_request(UploadInitRequest {
            dialect: Dialect::H005,
            host_id: "HOST",
            partner_id: "PARTNER1",
            user_id: "USER1",
            order_type: "CCT",
            transaction_key_b64: "a2V5",
            signature_value_b64: "c2ln",
            first_segment: "c2VnbWVudA==",
            total_segments: 2,
            auth_priv: &pair.private,
        })
        .unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(!text.contains("c2VnbWVudA=="));
    }

    #[test]
    fn parses_return_code_and_transaction_id() {
        let xml = br#"<?xml version="1.0"?>
            <ebicsResponse>
              <header><mutable>
                <TransactionID>000000000000000000000000000001</TransactionID>
                <ReturnCode>000000</ReturnCode>
                <NumSegments>3</NumSegments>
              </mutable></header>
            </ebicsResponse>"#;
        let parsed = parse_response(xml).unwrap();
        assert_eq!(parsed.return_code, EbicsReturnCode::Ok);
        assert_eq!(parsed.num_segments, Some(3));
        assert_eq!(
            parsed.transaction_id.as_deref(),
            Some("000000000000000000000000000001")
        );
    }

    #[test]
    fn verifies_a_signed_response() {
        let pair = generate_rsa_keypair(2048).unwrap();
        let unsigned = br#"<ebicsResponse><header authenticate="true"><mutable><ReturnCode>000000</ReturnCode></mutable></header><AuthSignature authenticate="true"/></ebicsResponse>"#;
        let values = sign_document(unsigned, &pair.private).unwrap();
        let filled = format!(
            "<DigestValue>{}</DigestValue><SignatureValue>{}</SignatureValue></AuthSignature>",
            values.digest_value, values.signature_value
        );
        let signed = String::from_utf8(unsigned.to_vec())
            .unwrap()
            .replacen("<AuthSignature authenticate=\"true\"/>", &format!("<AuthSignature authenticate=\"true\">{filled}"), 1);

        let parsed = parse_response(signed.as_bytes()).unwrap();
        assert!(verify_response_auth(signed.as_bytes(), &parsed, &pair.public).is_ok());

        let other = generate_rsa_keypair(2048).unwrap();
        assert!(verify_response_auth(signed.as_bytes(), &parsed, &other.public).is_err());
    }

    #[test]
    fn response_without_auth_signature_fails_verification() {
        let xml = br#"<ebicsResponse><header><mutable><ReturnCode>000000</ReturnCode></mutable></header></ebicsResponse>"#;
        let parsed = parse_response(xml).unwrap();
        let pair = generate_rsa_keypair(2048).unwrap();
        assert!(matches!(
            verify_response_auth(xml, &parsed, &pair.public),
            Err(ProtocolError::MissingAuthSignature)
        ));
    }
}
