//! Builds a single-transaction pain.001 customer credit transfer
//! initiation, the document the upload state machine signs, compresses
//! and ships to the bank.

use chrono::{DateTime, Utc};
use ebics_codec::xml::{Builder, XmlBuildError};
use rust_decimal::Decimal;

/// Everything needed to render one `CdtTrfTxInf` plus its enclosing
/// `GrpHdr`/`PmtInf` wrapper. One gateway-side `InitiatedPayment` maps to
/// exactly one of these.
pub struct CreditTransferRequest<'a> {
    pub message_id: &'a str,
    pub payment_information_id: &'a str,
    pub end_to_end_id: &'a str,
    pub created_at: DateTime<Utc>,
    pub requested_execution_date: chrono::NaiveDate,
    pub debtor_name: &'a str,
    pub debtor_iban: &'a str,
    pub debtor_bic: &'a str,
    pub creditor_name: &'a str,
    pub creditor_iban: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub unstructured_remittance_info: &'a str,
}

pub fn build_pain001(req: &CreditTransferRequest) -> Result<Vec<u8>, XmlBuildError> {
    let mut b = Builder::new();
    b.el("Document/CstmrCdtTrfInitn/GrpHdr", |b| {
        b.el("MsgId", |b| {
            b.text(req.message_id)?;
            Ok(())
        })?;
        b.el("CreDtTm", |b| {
            b.text(&req.created_at.to_rfc3339())?;
            Ok(())
        })?;
        b.el("NbOfTxs", |b| {
            b.text("1")?;
            Ok(())
        })?;
        b.el("CtrlSum", |b| {
            b.text(&req.amount.to_string())?;
            Ok(())
        })?;
        b.el("InitgPty/Nm", |b| {
            b.text(req.debtor_name)?;
            Ok(())
        })?;
        Ok(())
    })?;

    b.el("Document/CstmrCdtTrfInitn/PmtInf", |b| {
        b.el("PmtInfId", |b| {
            b.text(req.payment_information_id)?;
            Ok(())
        })?;
        b.el("PmtMtd", |b| {
            b.text("TRF")?;
            Ok(())
        })?;
        b.el("NbOfTxs", |b| {
            b.text("1")?;
            Ok(())
        })?;
        b.el("CtrlSum", |b| {
            b.text(&req.amount.to_string())?;
            Ok(())
        })?;
        b.el("ReqdExctnDt", |b| {
            b.text(&req.requested_execution_date.format("%Y-%m-%d").to_string())?;
            Ok(())
        })?;
        b.el("Dbtr/Nm", |b| {
            b.text(req.debtor_name)?;
            Ok(())
        })?;
        b.el("DbtrAcct/Id/IBAN", |b| {
            b.text(req.debtor_iban)?;
            Ok(())
        })?;
        b.el("DbtrAgt/FinInstnId/BICFI", |b| {
            b.text(req.debtor_bic)?;
            Ok(())
        })?;

        b.el("CdtTrfTxInf", |b| {
            b.el("PmtId/EndToEndId", |b| {
                b.text(req.end_to_end_id)?;
                Ok(())
            })?;
            b.el("Amt/InstdAmt", |b| {
                b.attr("Ccy", req.currency)?;
                b.text(&req.amount.to_string())?;
                Ok(())
            })?;
            b.el("Cdtr/Nm", |b| {
                b.text(req.creditor_name)?;
                Ok(())
            })?;
            b.el("CdtrAcct/Id/IBAN", |b| {
                b.text(req.creditor_iban)?;
                Ok(())
            })?;
            b.el("RmtInf/Ustrd", |b| {
                b.text(req.unstructured_remittance_info)?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })?;

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn builds_document_with_amount_and_subject() {
        let req = CreditTransferRequest {
            message_id: "MSG-1",
            payment_information_id: "PMT-1",
            end_to_end_id: "E2E-1",
            created_at: Utc::now(),
            requested_execution_date: chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap(),
            debtor_name: "Nexus Gateway",
            debtor_iban: "DE89370400440532013000",
            debtor_bic: "TESTBIC1",
            creditor_name: "Jane Customer",
            creditor_iban: "DE02120300000000202051",
            amount: Decimal::from_str("42.50").unwrap(),
            currency: "EUR",
            unstructured_remittance_info: "reserve pub ABCDEF",
        };
        let xml = build_pain001(&req).unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(text.contains("<EndToEndId>E2E-1</EndToEndId>"));
        assert!(text.contains(r#"<InstdAmt Ccy="EUR">42.50</InstdAmt>"#));
        assert!(text.contains("<IBAN>DE02120300000000202051</IBAN>"));
    }
}
