//! camt.052 (intraday report), camt.053 (statement) and camt.054 (debit
//! notification) parsing. All three share the same `Ntry`/`TxDtls` shape,
//! so one parser covers them.

use crate::error::StatementError;
use chrono::NaiveDate;
use ebics_codec::xml::Destructor;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditDebitIndicator {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Booked,
    Pending,
    Informational,
}

/// A counterparty's identity and account, as it appears on either side of
/// a transaction's `RltdPties`.
#[derive(Debug, Clone, Default)]
pub struct Party {
    pub name: Option<String>,
    pub iban: Option<String>,
    pub agent_bic: Option<String>,
}

/// One `TxDtls` within a (possibly batched) statement entry.
#[derive(Debug, Clone)]
pub struct TransactionDetail {
    pub debtor: Party,
    pub creditor: Party,
    pub ultimate_debtor: Option<Party>,
    pub ultimate_creditor: Option<Party>,
    pub instructed_amount: Option<Decimal>,
    pub instructed_currency: Option<String>,
    pub counter_value_amount: Option<Decimal>,
    pub counter_value_currency: Option<String>,
    pub interbank_settlement_amount: Option<Decimal>,
    pub interbank_settlement_currency: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub end_to_end_id: Option<String>,
    pub payment_information_id: Option<String>,
    pub message_id: Option<String>,
    pub unstructured_remittance_info: Option<String>,
    pub return_reason: Option<String>,
}

/// One `Ntry` element, flattened with its (possibly multiple) batch
/// transaction details.
#[derive(Debug, Clone)]
pub struct Entry {
    pub amount: Decimal,
    pub currency: String,
    pub credit_debit_indicator: CreditDebitIndicator,
    pub status: EntryStatus,
    pub bank_transaction_code: Option<String>,
    pub value_date: Option<NaiveDate>,
    pub booking_date: Option<NaiveDate>,
    pub account_servicer_reference: Option<String>,
    pub details: Vec<TransactionDetail>,
}

fn parse_decimal(text: &str) -> Result<Decimal, StatementError> {
    Decimal::from_str(text).map_err(|_| StatementError::BadAmount(text.to_string()))
}

fn parse_amount_node(node: &Destructor) -> Result<(Decimal, String), StatementError> {
    let amount = parse_decimal(&node.text()?)?;
    let currency = node.attr("Ccy").unwrap_or("???").to_string();
    Ok((amount, currency))
}

fn parse_party(node: Option<Destructor>) -> Result<Party, StatementError> {
    let Some(node) = node else {
        return Ok(Party::default());
    };
    let mut party = Party::default();
    if let Some(pty) = node.opt("Pty")? {
        party.name = pty.opt("Nm")?.map(|n| n.text()).transpose()?;
    }
    if let Some(acct) = node.opt("Acct")? {
        if let Some(id) = acct.opt("Id")? {
            if let Some(iban) = id.opt("IBAN")? {
                party.iban = Some(iban.text()?);
            }
        }
    }
    if let Some(agt) = node.opt("Agt")? {
        if let Some(fin) = agt.opt("FinInstnId")? {
            if let Some(bic) = fin.opt("BICFI")?.or(fin.opt("BIC")?) {
                party.agent_bic = Some(bic.text()?);
            }
        }
    }
    Ok(party)
}

fn parse_transaction_detail(node: &Destructor) -> Result<TransactionDetail, StatementError> {
    let rltd_pties = node.opt("RltdPties")?;
    let debtor = parse_party(rltd_pties.and_then(|p| p.opt("Dbtr").ok().flatten()))?;
    let creditor = parse_party(
        node.opt("RltdPties")?
            .and_then(|p| p.opt("Cdtr").ok().flatten()),
    )?;
    let ultimate_debtor = match node.opt("RltdPties")?.and_then(|p| p.opt("UltmtDbtr").ok().flatten()) {
        Some(n) => Some(parse_party(Some(n))?),
        None => None,
    };
    let ultimate_creditor = match node.opt("RltdPties")?.and_then(|p| p.opt("UltmtCdtr").ok().flatten()) {
        Some(n) => Some(parse_party(Some(n))?),
        None => None,
    };

    let amt_dtls = node.opt("AmtDtls")?;
    let (instructed_amount, instructed_currency) =
        match amt_dtls.as_ref().and_then(|a| a.opt("InstdAmt").ok().flatten()) {
            Some(n) => {
                let (amt, cur) = parse_amount_node(&n)?;
                (Some(amt), Some(cur))
            }
            None => (None, None),
        };
    let (counter_value_amount, counter_value_currency) =
        match amt_dtls.as_ref().and_then(|a| a.opt("CntrValAmt").ok().flatten()) {
            Some(n) => {
                let (amt, cur) = parse_amount_node(&n)?;
                (Some(amt), Some(cur))
            }
            None => (None, None),
        };
    let exchange_rate = amt_dtls
        .as_ref()
        .and_then(|a| a.opt("CcyXchg").ok().flatten())
        .and_then(|x| x.opt("XchgRate").ok().flatten())
        .map(|n| n.text())
        .transpose()?
        .map(|s| parse_decimal(&s))
        .transpose()?;

    let (interbank_settlement_amount, interbank_settlement_currency) =
        match node.opt("Amt")? {
            Some(n) => {
                let (amt, cur) = parse_amount_node(&n)?;
                (Some(amt), Some(cur))
            }
            None => (None, None),
        };

    let refs = node.opt("Refs")?;
    let end_to_end_id = refs
        .as_ref()
        .and_then(|r| r.opt("EndToEndId").ok().flatten())
        .map(|n| n.text())
        .transpose()?;
    let payment_information_id = refs
        .as_ref()
        .and_then(|r| r.opt("PmtInfId").ok().flatten())
        .map(|n| n.text())
        .transpose()?;
    let message_id = refs
        .as_ref()
        .and_then(|r| r.opt("MsgId").ok().flatten())
        .map(|n| n.text())
        .transpose()?;

    let unstructured_remittance_info = node
        .opt("RmtInf")?
        .and_then(|r| r.opt("Ustrd").ok().flatten())
        .map(|n| n.text())
        .transpose()?;

    let return_reason = node
        .opt("RtrInf")?
        .and_then(|r| r.opt("Rsn").ok().flatten())
        .and_then(|r| r.opt("Cd").ok().flatten())
        .map(|n| n.text())
        .transpose()?;

    Ok(TransactionDetail {
        debtor,
        creditor,
        ultimate_debtor,
        ultimate_creditor,
        instructed_amount,
        instructed_currency,
        counter_value_amount,
        counter_value_currency,
        interbank_settlement_amount,
        interbank_settlement_currency,
        exchange_rate,
        end_to_end_id,
        payment_information_id,
        message_id,
        unstructured_remittance_info,
        return_reason,
    })
}

fn parse_entry(node: &Destructor) -> Result<Entry, StatementError> {
    let (amount, currency) = parse_amount_node(&node.one("Amt")?)?;
    let credit_debit_indicator = node.one("CdtDbtInd")?.enum_value(&[
        ("CRDT", CreditDebitIndicator::Credit),
        ("DBIT", CreditDebitIndicator::Debit),
    ])?;
    let status = node.one("Sts")?.enum_value(&[
        ("BOOK", EntryStatus::Booked),
        ("PDNG", EntryStatus::Pending),
        ("INFO", EntryStatus::Informational),
    ])?;
    let bank_transaction_code = node
        .opt("BkTxCd")?
        .and_then(|n| n.opt("Prtry").ok().flatten())
        .and_then(|n| n.opt("Cd").ok().flatten())
        .map(|n| n.text())
        .transpose()?;
    let value_date = node
        .opt("ValDt")?
        .and_then(|n| n.opt("Dt").ok().flatten())
        .map(|n| n.date())
        .transpose()?;
    let booking_date = node
        .opt("BookgDt")?
        .and_then(|n| n.opt("Dt").ok().flatten())
        .map(|n| n.date())
        .transpose()?;
    let account_servicer_reference = node
        .opt("AcctSvcrRef")?
        .map(|n| n.text())
        .transpose()?;

    let mut details = Vec::new();
    if let Some(ntry_dtls) = node.opt("NtryDtls")? {
        for batch in ntry_dtls.each("TxDtls") {
            details.push(parse_transaction_detail(&batch)?);
        }
    }

    Ok(Entry {
        amount,
        currency,
        credit_debit_indicator,
        status,
        bank_transaction_code,
        value_date,
        booking_date,
        account_servicer_reference,
        details,
    })
}

/// Parses a camt.052/053/054 document, flattening every `Ntry` (and its
/// batched `TxDtls`) into a single sequence. Missing optional elements are
/// tolerated; only a missing/malformed `Document/BkToCstmrStmt.../Ntry`
/// envelope fails the parse.
pub fn parse_statement(xml: &[u8]) -> Result<Vec<Entry>, StatementError> {
    let text = std::str::from_utf8(xml)
        .map_err(|_| StatementError::UnsupportedRoot("<non-utf8>".to_string()))?;
    let doc = roxmltree::Document::parse(text)
        .map_err(|e| StatementError::Destruction(ebics_codec::xml::DestructionError::from(e)))?;
    let document = Destructor::root(&doc);

    let stmt_container = document
        .opt("BkToCstmrStmt")?
        .or(document.opt("BkToCstmrAcctRpt")?)
        .or(document.opt("BkToCstmrDbtCdtNtfctn")?)
        .ok_or_else(|| StatementError::UnsupportedRoot(document.tag().to_string()))?;

    let mut entries = Vec::new();
    for stmt in stmt_container
        .opt("Stmt")?
        .into_iter()
        .chain(stmt_container.opt("Rpt")?)
        .chain(stmt_container.opt("Ntfctn")?)
    {
        for ntry in stmt.each("Ntry") {
            entries.push(parse_entry(&ntry)?);
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMT053: &str = r#"<Document>
      <BkToCstmrStmt>
        <Stmt>
          <Ntry>
            <Amt Ccy="EUR">12.50</Amt>
            <CdtDbtInd>CRDT</CdtDbtInd>
            <Sts>BOOK</Sts>
            <BookgDt><Dt>2026-07-20</Dt></BookgDt>
            <NtryDtls>
              <TxDtls>
                <Refs><EndToEndId>E2E-1</EndToEndId></Refs>
                <RltdPties>
                  <Dbtr><Pty><Nm>Alice</Nm></Pty></Dbtr>
                </RltdPties>
                <RmtInf><Ustrd>reserve pub test</Ustrd></RmtInf>
              </TxDtls>
            </NtryDtls>
          </Ntry>
        </Stmt>
      </BkToCstmrStmt>
    </Document>"#;

    #[test]
    fn parses_entry_with_single_batch_transaction() {
        let entries = parse_statement(CAMT053.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.amount, Decimal::from_str("12.50").unwrap());
        assert_eq!(entry.credit_debit_indicator, CreditDebitIndicator::Credit);
        assert_eq!(entry.status, EntryStatus::Booked);
        assert_eq!(entry.details.len(), 1);
        assert_eq!(entry.details[0].debtor.name.as_deref(), Some("Alice"));
        assert_eq!(
            entry.details[0].unstructured_remittance_info.as_deref(),
            Some("reserve pub test")
        );
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let xml = r#"<Document><BkToCstmrStmt><Stmt><Ntry>
            <Amt Ccy="EUR">1.00</Amt>
            <CdtDbtInd>DBIT</CdtDbtInd>
            <Sts>PDNG</Sts>
        </Ntry></Stmt></BkToCstmrStmt></Document>"#;
        let entries = parse_statement(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].value_date.is_none());
        assert!(entries[0].details.is_empty());
    }

    #[test]
    fn missing_required_envelope_fails() {
        let xml = r#"<Document><Something/></Document>"#;
        let err = parse_statement(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, StatementError::UnsupportedRoot(_)));
    }
}
