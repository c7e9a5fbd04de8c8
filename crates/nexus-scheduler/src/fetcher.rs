//! Fetcher task: downloads C52/C53 statements for one subscriber on a
//! fixed cadence, persists the raw message, and turns newly-seen entries
//! into `incoming`/`outgoing` rows.

use crate::error::SchedulerError;
use crate::registry::{incoming_channel, outgoing_channel, SchedulerRegistry};
use crate::subscriber_context::SubscriberContext;
use crate::transport::BankClient;
use ebics_protocol::backoff::{BackoffConfig, DecorrelatedJitter};
use ebics_protocol::download::{advance_transfer, finish_download, handle_init_response, DownloadPhase, InitOutcome};
use ebics_protocol::envelope::{
    build_download_init_request, build_download_receipt_request, build_download_transfer_request,
    parse_response,
};
use ebics_protocol::error::ProtocolError;
use ebics_protocol::order::DownloadOrderType;
use ebics_crypto::public_key_fingerprint;
use iso20022::statement::{CreditDebitIndicator, Entry, Party};
use nexus_db::model::{BankMessageCode, NewIncomingPayment, NewOutgoingPayment, RecordOutcome};
use nexus_db::DbPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const FETCH_INTERVAL: Duration = Duration::from_secs(5 * 60);
const ORDER_TYPES: [(DownloadOrderType, BankMessageCode); 2] = [
    (DownloadOrderType::C53, BankMessageCode::C53),
    (DownloadOrderType::C52, BankMessageCode::C52),
];

/// Runs until `shutdown` is cancelled, fetching statements for `ctx.id`
/// every [`FETCH_INTERVAL`]. Finishes an in-flight download before
/// observing cancellation, same as the submitter.
pub async fn run_fetcher(
    pool: DbPool,
    registry: Arc<SchedulerRegistry>,
    bank: BankClient,
    ctx: Arc<SubscriberContext>,
    shutdown: CancellationToken,
) {
    let mut backoff = DecorrelatedJitter::new(BackoffConfig::default());
    loop {
        if shutdown.is_cancelled() {
            return;
        }
        match fetch_once(&pool, &registry, &bank, &ctx).await {
            Ok(()) => {
                backoff.reset();
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(FETCH_INTERVAL) => {}
                }
            }
            Err(error) => {
                tracing::warn!(subscriber = %ctx.id, %error, "fetcher iteration failed");
                let delay = backoff.next_delay();
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Runs both order types once and processes whatever new bank messages
/// result. Public so the `ebics-fetch` CLI subcommand can drive a single
/// pass without running the whole `run_fetcher` loop.
pub async fn fetch_once(
    pool: &DbPool,
    registry: &SchedulerRegistry,
    bank: &BankClient,
    ctx: &SubscriberContext,
) -> Result<(), SchedulerError> {
    let lock = registry.transaction_lock(ctx.id);
    let _guard = lock.lock().await;

    for (order_type, code) in ORDER_TYPES {
        if let Some(raw) = download_order(bank, ctx, order_type).await? {
            nexus_db::bank_message::append(pool, ctx.id, code, &raw).await?;
        }
    }

    process_unseen(pool, registry, ctx).await
}

/// Runs one full download transaction for `order_type`. Returns `None` if
/// the bank reports nothing new.
async fn download_order(
    bank: &BankClient,
    ctx: &SubscriberContext,
    order_type: DownloadOrderType,
) -> Result<Option<Vec<u8>>, SchedulerError> {
    let bank_keys = ctx
        .subscriber
        .bank_keys
        .as_ref()
        .ok_or(SchedulerError::SubscriberNotReady(ctx.id))?;

    let mut backoff = DecorrelatedJitter::new(BackoffConfig::default());

    let init_xml = build_download_init_request(
        ctx.dialect,
        &ctx.host_id,
        &ctx.partner_id,
        &ctx.user_id,
        order_type.code(),
        None,
        &ctx.subscriber.authentication_keys.private,
    )?;
    let init_response = send(bank, &ctx.ebics_url, init_xml, &mut backoff, &bank_keys.authentication).await?;

    if init_response.return_code == ebics_protocol::EbicsReturnCode::NoDownloadDataAvailable {
        return Ok(None);
    }
    let total_segments = init_response.num_segments.unwrap_or(1);
    let first_segment = init_response
        .order_data_segment
        .ok_or_else(|| ProtocolError::Transport("download init missing OrderData".into()))?;
    let transaction_id = init_response
        .transaction_id
        .clone()
        .ok_or_else(|| ProtocolError::Transport("download init missing TransactionID".into()))?;
    let transaction_key = base64_decode(
        &init_response
            .transaction_key_b64
            .ok_or_else(|| ProtocolError::Transport("download init missing TransactionKey".into()))?,
    )?;

    // This gateway unseals exactly one encryption keypair per subscriber, so
    // rather than trust a recipient digest round-tripped through the bank's
    // response (`parse_response` doesn't currently surface one), we match
    // against our own key's fingerprint directly.
    let recipient_digest = public_key_fingerprint(&ctx.subscriber.encryption_keys.public);

    let outcome = handle_init_response(
        init_response.return_code,
        total_segments,
        first_segment,
        transaction_key.clone(),
        recipient_digest,
    )?;

    let (mut phase, mut segments) = match outcome {
        InitOutcome::NoDataAvailable => return Ok(None),
        InitOutcome::Data { phase, first_segment, .. } => (phase, vec![first_segment]),
    };

    while let DownloadPhase::Transfer { next_segment, .. } = phase {
        let segment_xml = build_download_transfer_request(
            ctx.dialect,
            &transaction_id,
            next_segment,
            &ctx.subscriber.authentication_keys.private,
        )?;
        let response = send(bank, &ctx.ebics_url, segment_xml, &mut backoff, &bank_keys.authentication).await?;
        segments.push(
            response
                .order_data_segment
                .ok_or_else(|| ProtocolError::Transport("transfer response missing OrderData".into()))?,
        );
        phase = advance_transfer(phase);
    }

    let plaintext = finish_download(
        &segments,
        transaction_key,
        recipient_digest,
        &[("default", &ctx.subscriber.encryption_keys.private)],
    )?;

    let receipt_xml = build_download_receipt_request(
        ctx.dialect,
        &transaction_id,
        true,
        &ctx.subscriber.authentication_keys.private,
    )?;
    send(bank, &ctx.ebics_url, receipt_xml, &mut backoff, &bank_keys.authentication).await?;

    Ok(Some(plaintext))
}

async fn send(
    bank: &BankClient,
    url: &str,
    body: Vec<u8>,
    backoff: &mut DecorrelatedJitter,
    auth_pub: &rsa::RsaPublicKey,
) -> Result<ebics_protocol::envelope::ParsedResponse, SchedulerError> {
    loop {
        let response = bank.post_xml(url, body.clone()).await?;
        let parsed = parse_response(&response)?;
        if parsed.return_code.is_retriable() {
            let delay = backoff.next_delay();
            tokio::time::sleep(delay).await;
            continue;
        }
        if !parsed.return_code.is_ok()
            && parsed.return_code != ebics_protocol::EbicsReturnCode::NoDownloadDataAvailable
        {
            return Err(ProtocolError::BankReturnCode(parsed.return_code).into());
        }
        ebics_protocol::envelope::verify_response_auth(&response, &parsed, auth_pub)?;
        backoff.reset();
        return Ok(parsed);
    }
}

fn base64_decode(text: &str) -> Result<Vec<u8>, ProtocolError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.decode(text).map_err(ProtocolError::Base64)
}

/// Parses every unseen `bank_message` row for `ctx.id` and records each
/// entry as an `incoming` or `outgoing` payment, notifying both the
/// in-process registry and the database's own LISTEN/NOTIFY channel on
/// anything new.
async fn process_unseen(
    pool: &DbPool,
    registry: &SchedulerRegistry,
    ctx: &SubscriberContext,
) -> Result<(), SchedulerError> {
    let messages = nexus_db::bank_message::unseen(pool, ctx.id).await?;
    let mut incoming_changed = false;
    let mut outgoing_changed = false;

    for message in messages {
        let result = iso20022::statement::parse_statement(&message.content);
        let entries = match result {
            Ok(entries) => entries,
            Err(error) => {
                tracing::error!(subscriber = %ctx.id, message = message.id, %error, "failed to parse statement");
                nexus_db::bank_message::mark_processed(pool, message.id, true).await?;
                continue;
            }
        };

        for (idx, entry) in entries.iter().enumerate() {
            match entry.credit_debit_indicator {
                CreditDebitIndicator::Credit => {
                    if record_incoming(pool, ctx, entry, idx).await? {
                        incoming_changed = true;
                    }
                }
                CreditDebitIndicator::Debit => {
                    if record_outgoing(pool, ctx, entry, idx).await? {
                        outgoing_changed = true;
                    }
                }
            }
        }

        nexus_db::bank_message::mark_processed(pool, message.id, false).await?;
    }

    if incoming_changed {
        let channel = incoming_channel(&ctx.iban);
        registry.notify(&channel);
        nexus_db::notify::notify(pool, &channel).await?;
    }
    if outgoing_changed {
        let channel = outgoing_channel(&ctx.iban);
        registry.notify(&channel);
        nexus_db::notify::notify(pool, &channel).await?;
    }
    Ok(())
}

/// Records every `TransactionDetail` batched into `entry` as its own
/// incoming payment (an entry with no details at all still yields one row
/// from the entry-level fields, same as before batching was handled).
async fn record_incoming(
    pool: &DbPool,
    ctx: &SubscriberContext,
    entry: &Entry,
    idx: usize,
) -> Result<bool, SchedulerError> {
    if entry.details.is_empty() {
        return record_incoming_detail(pool, ctx, entry, None, idx, 0).await;
    }
    let mut changed = false;
    for (detail_idx, detail) in entry.details.iter().enumerate() {
        if record_incoming_detail(pool, ctx, entry, Some(detail), idx, detail_idx).await? {
            changed = true;
        }
    }
    Ok(changed)
}

async fn record_incoming_detail(
    pool: &DbPool,
    ctx: &SubscriberContext,
    entry: &Entry,
    detail: Option<&iso20022::statement::TransactionDetail>,
    idx: usize,
    detail_idx: usize,
) -> Result<bool, SchedulerError> {
    let subject = detail
        .and_then(|d| d.unstructured_remittance_info.clone())
        .unwrap_or_default();
    let debit_payto = detail.map(|d| party_to_payto(&d.debtor)).unwrap_or_else(|| "payto://unknown".to_string());
    let bank_id = entry_bank_id(entry, detail, idx, detail_idx);
    let execution_time = entry_execution_time(entry);
    let amount = detail.and_then(|d| d.interbank_settlement_amount).unwrap_or(entry.amount);
    let currency = detail
        .and_then(|d| d.interbank_settlement_currency.clone())
        .unwrap_or_else(|| entry.currency.clone());
    let reserve_pub = payment_domain::extract_reserve_pub(&subject).map(|h| h.to_string());

    let reserve_pub = match reserve_pub {
        Some(candidate) if nexus_db::incoming::reserve_pub_already_used(pool, &candidate).await? => {
            tracing::warn!(subscriber = %ctx.id, %bank_id, "reserve pub reused, treating as unmatched");
            None
        }
        other => other,
    };

    let new = NewIncomingPayment {
        amount,
        currency,
        debit_payto,
        subject,
        execution_time,
        bank_id,
        reserve_pub,
    };
    let outcome = nexus_db::incoming::record_if_new(pool, new).await?;
    match outcome {
        RecordOutcome::Created(row) => {
            if row.reserve_pub.is_none() {
                tracing::info!(subscriber = %ctx.id, incoming = row.id, "incoming payment without reserve pub, scheduling a refund");
                schedule_refund(pool, &row).await?;
            }
            Ok(true)
        }
        RecordOutcome::Duplicate => Ok(false),
    }
}

/// Queues a refund initiation for an incoming payment whose subject didn't
/// carry a recoverable reserve public key: the only way to return the
/// money is to wire it straight back to whoever sent it.
async fn schedule_refund(
    pool: &DbPool,
    incoming: &nexus_db::model::IncomingPayment,
) -> Result<(), SchedulerError> {
    let new = nexus_db::model::NewInitiatedPayment {
        amount: incoming.amount,
        currency: incoming.currency.clone(),
        subject: format!("Taler refund of: {}", incoming.subject),
        credit_payto: incoming.debit_payto.clone(),
        request_uid: format!("refund-{}", incoming.id),
    };
    nexus_db::initiated::create(pool, new).await?;
    Ok(())
}

/// Records every `TransactionDetail` batched into `entry` as its own
/// outgoing payment, same flattening `record_incoming` does.
async fn record_outgoing(
    pool: &DbPool,
    ctx: &SubscriberContext,
    entry: &Entry,
    idx: usize,
) -> Result<bool, SchedulerError> {
    if entry.details.is_empty() {
        return record_outgoing_detail(pool, ctx, entry, None, idx, 0).await;
    }
    let mut changed = false;
    for (detail_idx, detail) in entry.details.iter().enumerate() {
        if record_outgoing_detail(pool, ctx, entry, Some(detail), idx, detail_idx).await? {
            changed = true;
        }
    }
    Ok(changed)
}

async fn record_outgoing_detail(
    pool: &DbPool,
    ctx: &SubscriberContext,
    entry: &Entry,
    detail: Option<&iso20022::statement::TransactionDetail>,
    idx: usize,
    detail_idx: usize,
) -> Result<bool, SchedulerError> {
    let subject = detail
        .and_then(|d| d.unstructured_remittance_info.clone())
        .unwrap_or_default();
    let credit_payto = detail.map(|d| party_to_payto(&d.creditor)).unwrap_or_else(|| "payto://unknown".to_string());
    let bank_id = entry_bank_id(entry, detail, idx, detail_idx);
    let execution_time = entry_execution_time(entry);
    let amount = detail.and_then(|d| d.interbank_settlement_amount).unwrap_or(entry.amount);
    let currency = detail
        .and_then(|d| d.interbank_settlement_currency.clone())
        .unwrap_or_else(|| entry.currency.clone());

    let (wtid, exchange_base_url) = match payment_domain::parse_wtid_and_url(&subject) {
        Ok((wtid, url)) => (Some(wtid.to_string()), Some(url.to_string())),
        Err(_) => (None, None),
    };

    let new = NewOutgoingPayment {
        amount,
        currency,
        credit_payto,
        subject,
        execution_time,
        bank_id,
        wtid,
        exchange_base_url,
    };
    let message_id = detail.and_then(|d| d.message_id.as_deref());
    let payment_information_id = detail.and_then(|d| d.end_to_end_id.as_deref());

    let outcome = nexus_db::outgoing::record_if_new(pool, new, message_id, payment_information_id).await?;
    match outcome {
        RecordOutcome::Created(_) => {
            let _ = ctx;
            Ok(true)
        }
        RecordOutcome::Duplicate => Ok(false),
    }
}

fn party_to_payto(party: &Party) -> String {
    match (&party.iban, &party.agent_bic) {
        (Some(iban), Some(bic)) => format!("payto://iban/{bic}/{iban}"),
        (Some(iban), None) => format!("payto://iban/{iban}"),
        (None, _) => "payto://unknown".to_string(),
    }
}

/// Prefers the bank's own entry reference, then the batch's end-to-end id;
/// both are stable across a re-fetch of the same statement. Falls back to a
/// synthetic key so a statement without either still dedupes within itself.
/// `detail_idx` disambiguates multiple transaction details flattened out of
/// the same entry, which would otherwise collide on the entry-level
/// reference; the first detail keeps the bare key unchanged.
fn entry_bank_id(
    entry: &Entry,
    detail: Option<&iso20022::statement::TransactionDetail>,
    idx: usize,
    detail_idx: usize,
) -> String {
    let base = entry
        .account_servicer_reference
        .clone()
        .or_else(|| detail.and_then(|d| d.end_to_end_id.clone()))
        .unwrap_or_else(|| format!("entry-{}-{}", entry.currency, idx));
    if detail_idx == 0 {
        base
    } else {
        format!("{base}-{detail_idx}")
    }
}

fn entry_execution_time(entry: &Entry) -> chrono::DateTime<chrono::Utc> {
    entry
        .booking_date
        .or(entry.value_date)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(chrono::Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso20022::statement::{CreditDebitIndicator, EntryStatus};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample_entry(indicator: CreditDebitIndicator) -> Entry {
        Entry {
            amount: Decimal::from_str("10.00").unwrap(),
            currency: "EUR".to_string(),
            credit_debit_indicator: indicator,
            status: EntryStatus::Booked,
            bank_transaction_code: None,
            value_date: None,
            booking_date: None,
            account_servicer_reference: Some("REF-1".to_string()),
            details: Vec::new(),
        }
    }

    #[test]
    fn party_to_payto_prefers_iban_and_bic() {
        let party = Party {
            name: Some("Alice".to_string()),
            iban: Some("DE89370400440532013000".to_string()),
            agent_bic: Some("BICXDEFF".to_string()),
        };
        assert_eq!(party_to_payto(&party), "payto://iban/BICXDEFF/DE89370400440532013000");
    }

    #[test]
    fn party_to_payto_without_iban_is_unknown() {
        let party = Party::default();
        assert_eq!(party_to_payto(&party), "payto://unknown");
    }

    #[test]
    fn entry_bank_id_prefers_account_servicer_reference() {
        let entry = sample_entry(CreditDebitIndicator::Credit);
        assert_eq!(entry_bank_id(&entry, None, 0, 0), "REF-1");
    }

    #[test]
    fn entry_bank_id_falls_back_to_synthetic_key() {
        let mut entry = sample_entry(CreditDebitIndicator::Debit);
        entry.account_servicer_reference = None;
        assert_eq!(entry_bank_id(&entry, None, 2, 0), "entry-EUR-2");
    }

    #[test]
    fn entry_bank_id_disambiguates_multiple_details_in_one_entry() {
        let entry = sample_entry(CreditDebitIndicator::Credit);
        assert_eq!(entry_bank_id(&entry, None, 0, 1), "REF-1-1");
    }
}
