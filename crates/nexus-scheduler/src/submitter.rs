//! Submitter task: drains pending initiations for one subscriber, one
//! upload transaction at a time.

use crate::error::SchedulerError;
use crate::registry::SchedulerRegistry;
use crate::subscriber_context::SubscriberContext;
use crate::transport::BankClient;
use ebics_protocol::backoff::{BackoffConfig, DecorrelatedJitter};
use ebics_protocol::envelope::{build_upload_init_request, build_upload_transfer_request, parse_response, UploadInitRequest};
use ebics_protocol::error::ProtocolError;
use ebics_protocol::order::UploadOrderType;
use ebics_protocol::upload::prepare_upload;
use iso20022::credit_transfer::{build_pain001, CreditTransferRequest};
use nexus_db::DbPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Runs until `shutdown` is cancelled, processing at most one upload
/// transaction at a time for `ctx.id`. Finishes an in-flight transaction
/// before observing cancellation, matching the "don't leave the bank in a
/// stuck transaction" requirement.
pub async fn run_submitter(
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
        match submit_next(&pool, &registry, &bank, &ctx).await {
            Ok(true) => backoff.reset(),
            Ok(false) => {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                }
            }
            Err(error) => {
                tracing::warn!(subscriber = %ctx.id, %error, "submitter iteration failed");
                let delay = backoff.next_delay();
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Submits the oldest pending initiation, if any. Returns `true` if one was
/// processed (success or terminal failure), `false` if the queue was empty.
///
/// Public so the `ebics-submit` CLI subcommand can drive a single
/// transaction without running the whole `run_submitter` loop.
pub async fn submit_next(
    pool: &DbPool,
    registry: &SchedulerRegistry,
    bank: &BankClient,
    ctx: &SubscriberContext,
) -> Result<bool, SchedulerError> {
    let lock = registry.transaction_lock(ctx.id);
    let _guard = lock.lock().await;

    let pending = nexus_db::initiated::pending(pool).await?;
    let Some(payment) = pending.into_iter().next() else {
        return Ok(false);
    };

    let message_id = format!("NX{}", Uuid::new_v4().simple());
    let payment_information_id = format!("PMT{}", Uuid::new_v4().simple());
    let end_to_end_id = format!("E2E{}", Uuid::new_v4().simple());

    let (credit_payto, credit_params) = payment_domain::Payto::parse(&payment.credit_payto)?;
    let creditor_iban = match &credit_payto {
        payment_domain::Payto::Iban { iban, .. } => iban.as_str().to_string(),
        payment_domain::Payto::XTalerBank { .. } => {
            return Err(SchedulerError::Domain(payment_domain::DomainError::MalformedPayto(
                payment.credit_payto.clone(),
            )))
        }
    };
    let creditor_name = credit_params
        .get("receiver-name")
        .cloned()
        .unwrap_or_else(|| creditor_iban.clone());

    let req = CreditTransferRequest {
        message_id: &message_id,
        payment_information_id: &payment_information_id,
        end_to_end_id: &end_to_end_id,
        created_at: chrono::Utc::now(),
        requested_execution_date: chrono::Utc::now().date_naive(),
        debtor_name: &ctx.name,
        debtor_iban: &ctx.iban,
        debtor_bic: &ctx.bic,
        creditor_name: &creditor_name,
        creditor_iban: &creditor_iban,
        amount: payment.amount,
        currency: &payment.currency,
        unstructured_remittance_info: &payment.subject,
    };
    let pain001 = build_pain001(&req)?;

    let result = run_upload_transaction(bank, ctx, &pain001).await;
    match result {
        Ok(()) => {
            nexus_db::initiated::mark_submitted(pool, payment.id, &message_id, &end_to_end_id)
                .await?;
        }
        Err(error) => {
            nexus_db::initiated::mark_failed(pool, payment.id, &error.to_string()).await?;
        }
    }
    Ok(true)
}

async fn run_upload_transaction(
    bank: &BankClient,
    ctx: &SubscriberContext,
    plaintext_order_data: &[u8],
) -> Result<(), SchedulerError> {
    let bank_keys = ctx
        .subscriber
        .bank_keys
        .as_ref()
        .ok_or(SchedulerError::SubscriberNotReady(ctx.id))?;

    let prepared = prepare_upload(
        plaintext_order_data,
        &bank_keys.encryption,
        &ctx.subscriber.signature_keys.private,
    )?;

    let mut backoff = DecorrelatedJitter::new(BackoffConfig::default());
    // `total_segments` is known locally from how we chunked the ciphertext;
    // `advance`'s own segment bookkeeping is only used for its retry/abort
    // decision, not to track how many segments remain (see its doc comment
    // on `Init`'s placeholder `total_segments: u32::MAX`).
    let total_segments = prepared.order_data_segments.len() as u32;

    let init_xml = build_upload_init_request(UploadInitRequest {
        dialect: ctx.dialect,
        host_id: &ctx.host_id,
        partner_id: &ctx.partner_id,
        user_id: &ctx.user_id,
        order_type: UploadOrderType.code(),
        transaction_key_b64: &base64_of(&prepared.order_data_envelope_key.transaction_key),
        signature_value_b64: &base64_of(&prepared.signature_value),
        first_segment: &prepared.order_data_segments[0],
        total_segments,
        auth_priv: &ctx.subscriber.authentication_keys.private,
    })?;
    let transaction_id = send_and_await_ok(
        bank,
        &ctx.ebics_url,
        init_xml,
        &mut backoff,
        &bank_keys.authentication,
    )
    .await?
    .transaction_id
    .ok_or(ProtocolError::Transport("missing TransactionID".into()))?;

    // H004 already sent segment 1 inline with the init request; H005 defers
    // it to the first transfer request, same as every later segment.
    let first_transfer_segment = if ctx.dialect.first_segment_inline() { 2 } else { 1 };
    for segment_number in first_transfer_segment..=total_segments {
        let last = segment_number == total_segments;
        let segment_xml = build_upload_transfer_request(
            ctx.dialect,
            &transaction_id,
            segment_number,
            last,
            &prepared.order_data_segments[(segment_number - 1) as usize],
            &ctx.subscriber.authentication_keys.private,
        )?;
        send_and_await_ok(
            bank,
            &ctx.ebics_url,
            segment_xml,
            &mut backoff,
            &bank_keys.authentication,
        )
        .await?;
    }

    Ok(())
}

/// Posts `body`, retrying the same request on a retriable return code
/// (backing off between attempts) and erroring out on anything else that
/// isn't `Ok`. Verifies the response's `AuthSignature` against `auth_pub`
/// before treating it as trusted.
async fn send_and_await_ok(
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
        if !parsed.return_code.is_ok() {
            return Err(ProtocolError::BankReturnCode(parsed.return_code).into());
        }
        ebics_protocol::envelope::verify_response_auth(&response, &parsed, auth_pub)?;
        backoff.reset();
        return Ok(parsed);
    }
}

fn base64_of(bytes: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_of_round_trips() {
        let encoded = base64_of(b"hello");
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        assert_eq!(STANDARD.decode(encoded).unwrap(), b"hello");
    }
}
