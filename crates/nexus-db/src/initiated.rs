//! The `initiated` table: payments the facade has accepted but the
//! scheduler hasn't necessarily submitted yet.

use crate::error::{Result, StoreError};
use crate::model::{InitiatedPayment, InitiationState, NewInitiatedPayment};
use crate::pool::DbPool;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;

fn row_to_payment(row: InitiatedRow) -> InitiatedPayment {
    InitiatedPayment {
        id: row.id,
        amount: row.amount,
        currency: row.currency,
        subject: row.subject,
        credit_payto: row.credit_payto,
        initiation_time: row.initiation_time,
        request_uid: row.request_uid,
        state: row.state,
        message_id: row.message_id,
        end_to_end_id: row.end_to_end_id,
        confirmation_tx: row.confirmation_tx,
        failure_reason: row.failure_reason,
    }
}

#[derive(sqlx::FromRow)]
struct InitiatedRow {
    id: i64,
    amount: rust_decimal::Decimal,
    currency: String,
    subject: String,
    credit_payto: String,
    initiation_time: DateTime<Utc>,
    request_uid: String,
    state: InitiationState,
    message_id: Option<String>,
    end_to_end_id: Option<String>,
    confirmation_tx: Option<String>,
    failure_reason: Option<String>,
}

/// Inserts a new initiation. A duplicate `request_uid` with identical
/// fields returns the existing row (idempotent replay); a duplicate with
/// different fields is a [`StoreError::RequestUidConflict`].
pub async fn create(pool: &DbPool, new: NewInitiatedPayment) -> Result<InitiatedPayment> {
    if let Some(existing) = find_by_request_uid(pool, &new.request_uid).await? {
        if existing.amount == new.amount
            && existing.currency == new.currency
            && existing.subject == new.subject
            && existing.credit_payto == new.credit_payto
        {
            return Ok(existing);
        }
        return Err(StoreError::RequestUidConflict(new.request_uid));
    }

    let row: InitiatedRow = sqlx::query_as(
        r#"
        INSERT INTO initiated (amount, currency, subject, credit_payto, request_uid, state)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING id, amount, currency, subject, credit_payto, initiation_time,
                  request_uid, state, message_id, end_to_end_id, confirmation_tx, failure_reason
        "#,
    )
    .bind(new.amount)
    .bind(&new.currency)
    .bind(&new.subject)
    .bind(&new.credit_payto)
    .bind(&new.request_uid)
    .fetch_one(pool)
    .await?;

    Ok(row_to_payment(row))
}

pub async fn find_by_request_uid(
    pool: &DbPool,
    request_uid: &str,
) -> Result<Option<InitiatedPayment>> {
    let row: Option<InitiatedRow> = sqlx::query_as(
        r#"
        SELECT id, amount, currency, subject, credit_payto, initiation_time,
               request_uid, state, message_id, end_to_end_id, confirmation_tx, failure_reason
        FROM initiated WHERE request_uid = $1
        "#,
    )
    .bind(request_uid)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_payment))
}

/// All `pending` initiations, ordered by id ascending, for the submitter
/// to work through in order.
pub async fn pending(pool: &DbPool) -> Result<Vec<InitiatedPayment>> {
    let mut stream = sqlx::query_as::<_, InitiatedRow>(
        r#"
        SELECT id, amount, currency, subject, credit_payto, initiation_time,
               request_uid, state, message_id, end_to_end_id, confirmation_tx, failure_reason
        FROM initiated WHERE state = 'pending' ORDER BY id ASC
        "#,
    )
    .fetch(pool);

    let mut out = Vec::new();
    while let Some(row) = stream.try_next().await? {
        out.push(row_to_payment(row));
    }
    Ok(out)
}

pub async fn mark_submitted(
    pool: &DbPool,
    id: i64,
    message_id: &str,
    end_to_end_id: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE initiated SET state = 'submitted', message_id = $2, end_to_end_id = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(message_id)
    .bind(end_to_end_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_confirmed(pool: &DbPool, id: i64, confirmation_tx: &str) -> Result<()> {
    sqlx::query(
        "UPDATE initiated SET state = 'confirmed', confirmation_tx = $2 WHERE id = $1 AND state = 'submitted'",
    )
    .bind(id)
    .bind(confirmation_tx)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_failed(pool: &DbPool, id: i64, reason: &str) -> Result<()> {
    sqlx::query("UPDATE initiated SET state = 'failed', failure_reason = $2 WHERE id = $1")
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;
    Ok(())
}
