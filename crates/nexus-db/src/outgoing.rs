//! The `outgoing` table: payments the bank reports as sent out, uniqued by
//! `bank_id`. On creation, attempts to link to a pending initiation by
//! matching the bank's message id and payment-information id against the
//! ones we recorded at submission time.

use crate::error::Result;
use crate::model::{NewOutgoingPayment, OutgoingPayment, RecordOutcome};
use crate::pool::DbPool;
use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow)]
struct OutgoingRow {
    id: i64,
    amount: rust_decimal::Decimal,
    currency: String,
    credit_payto: String,
    subject: String,
    execution_time: DateTime<Utc>,
    bank_id: String,
    wtid: Option<String>,
    exchange_base_url: Option<String>,
    initiated_payment: Option<i64>,
}

impl From<OutgoingRow> for OutgoingPayment {
    fn from(row: OutgoingRow) -> Self {
        OutgoingPayment {
            id: row.id,
            amount: row.amount,
            currency: row.currency,
            credit_payto: row.credit_payto,
            subject: row.subject,
            execution_time: row.execution_time,
            bank_id: row.bank_id,
            wtid: row.wtid,
            exchange_base_url: row.exchange_base_url,
            initiated_payment: row.initiated_payment,
        }
    }
}

pub async fn record_if_new(
    pool: &DbPool,
    new: NewOutgoingPayment,
    message_id: Option<&str>,
    payment_information_id: Option<&str>,
) -> Result<RecordOutcome<OutgoingPayment>> {
    let linked_id: Option<i64> = match (message_id, payment_information_id) {
        (Some(msg), Some(pmt)) => {
            sqlx::query_as::<_, (i64,)>(
                "SELECT id FROM initiated WHERE message_id = $1 AND end_to_end_id = $2 AND state = 'submitted'",
            )
            .bind(msg)
            .bind(pmt)
            .fetch_optional(pool)
            .await?
            .map(|(id,)| id)
        }
        _ => None,
    };

    let row: Option<OutgoingRow> = sqlx::query_as(
        r#"
        INSERT INTO outgoing (amount, currency, credit_payto, subject, execution_time, bank_id, wtid, exchange_base_url, initiated_payment)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (bank_id) DO NOTHING
        RETURNING id, amount, currency, credit_payto, subject, execution_time, bank_id, wtid, exchange_base_url, initiated_payment
        "#,
    )
    .bind(new.amount)
    .bind(&new.currency)
    .bind(&new.credit_payto)
    .bind(&new.subject)
    .bind(new.execution_time)
    .bind(&new.bank_id)
    .bind(&new.wtid)
    .bind(&new.exchange_base_url)
    .bind(linked_id)
    .fetch_optional(pool)
    .await?;

    if let (Some(row), Some(initiation_id)) = (&row, linked_id) {
        let _ = row;
        sqlx::query("UPDATE initiated SET state = 'confirmed', confirmation_tx = $2 WHERE id = $1")
            .bind(initiation_id)
            .bind(&new.bank_id)
            .execute(pool)
            .await?;
    }

    Ok(match row {
        Some(row) => RecordOutcome::Created(row.into()),
        None => RecordOutcome::Duplicate,
    })
}

pub async fn page(
    pool: &DbPool,
    after_id: i64,
    ascending: bool,
    limit: i64,
) -> Result<Vec<OutgoingPayment>> {
    let query = if ascending {
        "SELECT id, amount, currency, credit_payto, subject, execution_time, bank_id, wtid, exchange_base_url, initiated_payment \
         FROM outgoing WHERE id > $1 ORDER BY id ASC LIMIT $2"
    } else {
        "SELECT id, amount, currency, credit_payto, subject, execution_time, bank_id, wtid, exchange_base_url, initiated_payment \
         FROM outgoing WHERE id < $1 ORDER BY id DESC LIMIT $2"
    };
    let rows: Vec<OutgoingRow> = sqlx::query_as(query)
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(OutgoingPayment::from).collect())
}
