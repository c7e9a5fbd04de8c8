//! The `incoming` table: payments received from the bank, uniqued by
//! `bank_id` (the bank's own entry/transaction reference).

use crate::error::Result;
use crate::model::{IncomingPayment, NewIncomingPayment, RecordOutcome};
use crate::pool::DbPool;
use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow)]
struct IncomingRow {
    id: i64,
    amount: rust_decimal::Decimal,
    currency: String,
    debit_payto: String,
    subject: String,
    execution_time: DateTime<Utc>,
    bank_id: String,
    reserve_pub: Option<String>,
    refunded: bool,
}

impl From<IncomingRow> for IncomingPayment {
    fn from(row: IncomingRow) -> Self {
        IncomingPayment {
            id: row.id,
            amount: row.amount,
            currency: row.currency,
            debit_payto: row.debit_payto,
            subject: row.subject,
            execution_time: row.execution_time,
            bank_id: row.bank_id,
            reserve_pub: row.reserve_pub,
            refunded: row.refunded,
        }
    }
}

pub async fn record_if_new(
    pool: &DbPool,
    new: NewIncomingPayment,
) -> Result<RecordOutcome<IncomingPayment>> {
    let row: Option<IncomingRow> = sqlx::query_as(
        r#"
        INSERT INTO incoming (amount, currency, debit_payto, subject, execution_time, bank_id, reserve_pub)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (bank_id) DO NOTHING
        RETURNING id, amount, currency, debit_payto, subject, execution_time, bank_id, reserve_pub, refunded
        "#,
    )
    .bind(new.amount)
    .bind(&new.currency)
    .bind(&new.debit_payto)
    .bind(&new.subject)
    .bind(new.execution_time)
    .bind(&new.bank_id)
    .bind(&new.reserve_pub)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some(row) => RecordOutcome::Created(row.into()),
        None => RecordOutcome::Duplicate,
    })
}

pub async fn mark_refunded(pool: &DbPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE incoming SET refunded = true WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// True if `reserve_pub` is already attached to an earlier row — used to
/// decide whether a newly-matched token is actually usable or must be
/// treated as unmatched (triggering a refund) because of reuse.
pub async fn reserve_pub_already_used(pool: &DbPool, reserve_pub: &str) -> Result<bool> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM incoming WHERE reserve_pub = $1)")
            .bind(reserve_pub)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn page(
    pool: &DbPool,
    after_id: i64,
    ascending: bool,
    limit: i64,
) -> Result<Vec<IncomingPayment>> {
    let query = if ascending {
        "SELECT id, amount, currency, debit_payto, subject, execution_time, bank_id, reserve_pub, refunded \
         FROM incoming WHERE id > $1 ORDER BY id ASC LIMIT $2"
    } else {
        "SELECT id, amount, currency, debit_payto, subject, execution_time, bank_id, reserve_pub, refunded \
         FROM incoming WHERE id < $1 ORDER BY id DESC LIMIT $2"
    };
    let rows: Vec<IncomingRow> = sqlx::query_as(query)
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(IncomingPayment::from).collect())
}
