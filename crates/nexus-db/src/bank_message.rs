//! Raw EBICS downloads, kept around so a parse bug can be fixed and
//! replayed without re-fetching from the bank.

use crate::error::Result;
use crate::model::{BankMessage, BankMessageCode};
use crate::pool::DbPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct BankMessageRow {
    id: i64,
    subscriber_id: Uuid,
    timestamp: DateTime<Utc>,
    code: BankMessageCode,
    content: Vec<u8>,
    processed: bool,
    errors: bool,
}

impl From<BankMessageRow> for BankMessage {
    fn from(row: BankMessageRow) -> Self {
        BankMessage {
            id: row.id,
            subscriber_id: row.subscriber_id,
            timestamp: row.timestamp,
            code: row.code,
            content: row.content,
            processed: row.processed,
            errors: row.errors,
        }
    }
}

pub async fn append(
    pool: &DbPool,
    subscriber_id: Uuid,
    code: BankMessageCode,
    content: &[u8],
) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO bank_message (subscriber_id, code, content) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(subscriber_id)
    .bind(code)
    .bind(content)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn unseen(pool: &DbPool, subscriber_id: Uuid) -> Result<Vec<BankMessage>> {
    let rows: Vec<BankMessageRow> = sqlx::query_as(
        r#"
        SELECT id, subscriber_id, timestamp, code, content, processed, errors
        FROM bank_message WHERE subscriber_id = $1 AND processed = false
        ORDER BY id ASC
        "#,
    )
    .bind(subscriber_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(BankMessage::from).collect())
}

pub async fn mark_processed(pool: &DbPool, id: i64, errors: bool) -> Result<()> {
    sqlx::query("UPDATE bank_message SET processed = true, errors = $2 WHERE id = $1")
        .bind(id)
        .bind(errors)
        .execute(pool)
        .await?;
    Ok(())
}
