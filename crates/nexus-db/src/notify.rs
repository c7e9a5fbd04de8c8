//! Postgres `LISTEN`/`NOTIFY` wrapped for the HTTP facade's long-poll and
//! the scheduler's wake-ups on new incoming/outgoing rows.

use crate::error::Result;
use crate::pool::DbPool;
use sqlx::postgres::PgListener;
use std::time::Duration;
use tokio::time::timeout;

/// Sends a notification on `channel`, payload ignored by subscribers (they
/// just re-poll their query on wake).
pub async fn notify(pool: &DbPool, channel: &str) -> Result<()> {
    sqlx::query("SELECT pg_notify($1, '')")
        .bind(channel)
        .execute(pool)
        .await?;
    Ok(())
}

/// Subscribes to `channel` and waits up to `max_wait` for a notification.
/// Returns `true` if one arrived, `false` on timeout.
pub async fn wait_for_notification(
    pool: &DbPool,
    channel: &str,
    max_wait: Duration,
) -> Result<bool> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(channel).await?;
    match timeout(max_wait, listener.recv()).await {
        Ok(Ok(_)) => Ok(true),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Ok(false),
    }
}

/// The channel the fetcher notifies on when `incoming` gains rows for a
/// given account, matching the naming the long-poll handler subscribes to.
pub fn incoming_channel(iban: &str) -> String {
    format!("incoming.{iban}")
}

pub fn outgoing_channel(iban: &str) -> String {
    format!("outgoing.{iban}")
}
