//! Runs a closure inside a `SERIALIZABLE` transaction, retrying on
//! Postgres serialization failures (SQLSTATE `40001`) a bounded number of
//! times before surfacing the error.

use crate::error::{Result, StoreError};
use crate::pool::DbPool;
use sqlx::{Postgres, Transaction};
use std::future::Future;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 10;
const SERIALIZATION_FAILURE: &str = "40001";

fn is_serialization_failure(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(SERIALIZATION_FAILURE))
}

/// Runs `body` inside a serializable transaction. `body` receives the open
/// transaction and commits by returning `Ok`; the helper itself issues the
/// `COMMIT`. On a serialization failure it rolls back implicitly (the
/// transaction is dropped) and retries with a fresh one.
pub async fn serializable<T, F, Fut>(pool: &DbPool, mut body: F) -> Result<T>
where
    F: FnMut(&mut Transaction<'_, Postgres>) -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        match body(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                return Ok(value);
            }
            Err(err) if is_serialization_failure(&err) && attempt < MAX_ATTEMPTS => {
                warn!(attempt, "serialization failure, retrying transaction");
                continue;
            }
            Err(err) => return Err(StoreError::Database(err)),
        }
    }
    Err(StoreError::RetriesExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_serialization_failure_sqlstate() {
        let err = sqlx::Error::Protocol("not a db error".into());
        assert!(!is_serialization_failure(&err));
    }
}
