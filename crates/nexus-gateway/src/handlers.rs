//! The five wire-gateway endpoints. Router assembly follows the teacher's
//! `src/handlers.rs::routes()` shape: one function builds the whole tree,
//! CORS/trace layers are applied once by the caller in `main`.

use crate::auth::require_basic_auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::wire::{
    AddIncomingRequest, AddIncomingResponse, ConfigResponse, HistoryQuery, IncomingHistory,
    IncomingReserveTransaction, OutgoingHistory, OutgoingTransaction, TransferRequest, TransferResponse,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::Utc;
use nexus_db::model::{NewIncomingPayment, NewInitiatedPayment, RecordOutcome};
use nexus_db::DbPool;
use nexus_scheduler::SchedulerRegistry;
use payment_domain::{Payto, TalerTimestamp};
use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Builds the full router for one [`AppState`]. `/config` is public;
/// everything else sits behind HTTP Basic auth, per spec.md §4.9.
pub fn routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/transfer", post(post_transfer))
        .route("/history/incoming", get(get_history_incoming))
        .route("/history/outgoing", get(get_history_outgoing))
        .route("/admin/add-incoming", post(post_add_incoming))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    Router::new()
        .route("/config", get(get_config))
        .merge(protected)
        .with_state(state)
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ConfigResponse {
        version: env!("CARGO_PKG_VERSION"),
        name: "taler-wire-gateway",
        currency: state.account.currency.clone(),
    })
}

fn split_amount(text: &str) -> Result<(Decimal, String), ApiError> {
    let (currency, value) = text
        .split_once(':')
        .ok_or_else(|| ApiError::Malformed(format!("amount {text:?} missing currency prefix")))?;
    let amount: Decimal = value
        .parse()
        .map_err(|_| ApiError::Malformed(format!("amount {text:?} is not a valid decimal")))?;
    Ok((amount, currency.to_string()))
}

fn format_amount(amount: Decimal, currency: &str) -> String {
    format!("{}:{}", currency, amount.normalize())
}

async fn post_transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<Response, ApiError> {
    let (amount, currency) = split_amount(&req.amount)?;
    let (credit_account, _params) = Payto::parse(&req.credit_account)?;
    let subject = format!("{} {}", req.wtid, req.exchange_base_url);

    let new = NewInitiatedPayment {
        amount,
        currency,
        subject,
        credit_payto: credit_account.canonical(),
        request_uid: req.request_uid,
    };
    let row = nexus_db::initiated::create(&state.pool, new).await?;

    Ok((
        StatusCode::OK,
        Json(TransferResponse {
            timestamp: TalerTimestamp::from_unix_seconds(row.initiation_time.timestamp().max(0) as u64),
            row_id: row.id,
        }),
    )
        .into_response())
}

async fn post_add_incoming(
    State(state): State<AppState>,
    Json(req): Json<AddIncomingRequest>,
) -> Result<Response, ApiError> {
    let (amount, currency) = split_amount(&req.amount)?;
    let (debit_account, _params) = Payto::parse(&req.debit_account)?;

    let new = NewIncomingPayment {
        amount,
        currency,
        debit_payto: debit_account.canonical(),
        subject: format!("simulated deposit {}", req.reserve_pub),
        execution_time: Utc::now(),
        bank_id: format!("admin-{}", Uuid::new_v4()),
        reserve_pub: Some(req.reserve_pub),
    };
    let outcome = nexus_db::incoming::record_if_new(&state.pool, new).await?;
    let row = match outcome {
        RecordOutcome::Created(row) => row,
        RecordOutcome::Duplicate => {
            return Err(ApiError::Internal(
                "admin-inserted incoming payment collided with an existing bank_id".to_string(),
            ))
        }
    };

    let channel = nexus_scheduler::incoming_channel(&state.account.iban);
    state.registry.notify(&channel);
    nexus_db::notify::notify(&state.pool, &channel).await?;

    Ok((
        StatusCode::OK,
        Json(AddIncomingResponse {
            timestamp: TalerTimestamp::from_unix_seconds(row.execution_time.timestamp().max(0) as u64),
            row_id: row.id,
        }),
    )
        .into_response())
}

/// `delta`/`start` → `(start, ascending, limit)` per spec.md §4.9: positive
/// delta paginates ascending strictly after `start` (default 0); negative
/// delta paginates descending strictly before `start` (default `i64::MAX`).
fn resolve_pagination(query: &HistoryQuery) -> Result<(i64, bool, i64), ApiError> {
    let delta = query.delta.unwrap_or(0);
    if delta == 0 {
        return Err(ApiError::Malformed("delta must be nonzero".to_string()));
    }
    let ascending = delta > 0;
    let start = query
        .start
        .unwrap_or(if ascending { 0 } else { i64::MAX });
    let limit = delta.unsigned_abs() as i64;
    Ok((start, ascending, limit))
}

async fn get_history_incoming(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let (start, ascending, limit) = resolve_pagination(&query)?;
    let channel = nexus_scheduler::incoming_channel(&state.account.iban);

    let rows = poll_until(
        &state.registry,
        &channel,
        ascending,
        query.long_poll_ms,
        || nexus_db::incoming::page(&state.pool, start, ascending, limit),
        limit,
    )
    .await?;

    if rows.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let incoming_transactions = rows
        .into_iter()
        .map(|row| IncomingReserveTransaction {
            kind: "RESERVE",
            row_id: row.id,
            date: TalerTimestamp::from_unix_seconds(row.execution_time.timestamp().max(0) as u64),
            amount: format_amount(row.amount, &row.currency),
            debit_account: row.debit_payto,
            reserve_pub: row.reserve_pub.unwrap_or_default(),
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(IncomingHistory {
            incoming_transactions,
            credit_account: state.account.payto(),
        }),
    )
        .into_response())
}

async fn get_history_outgoing(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let (start, ascending, limit) = resolve_pagination(&query)?;
    let channel = nexus_scheduler::outgoing_channel(&state.account.iban);

    let rows = poll_until(
        &state.registry,
        &channel,
        ascending,
        query.long_poll_ms,
        || nexus_db::outgoing::page(&state.pool, start, ascending, limit),
        limit,
    )
    .await?;

    if rows.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let outgoing_transactions = rows
        .into_iter()
        .map(|row| OutgoingTransaction {
            row_id: row.id,
            date: TalerTimestamp::from_unix_seconds(row.execution_time.timestamp().max(0) as u64),
            amount: format_amount(row.amount, &row.currency),
            credit_account: row.credit_payto,
            wtid: row.wtid.unwrap_or_default(),
            exchange_base_url: row.exchange_base_url.unwrap_or_default(),
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(OutgoingHistory {
            outgoing_transactions,
            debit_account: state.account.payto(),
        }),
    )
        .into_response())
}

/// Runs `query_once`, and if fewer than `limit` rows matched, `ascending` is
/// true (negative-delta long-poll is non-blocking per spec.md §9's Open
/// Question resolution) and the caller supplied `long_poll_ms > 0`,
/// subscribes to `channel` and re-runs `query_once` on every notification
/// until either enough rows accumulate or the deadline elapses.
async fn poll_until<T, F, Fut>(
    registry: &SchedulerRegistry,
    channel: &str,
    ascending: bool,
    long_poll_ms: Option<u64>,
    mut query_once: F,
    limit: i64,
) -> Result<Vec<T>, nexus_db::StoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = nexus_db::Result<Vec<T>>>,
{
    let mut rows = query_once().await?;
    let long_poll_ms = long_poll_ms.unwrap_or(0);
    if !ascending || long_poll_ms == 0 || rows.len() as i64 >= limit {
        return Ok(rows);
    }

    let mut receiver = registry.subscribe(channel);
    let deadline = Instant::now() + Duration::from_millis(long_poll_ms);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(rows);
        }
        tokio::select! {
            result = receiver.recv() => {
                if result.is_err() {
                    return Ok(rows);
                }
                rows = query_once().await?;
                if rows.len() as i64 >= limit {
                    return Ok(rows);
                }
            }
            _ = tokio::time::sleep(remaining) => return Ok(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_currency_and_value() {
        let (amount, currency) = split_amount("EUR:1.50").unwrap();
        assert_eq!(currency, "EUR");
        assert_eq!(amount, Decimal::new(150, 2));
    }

    #[test]
    fn rejects_amount_without_currency() {
        assert!(split_amount("1.50").is_err());
    }

    #[test]
    fn pagination_defaults_ascending_from_zero() {
        let query = HistoryQuery { delta: Some(5), start: None, long_poll_ms: None };
        let (start, ascending, limit) = resolve_pagination(&query).unwrap();
        assert_eq!((start, ascending, limit), (0, true, 5));
    }

    #[test]
    fn pagination_defaults_descending_from_max() {
        let query = HistoryQuery { delta: Some(-5), start: None, long_poll_ms: None };
        let (start, ascending, limit) = resolve_pagination(&query).unwrap();
        assert_eq!((start, ascending, limit), (i64::MAX, false, 5));
    }

    #[test]
    fn zero_delta_is_rejected() {
        let query = HistoryQuery { delta: Some(0), start: None, long_poll_ms: None };
        assert!(resolve_pagination(&query).is_err());
    }
}
