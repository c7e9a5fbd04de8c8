//! The single place a handler's error becomes an HTTP response, mirroring
//! how the teacher keeps one `IntoResponse` impl for its facilitator error
//! enum rather than mapping status codes inline in every handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Taler's numeric error-code space is a generated registry out of scope
/// for this gateway; these are the handful this facade actually emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalerErrorCode {
    GenericParameterMalformed,
    GenericUnauthorized,
    GenericJsonInvalid,
    GenericNotFound,
    NexusDuplicateRequestUid,
    NexusInternalInvariantFailure,
}

impl TalerErrorCode {
    fn code(self) -> u32 {
        match self {
            TalerErrorCode::GenericParameterMalformed => 11,
            TalerErrorCode::GenericJsonInvalid => 12,
            TalerErrorCode::GenericUnauthorized => 15,
            TalerErrorCode::GenericNotFound => 17,
            TalerErrorCode::NexusDuplicateRequestUid => 2000,
            TalerErrorCode::NexusInternalInvariantFailure => 2001,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed parameter: {0}")]
    Malformed(String),
    #[error("invalid request body: {0}")]
    InvalidJson(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("unknown route")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[from] nexus_db::StoreError),
    #[error("domain error: {0}")]
    Domain(#[from] payment_domain::DomainError),
    #[error("internal invariant failure: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u32,
    hint: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, TalerErrorCode) {
        match self {
            ApiError::Malformed(_) => (StatusCode::BAD_REQUEST, TalerErrorCode::GenericParameterMalformed),
            ApiError::InvalidJson(_) => (StatusCode::BAD_REQUEST, TalerErrorCode::GenericJsonInvalid),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, TalerErrorCode::GenericUnauthorized),
            ApiError::NotFound => (StatusCode::NOT_FOUND, TalerErrorCode::GenericNotFound),
            ApiError::Domain(_) => (StatusCode::BAD_REQUEST, TalerErrorCode::GenericParameterMalformed),
            ApiError::Store(nexus_db::StoreError::RequestUidConflict(uid)) => {
                let _ = uid;
                (StatusCode::CONFLICT, TalerErrorCode::NexusDuplicateRequestUid)
            }
            ApiError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, TalerErrorCode::NexusInternalInvariantFailure)
            }
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, TalerErrorCode::NexusInternalInvariantFailure)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request failed");
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            code: code.code(),
            hint: Some(self.to_string()),
            detail: None,
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(axum::http::header::WWW_AUTHENTICATE, "Basic".parse().unwrap());
        }
        response
    }
}
