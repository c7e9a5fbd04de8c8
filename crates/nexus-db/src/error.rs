#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("request_uid {0:?} was already used with different fields")]
    RequestUidConflict(String),
    #[error("serializable transaction kept conflicting after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
