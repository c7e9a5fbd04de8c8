//! The wire-gateway HTTP facade (C9): `/config`, `/transfer`,
//! `/history/incoming`, `/history/outgoing`, `/admin/add-incoming`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;
pub mod wire;

pub use auth::{CredentialStore, StaticCredentialStore};
pub use error::ApiError;
pub use handlers::routes;
pub use state::{AccountInfo, AppState};
