//! Shared state threaded through every handler via axum's `State` extractor,
//! generic the way `Facilitator` is in the teacher's `routes<A>()`.

use crate::auth::CredentialStore;
use nexus_db::DbPool;
use nexus_scheduler::SchedulerRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub registry: Arc<SchedulerRegistry>,
    pub credentials: Arc<dyn CredentialStore>,
    /// The account this facade speaks for. One gateway instance serves one
    /// EBICS subscriber's account, matching `libeufin-nexus`'s deployment
    /// model (spec.md's configuration table is one `[nexus-ebics]` section).
    pub account: AccountInfo,
}

#[derive(Clone)]
pub struct AccountInfo {
    pub iban: String,
    pub bic: Option<String>,
    pub currency: String,
}

impl AccountInfo {
    pub fn payto(&self) -> String {
        match &self.bic {
            Some(bic) => format!("payto://iban/{bic}/{}", self.iban),
            None => format!("payto://iban/{}", self.iban),
        }
    }
}
