//! In-memory handle on one configured subscriber: its EBICS connection
//! details plus the unsealed key material, held for the scheduler's
//! lifetime rather than re-derived from the passphrase on every use.

use ebics_protocol::{Dialect, Subscriber};
use uuid::Uuid;

pub struct SubscriberContext {
    pub id: Uuid,
    pub dialect: Dialect,
    pub host_id: String,
    pub partner_id: String,
    pub user_id: String,
    pub ebics_url: String,
    pub iban: String,
    pub bic: String,
    pub name: String,
    pub currency: String,
    pub subscriber: Subscriber,
}
