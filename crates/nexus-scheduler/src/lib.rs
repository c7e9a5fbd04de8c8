//! The scheduler: long-lived submitter and fetcher tasks, one pair per
//! configured subscriber, plus the shared registry the HTTP facade's
//! long-poll handlers subscribe to.

pub mod error;
pub mod fetcher;
pub mod registry;
pub mod submitter;
pub mod subscriber_context;
pub mod transport;

pub use error::SchedulerError;
pub use fetcher::{fetch_once, run_fetcher};
pub use registry::{incoming_channel, outgoing_channel, SchedulerRegistry};
pub use submitter::{run_submitter, submit_next};
pub use subscriber_context::SubscriberContext;
pub use transport::BankClient;
