pub mod bank_message;
pub mod error;
pub mod incoming;
pub mod initiated;
pub mod model;
pub mod notify;
pub mod outgoing;
pub mod pool;
pub mod retry;
pub mod subscriber;

pub use error::{Result, StoreError};
pub use model::{
    BankMessage, BankMessageCode, IncomingPayment, InitiatedPayment, InitiationState,
    NewIncomingPayment, NewInitiatedPayment, NewOutgoingPayment, OutgoingPayment, RecordOutcome,
};
pub use pool::{create_pool, DbPool, PoolConfig};
pub use subscriber::SubscriberRow;
