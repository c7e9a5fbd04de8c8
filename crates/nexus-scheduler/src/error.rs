use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ebics_protocol::ProtocolError),

    #[error("statement parsing error: {0}")]
    Statement(#[from] iso20022::StatementError),

    #[error("domain error: {0}")]
    Domain(#[from] payment_domain::DomainError),

    #[error("store error: {0}")]
    Store(#[from] nexus_db::StoreError),

    #[error("xml build error: {0}")]
    XmlBuild(#[from] ebics_codec::xml::XmlBuildError),

    #[error("bank transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("subscriber {0} not ready to transact")]
    SubscriberNotReady(uuid::Uuid),

    #[error("shutdown requested")]
    ShuttingDown,
}
