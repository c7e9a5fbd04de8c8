//! Per-subscriber EBICS transaction mutex and per-IBAN notification
//! channels, both keyed in concurrent maps so submitter and fetcher tasks
//! for different subscribers never block on each other.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

const NOTIFY_CAPACITY: usize = 16;

/// Shared across every long-lived scheduler task and the HTTP facade's
/// long-poll handlers.
#[derive(Default)]
pub struct SchedulerRegistry {
    transaction_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    channels: DashMap<String, broadcast::Sender<()>>,
}

impl SchedulerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex guarding EBICS transactions for `subscriber_id`,
    /// creating one on first use.
    pub fn transaction_lock(&self, subscriber_id: Uuid) -> Arc<Mutex<()>> {
        self.transaction_locks
            .entry(subscriber_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn channel(&self, key: &str) -> broadcast::Sender<()> {
        if let Some(sender) = self.channels.get(key) {
            return sender.clone();
        }
        self.channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(NOTIFY_CAPACITY).0)
            .clone()
    }

    /// Wakes every current subscriber to `channel`; writers never block.
    pub fn notify(&self, channel: &str) {
        let sender = self.channel(channel);
        let _ = sender.send(());
    }

    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<()> {
        self.channel(channel).subscribe()
    }
}

pub fn incoming_channel(iban: &str) -> String {
    format!("incoming.{iban}")
}

pub fn outgoing_channel(iban: &str) -> String {
    format!("outgoing.{iban}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transaction_lock_is_stable_per_subscriber() {
        let registry = SchedulerRegistry::new();
        let id = Uuid::new_v4();
        let a = registry.transaction_lock(id);
        let b = registry.transaction_lock(id);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn notify_wakes_subscribed_receiver() {
        let registry = SchedulerRegistry::new();
        let mut rx = registry.subscribe(&incoming_channel("DE1234"));
        registry.notify(&incoming_channel("DE1234"));
        tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv())
            .await
            .expect("should not time out")
            .expect("channel should still be open");
    }
}
