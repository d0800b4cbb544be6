//! In-memory registry of open event stream connections.
//!
//! Each connection owns an mpsc channel; dropping the sender side ends the
//! receiver stream, which is how eviction closes a client's event stream.
//! The registry is process-local state: cross-process delivery happens
//! through the database notification bridge, never through here.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use qaboard_core::config::RealtimeConfig;

use crate::message::StreamMessage;

/// One registered event stream connection.
#[derive(Debug)]
struct ConnectionEntry {
    /// Owning user.
    user_id: Uuid,
    /// Channel feeding the connection's event stream.
    sender: mpsc::Sender<StreamMessage>,
    /// Last time a keepalive was successfully queued.
    last_ping: DateTime<Utc>,
}

/// Thread-safe registry of all open event stream connections.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: DashMap<String, ConnectionEntry>,
    config: RealtimeConfig,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            connections: DashMap::new(),
            config,
        }
    }

    /// Registers a new connection for a user.
    ///
    /// Returns the connection ID and the receiver feeding the event
    /// stream. The first queued message is the `connected` acknowledgment.
    /// Multiple tabs register independently; the ID embeds the timestamp
    /// and a random component so they never collide.
    pub fn register(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> (String, mpsc::Receiver<StreamMessage>) {
        let connection_id = format!(
            "{}_{}_{}",
            user_id,
            now.timestamp_millis(),
            rand::random::<u32>()
        );

        let (sender, receiver) = mpsc::channel(self.config.channel_buffer_size);

        // Buffer is empty at this point, so the ack cannot fail.
        let _ = sender.try_send(StreamMessage::Connected {
            connection_id: connection_id.clone(),
            timestamp: now,
        });

        self.connections.insert(
            connection_id.clone(),
            ConnectionEntry {
                user_id,
                sender,
                last_ping: now,
            },
        );

        info!(
            user_id = %user_id,
            connection_id = %connection_id,
            total = self.connections.len(),
            "Event stream connection registered"
        );

        (connection_id, receiver)
    }

    /// Removes a connection, closing its stream.
    pub fn unregister(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            info!(
                connection_id = %connection_id,
                total = self.connections.len(),
                "Event stream connection removed"
            );
        }
    }

    /// Broadcasts a message to every registered connection.
    ///
    /// A connection whose receiver is gone is evicted immediately. A
    /// connection whose buffer is full just misses this message; if it
    /// stays saturated it also misses keepalives and the sweeper evicts
    /// it at the liveness deadline.
    pub fn broadcast(&self, message: &StreamMessage) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.connections.iter() {
            match entry.value().sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(entry.key().clone()),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(connection_id = %entry.key(), "Dropped broadcast for saturated connection");
                }
            }
        }

        for id in dead {
            self.unregister(&id);
        }

        delivered
    }

    /// Queues a keepalive ping on every connection.
    ///
    /// `last_ping` only advances when the ping actually queues, so a
    /// saturated or closed connection ages toward the liveness deadline.
    pub fn ping_all(&self, now: DateTime<Utc>) {
        let mut dead = Vec::new();

        for mut entry in self.connections.iter_mut() {
            match entry
                .value()
                .sender
                .try_send(StreamMessage::Ping { timestamp: now })
            {
                Ok(()) => entry.value_mut().last_ping = now,
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(entry.key().clone()),
                Err(mpsc::error::TrySendError::Full(_)) => {}
            }
        }

        for id in dead {
            self.unregister(&id);
        }
    }

    /// Evicts connections whose last successful ping is older than the
    /// liveness deadline. Returns the number evicted.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let deadline = Duration::seconds(self.config.connection_timeout_seconds as i64);

        let stale: Vec<String> = self
            .connections
            .iter()
            .filter(|entry| now - entry.value().last_ping > deadline)
            .map(|entry| entry.key().clone())
            .collect();

        let evicted = stale.len();
        for id in stale {
            self.unregister(&id);
        }

        if evicted > 0 {
            info!(evicted = evicted, "Swept stale event stream connections");
        }

        evicted
    }

    /// Number of currently registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// IDs of users with at least one open connection.
    pub fn connected_user_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .connections
            .iter()
            .map(|entry| entry.value().user_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Pings all connections on the configured keepalive interval.
    pub async fn run_keepalive(self: std::sync::Arc<Self>) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
            self.config.ping_interval_seconds,
        ));
        loop {
            ticker.tick().await;
            self.ping_all(Utc::now());
        }
    }

    /// Evicts stale connections on the configured sweep interval.
    pub async fn run_sweeper(self: std::sync::Arc<Self>) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
            self.config.sweep_interval_seconds,
        ));
        loop {
            ticker.tick().await;
            self.sweep(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConnectionRegistry {
        ConnectionRegistry::new(RealtimeConfig::default())
    }

    #[tokio::test]
    async fn register_queues_connected_ack() {
        let reg = registry();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let (conn_id, mut rx) = reg.register(user_id, now);
        assert!(conn_id.starts_with(&user_id.to_string()));

        match rx.recv().await {
            Some(StreamMessage::Connected { connection_id, .. }) => {
                assert_eq!(connection_id, conn_id);
            }
            other => panic!("expected connected ack, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_all_and_evicts_closed() {
        let reg = registry();
        let now = Utc::now();
        let (_id_a, mut rx_a) = reg.register(Uuid::new_v4(), now);
        let (_id_b, rx_b) = reg.register(Uuid::new_v4(), now);

        // Drain the ack, then drop one receiver entirely.
        rx_a.recv().await;
        drop(rx_b);

        let msg = StreamMessage::SessionUpdate {
            data: serde_json::json!({"session_id": "s1"}),
            timestamp: now,
        };
        let delivered = reg.broadcast(&msg);

        assert_eq!(delivered, 1);
        assert_eq!(reg.connection_count(), 1);
        assert_eq!(rx_a.recv().await, Some(msg));
    }

    #[tokio::test]
    async fn sweep_evicts_past_liveness_deadline() {
        let reg = registry();
        let now = Utc::now();
        let (_id, mut rx) = reg.register(Uuid::new_v4(), now);

        // Within the deadline nothing happens.
        assert_eq!(reg.sweep(now + Duration::seconds(65)), 0);
        // One second past it the connection goes, and the stream closes.
        assert_eq!(reg.sweep(now + Duration::seconds(66)), 1);
        assert_eq!(reg.connection_count(), 0);

        rx.recv().await; // connected ack
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn ping_advances_liveness() {
        let reg = registry();
        let now = Utc::now();
        let (_id, mut _rx) = reg.register(Uuid::new_v4(), now);

        let later = now + Duration::seconds(60);
        reg.ping_all(later);

        // Liveness now measured from the ping, not registration.
        assert_eq!(reg.sweep(now + Duration::seconds(70)), 0);
        assert_eq!(reg.connection_count(), 1);
    }

    #[tokio::test]
    async fn connected_users_deduplicates_tabs() {
        let reg = registry();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let (_a, _rx_a) = reg.register(user, now);
        let (_b, _rx_b) = reg.register(user, now);

        assert_eq!(reg.connection_count(), 2);
        assert_eq!(reg.connected_user_ids(), vec![user]);
    }
}
