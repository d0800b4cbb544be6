//! PostgreSQL LISTEN/NOTIFY fan-out into the connection registry.
//!
//! One subscriber per process, shared by every event stream connection.
//! The subscriber is started lazily by the first connection and restarted
//! lazily after a failure: a broken listener clears the flag and the next
//! connection attempt brings it back, so a process with no viewers holds
//! no LISTEN connection open.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tracing::{error, info, warn};

use qaboard_core::error::{AppError, ErrorKind};

use crate::message::StreamMessage;
use crate::registry::ConnectionRegistry;

/// Channels the bridge subscribes to.
const CHANNELS: [&str; 2] = ["session_updates", "user_status_updates"];

/// Bridges database notifications into the in-process registry.
pub struct NotificationBridge {
    pool: PgPool,
    registry: Arc<ConnectionRegistry>,
    listening: AtomicBool,
}

impl std::fmt::Debug for NotificationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBridge")
            .field("listening", &self.listening.load(Ordering::SeqCst))
            .finish()
    }
}

impl NotificationBridge {
    /// Creates a new bridge over the given pool and registry.
    pub fn new(pool: PgPool, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            pool,
            registry,
            listening: AtomicBool::new(false),
        }
    }

    /// Whether the listener task is currently believed to be running.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Ensures the listener task is running, starting it if needed.
    ///
    /// Idempotent: concurrent callers race on the flag and exactly one
    /// spawns the task. If subscription setup fails, the flag is cleared
    /// and the error is returned so the caller's connection attempt
    /// surfaces it; a later call retries from scratch.
    pub async fn ensure_listening(self: &Arc<Self>) -> Result<(), AppError> {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let mut listener = match self.subscribe().await {
            Ok(listener) => listener,
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        info!(channels = ?CHANNELS, "Notification listener started");

        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => bridge.dispatch(notification.payload()),
                    Err(e) => {
                        warn!(error = %e, "Notification listener lost; will restart on next connection");
                        break;
                    }
                }
            }
            bridge.listening.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    async fn subscribe(&self) -> Result<PgListener, AppError> {
        let mut listener = PgListener::connect_with(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to open notification listener", e)
        })?;

        listener.listen_all(CHANNELS).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to subscribe to notification channels",
                e,
            )
        })?;

        Ok(listener)
    }

    /// Parses one notification payload and broadcasts it to every
    /// registered connection. Malformed payloads are logged and dropped;
    /// one bad trigger must not kill the listener.
    fn dispatch(&self, payload: &str) {
        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Discarded malformed notification payload");
                return;
            }
        };

        let message = StreamMessage::from_notification(value, Utc::now());
        self.registry.broadcast(&message);
    }
}
