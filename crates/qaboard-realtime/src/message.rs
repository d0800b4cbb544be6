//! Stream message envelope shared by the server and connected clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages delivered over the event stream.
///
/// Unrecognized `type` values deserialize as `Unknown` so a newer server
/// cannot break an older client by adding message kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Initial acknowledgment carrying the server-assigned connection ID.
    Connected {
        /// Registry key for this connection.
        connection_id: String,
        /// Server time at registration.
        timestamp: DateTime<Utc>,
    },
    /// Server keepalive.
    Ping {
        /// Server time at send.
        timestamp: DateTime<Utc>,
    },
    /// A session row changed (login, logout, forced deactivation).
    SessionUpdate {
        /// Raw notification payload from the database trigger.
        data: serde_json::Value,
        /// Server time at fan-out.
        timestamp: DateTime<Utc>,
    },
    /// A user's online flag changed.
    UserStatus {
        /// Raw notification payload from the database trigger.
        data: serde_json::Value,
        /// Server time at fan-out.
        timestamp: DateTime<Utc>,
    },
    /// Any message kind this build does not know about.
    #[serde(other)]
    Unknown,
}

impl StreamMessage {
    /// Builds the stream message for a raw notification payload,
    /// dispatched on the payload's own `type` discriminator.
    ///
    /// A discriminator this build does not recognize becomes `Unknown`,
    /// which clients ignore. Only payloads with no `type` key at all fall
    /// back to `SessionUpdate`, the channel that carries the bulk of the
    /// traffic.
    pub fn from_notification(payload: serde_json::Value, now: DateTime<Utc>) -> Self {
        match payload.get("type").and_then(|t| t.as_str()) {
            Some("user_status") => StreamMessage::UserStatus {
                data: payload,
                timestamp: now,
            },
            Some("session_update") | None => StreamMessage::SessionUpdate {
                data: payload,
                timestamp: now,
            },
            Some(_) => StreamMessage::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_falls_back() {
        let msg: StreamMessage =
            serde_json::from_str(r#"{"type":"something_new","data":{}}"#).unwrap();
        assert_eq!(msg, StreamMessage::Unknown);
    }

    #[test]
    fn ping_round_trips() {
        let msg = StreamMessage::Ping {
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"ping""#));
        let back: StreamMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn notification_dispatch_uses_payload_type() {
        let now = Utc::now();
        let status = StreamMessage::from_notification(
            serde_json::json!({"type": "user_status", "user_id": "u1", "is_online": false}),
            now,
        );
        assert!(matches!(status, StreamMessage::UserStatus { .. }));

        let session = StreamMessage::from_notification(
            serde_json::json!({"type": "session_update", "session_id": "s1"}),
            now,
        );
        assert!(matches!(session, StreamMessage::SessionUpdate { .. }));

        let untyped = StreamMessage::from_notification(serde_json::json!({"foo": 1}), now);
        assert!(matches!(untyped, StreamMessage::SessionUpdate { .. }));
    }

    #[test]
    fn unrecognized_discriminator_is_unknown() {
        // A newer trigger's message kind must not make clients revalidate.
        let msg = StreamMessage::from_notification(
            serde_json::json!({"type": "schema_changed", "table": "results"}),
            Utc::now(),
        );
        assert_eq!(msg, StreamMessage::Unknown);
    }
}
