//! # qaboard-realtime
//!
//! Real-time presence streaming for the QA Board dashboard.
//!
//! ## Modules
//!
//! - `message` — stream message envelope shared by server and clients
//! - `registry` — in-memory registry of open event stream connections
//! - `bridge` — PostgreSQL LISTEN/NOTIFY fan-out into the registry

pub mod bridge;
pub mod message;
pub mod registry;

pub use bridge::NotificationBridge;
pub use message::StreamMessage;
pub use registry::ConnectionRegistry;
