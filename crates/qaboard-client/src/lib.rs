//! # qaboard-client
//!
//! Client-side building blocks for QA Board dashboards.
//!
//! The realtime agent is a pure state machine over transport events, so
//! reconnect and fallback behavior is testable without opening sockets.
//!
//! ## Modules
//!
//! - `agent` — event stream connection state machine with backoff and
//!   polling fallback
//! - `transport` — trait the agent's driver uses to open streams
//! - `watchdog` — idle warning and forced-logout timing

pub mod agent;
pub mod driver;
pub mod transport;
pub mod watchdog;

pub use agent::{AgentAction, AgentEvent, AgentState, RealtimeAgent};
pub use transport::StreamTransport;
pub use watchdog::{IdleVerdict, IdleWatchdog};
