//! # qaboard-api
//!
//! HTTP API layer for QA Board built on Axum.
//!
//! Provides the auth endpoints, the server-sent event stream, the
//! cron-guarded cleanup endpoint, extractors, and DTOs.

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
