//! # qaboard-auth
//!
//! Authentication and session lifecycle management for the QA Board
//! dashboard.
//!
//! ## Modules
//!
//! - `jwt` — JWT token creation and validation
//! - `password` — Argon2id password hashing
//! - `session` — Session store, lifecycle manager, per-request validator,
//!   and the periodic cleanup job

pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use session::{CleanupReport, SessionCleanup, SessionManager, SessionStore, SessionValidator};
