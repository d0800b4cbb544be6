//! Session lifecycle: store, login/logout manager, per-request validator,
//! and the periodic cleanup job.

pub mod cleanup;
pub mod manager;
pub mod store;
pub mod validator;

pub use cleanup::{CleanupReport, SessionCleanup};
pub use manager::SessionManager;
pub use store::SessionStore;
pub use validator::SessionValidator;
