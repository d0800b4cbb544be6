//! Entity models backing the QABoard session and presence core.

pub mod session;
pub mod user;
