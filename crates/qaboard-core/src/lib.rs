//! Core building blocks shared by every QABoard crate: configuration
//! schemas, the unified error type, and the result alias.

pub mod config;
pub mod error;
pub mod result;

pub use error::{ApiErrorResponse, AppError, ErrorKind};
pub use result::AppResult;
