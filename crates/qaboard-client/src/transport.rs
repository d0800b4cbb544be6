//! Transport abstraction the realtime agent is driven against.

use async_trait::async_trait;
use tokio::sync::mpsc;

use qaboard_core::error::AppError;
use qaboard_realtime::message::StreamMessage;

/// Opens event streams on behalf of the agent driver.
///
/// Production implementations open an SSE request against the server;
/// tests substitute a fake that yields scripted messages.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Opens a stream authenticated by the given bearer token.
    ///
    /// The receiver yields messages until the stream fails or is closed
    /// by the server.
    async fn open(&self, token: &str) -> Result<mpsc::Receiver<StreamMessage>, AppError>;
}
