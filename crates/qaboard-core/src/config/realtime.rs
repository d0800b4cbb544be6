//! Real-time push configuration.

use serde::{Deserialize, Serialize};

/// Real-time push (SSE) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Keep-alive ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Interval in seconds between registry liveness sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Seconds since last ping before a connection is evicted.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    /// Per-connection outbound channel buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ping_interval_seconds: default_ping_interval(),
            sweep_interval_seconds: default_sweep_interval(),
            connection_timeout_seconds: default_connection_timeout(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_ping_interval() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_connection_timeout() -> u64 {
    65
}

fn default_channel_buffer() -> usize {
    32
}
