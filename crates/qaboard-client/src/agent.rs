//! Event stream connection state machine.
//!
//! The agent never performs I/O. A driver feeds it transport events and
//! executes the actions it returns, so every reconnect and fallback path
//! is a plain function call in tests.

use std::time::Duration;

use tracing::debug;

use qaboard_realtime::message::StreamMessage;

/// Reconnect attempts before giving up on streaming.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Poll interval once streaming has been abandoned.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Delay scheduled after failure number `attempt` (zero-based).
///
/// Doubles from one second and saturates at thirty.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let exp = 1u64 << attempt.min(15);
    Duration::from_millis(1000u64.saturating_mul(exp).min(30_000))
}

/// Where the agent currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// No stream and none wanted.
    Disconnected,
    /// Stream requested or retrying; `attempt` counts failures so far.
    Connecting {
        /// Failed attempts since the last successful open.
        attempt: u32,
    },
    /// Stream open and delivering.
    Connected,
    /// Streaming abandoned; surviving on interval polling.
    Polling,
}

/// Input to one transition.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Caller wants realtime updates (login, page load, manual retry).
    ConnectRequested,
    /// Transport reports the stream is open.
    StreamOpened,
    /// A message arrived on the stream.
    MessageReceived(StreamMessage),
    /// The stream failed or ended unexpectedly.
    StreamFailed,
    /// A scheduled retry delay elapsed.
    RetryElapsed,
    /// A polling interval elapsed.
    PollTick,
    /// Caller is logging out; tear everything down.
    LogoutRequested,
}

/// Side effect for the driver to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    /// Open a fresh stream.
    OpenStream,
    /// Close the current stream if one is open.
    CloseStream,
    /// Call back with `RetryElapsed` after the delay.
    ScheduleRetry(Duration),
    /// Begin interval polling at the given period.
    StartPolling(Duration),
    /// Stop interval polling.
    StopPolling,
    /// Revalidate the session and refetch presence state.
    Revalidate,
}

/// The connection state machine.
#[derive(Debug)]
pub struct RealtimeAgent {
    state: AgentState,
}

impl RealtimeAgent {
    /// Creates an agent in the disconnected state.
    pub fn new() -> Self {
        Self {
            state: AgentState::Disconnected,
        }
    }

    /// Current state, for drivers that surface connection status in UI.
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Applies one event, returning the actions the driver must run.
    pub fn transition(&mut self, event: AgentEvent) -> Vec<AgentAction> {
        let (next, actions) = match (self.state, event) {
            // Starting up, or escaping polling back to streaming.
            (AgentState::Disconnected, AgentEvent::ConnectRequested) => (
                AgentState::Connecting { attempt: 0 },
                vec![AgentAction::OpenStream],
            ),
            (AgentState::Polling, AgentEvent::ConnectRequested) => (
                AgentState::Connecting { attempt: 0 },
                vec![AgentAction::StopPolling, AgentAction::OpenStream],
            ),

            (AgentState::Connecting { .. }, AgentEvent::StreamOpened) => {
                (AgentState::Connected, vec![])
            }
            (AgentState::Connecting { .. }, AgentEvent::RetryElapsed) => (
                self.state,
                vec![AgentAction::OpenStream],
            ),
            (AgentState::Connecting { attempt }, AgentEvent::StreamFailed) => {
                let failures = attempt + 1;
                if failures >= MAX_RECONNECT_ATTEMPTS {
                    debug!(failures, "Streaming abandoned, falling back to polling");
                    (
                        AgentState::Polling,
                        vec![AgentAction::StartPolling(POLL_INTERVAL)],
                    )
                } else {
                    // The delay is keyed to the failure that just happened,
                    // so the first retry waits one second.
                    (
                        AgentState::Connecting { attempt: failures },
                        vec![AgentAction::ScheduleRetry(reconnect_delay(attempt))],
                    )
                }
            }

            // An established stream failing restarts the attempt count:
            // the link worked moments ago, so retry from the short end.
            (AgentState::Connected, AgentEvent::StreamFailed) => (
                AgentState::Connecting { attempt: 1 },
                vec![AgentAction::ScheduleRetry(reconnect_delay(0))],
            ),

            (AgentState::Connected, AgentEvent::MessageReceived(message)) => {
                let actions = match message {
                    StreamMessage::SessionUpdate { .. } | StreamMessage::UserStatus { .. } => {
                        vec![AgentAction::Revalidate]
                    }
                    // Keepalives, the registration ack, and anything this
                    // build does not understand carry no state.
                    StreamMessage::Ping { .. }
                    | StreamMessage::Connected { .. }
                    | StreamMessage::Unknown => vec![],
                };
                (AgentState::Connected, actions)
            }

            (AgentState::Polling, AgentEvent::PollTick) => {
                (AgentState::Polling, vec![AgentAction::Revalidate])
            }

            (_, AgentEvent::LogoutRequested) => (
                AgentState::Disconnected,
                vec![AgentAction::CloseStream, AgentAction::StopPolling],
            ),

            // Stale events for the current state carry nothing.
            (state, event) => {
                debug!(?state, ?event, "Ignored stale agent event");
                (state, vec![])
            }
        };

        self.state = next;
        actions
    }
}

impl Default for RealtimeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn connect(agent: &mut RealtimeAgent) {
        let actions = agent.transition(AgentEvent::ConnectRequested);
        assert_eq!(actions, vec![AgentAction::OpenStream]);
    }

    #[test]
    fn happy_path_opens_and_listens() {
        let mut agent = RealtimeAgent::new();
        connect(&mut agent);
        agent.transition(AgentEvent::StreamOpened);
        assert_eq!(agent.state(), AgentState::Connected);

        let actions = agent.transition(AgentEvent::MessageReceived(StreamMessage::SessionUpdate {
            data: serde_json::json!({}),
            timestamp: Utc::now(),
        }));
        assert_eq!(actions, vec![AgentAction::Revalidate]);
    }

    #[test]
    fn pings_and_unknown_messages_are_inert() {
        let mut agent = RealtimeAgent::new();
        connect(&mut agent);
        agent.transition(AgentEvent::StreamOpened);

        let ping = agent.transition(AgentEvent::MessageReceived(StreamMessage::Ping {
            timestamp: Utc::now(),
        }));
        assert!(ping.is_empty());

        let unknown = agent.transition(AgentEvent::MessageReceived(StreamMessage::Unknown));
        assert!(unknown.is_empty());
        assert_eq!(agent.state(), AgentState::Connected);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let delays: Vec<u64> = (0..6)
            .map(|a| reconnect_delay(a).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000]);

        // Non-decreasing over a wide range, including shift-heavy inputs.
        let mut prev = 0;
        for attempt in 0..64 {
            let d = reconnect_delay(attempt).as_millis() as u64;
            assert!(d >= prev);
            assert!(d <= 30_000);
            prev = d;
        }
    }

    #[test]
    fn five_failures_fall_back_to_polling() {
        let mut agent = RealtimeAgent::new();
        connect(&mut agent);

        for failure in 1..MAX_RECONNECT_ATTEMPTS {
            let actions = agent.transition(AgentEvent::StreamFailed);
            // Delays run 1s, 2s, 4s, 8s across the first four failures.
            assert_eq!(
                actions,
                vec![AgentAction::ScheduleRetry(reconnect_delay(failure - 1))]
            );
            assert_eq!(
                agent.transition(AgentEvent::RetryElapsed),
                vec![AgentAction::OpenStream]
            );
        }

        // Fifth failure: no sixth attempt, polling instead.
        let actions = agent.transition(AgentEvent::StreamFailed);
        assert_eq!(actions, vec![AgentAction::StartPolling(POLL_INTERVAL)]);
        assert_eq!(agent.state(), AgentState::Polling);

        assert_eq!(
            agent.transition(AgentEvent::PollTick),
            vec![AgentAction::Revalidate]
        );
    }

    #[test]
    fn established_stream_failure_retries_from_short_delay() {
        let mut agent = RealtimeAgent::new();
        connect(&mut agent);
        agent.transition(AgentEvent::StreamOpened);

        let actions = agent.transition(AgentEvent::StreamFailed);
        assert_eq!(
            actions,
            vec![AgentAction::ScheduleRetry(reconnect_delay(0))]
        );
        assert_eq!(agent.state(), AgentState::Connecting { attempt: 1 });
    }

    #[test]
    fn connect_request_escapes_polling() {
        let mut agent = RealtimeAgent::new();
        connect(&mut agent);
        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            agent.transition(AgentEvent::StreamFailed);
            agent.transition(AgentEvent::RetryElapsed);
        }
        assert_eq!(agent.state(), AgentState::Polling);

        let actions = agent.transition(AgentEvent::ConnectRequested);
        assert_eq!(
            actions,
            vec![AgentAction::StopPolling, AgentAction::OpenStream]
        );
        assert_eq!(agent.state(), AgentState::Connecting { attempt: 0 });
    }

    #[test]
    fn logout_tears_down_from_any_state() {
        for setup in [0, 1, 2] {
            let mut agent = RealtimeAgent::new();
            match setup {
                1 => {
                    connect(&mut agent);
                    agent.transition(AgentEvent::StreamOpened);
                }
                2 => {
                    connect(&mut agent);
                    for _ in 0..MAX_RECONNECT_ATTEMPTS {
                        agent.transition(AgentEvent::StreamFailed);
                        agent.transition(AgentEvent::RetryElapsed);
                    }
                }
                _ => {}
            }

            let actions = agent.transition(AgentEvent::LogoutRequested);
            assert_eq!(
                actions,
                vec![AgentAction::CloseStream, AgentAction::StopPolling]
            );
            assert_eq!(agent.state(), AgentState::Disconnected);
        }
    }
}
