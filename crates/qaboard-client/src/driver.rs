//! Async loop running a [`RealtimeAgent`] against a [`StreamTransport`].

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::warn;

use crate::agent::{AgentAction, AgentEvent, RealtimeAgent};
use crate::transport::StreamTransport;

/// Drives the agent until the revalidate receiver is dropped.
///
/// Every `Revalidate` action becomes a unit send on `revalidate_tx`; the
/// embedding app revalidates its session and refetches presence state on
/// each one. Dropping the receiver is the logout teardown: the next
/// revalidation attempt notices and the driver returns.
pub async fn drive(
    transport: &dyn StreamTransport,
    token: &str,
    revalidate_tx: mpsc::Sender<()>,
) {
    let mut agent = RealtimeAgent::new();
    let mut queue: VecDeque<AgentAction> =
        agent.transition(AgentEvent::ConnectRequested).into();
    let mut stream = None;
    let mut poll_interval: Option<tokio::time::Interval> = None;

    loop {
        if let Some(action) = queue.pop_front() {
            match action {
                AgentAction::OpenStream => match transport.open(token).await {
                    Ok(rx) => {
                        stream = Some(rx);
                        queue.extend(agent.transition(AgentEvent::StreamOpened));
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to open event stream");
                        queue.extend(agent.transition(AgentEvent::StreamFailed));
                    }
                },
                AgentAction::CloseStream => stream = None,
                AgentAction::ScheduleRetry(delay) => {
                    tokio::time::sleep(delay).await;
                    queue.extend(agent.transition(AgentEvent::RetryElapsed));
                }
                AgentAction::StartPolling(period) => {
                    let mut interval = tokio::time::interval(period);
                    // The fallback's first tick fires immediately; skip it
                    // so polling starts one period after the last failure.
                    interval.tick().await;
                    poll_interval = Some(interval);
                }
                AgentAction::StopPolling => poll_interval = None,
                AgentAction::Revalidate => {
                    if revalidate_tx.send(()).await.is_err() {
                        return;
                    }
                }
            }
            continue;
        }

        let event = if let Some(rx) = stream.as_mut() {
            match rx.recv().await {
                Some(message) => AgentEvent::MessageReceived(message),
                None => AgentEvent::StreamFailed,
            }
        } else if let Some(interval) = poll_interval.as_mut() {
            interval.tick().await;
            AgentEvent::PollTick
        } else {
            // Disconnected with nothing scheduled.
            return;
        };

        if event == AgentEvent::StreamFailed {
            stream = None;
        }
        queue.extend(agent.transition(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use qaboard_core::error::AppError;
    use qaboard_realtime::message::StreamMessage;

    /// Transport yielding one scripted stream, then failing forever.
    struct ScriptedTransport {
        opens: AtomicU32,
        script: Vec<StreamMessage>,
    }

    #[async_trait]
    impl StreamTransport for ScriptedTransport {
        async fn open(
            &self,
            _token: &str,
        ) -> Result<mpsc::Receiver<StreamMessage>, AppError> {
            if self.opens.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(AppError::stream_unavailable("scripted failure"));
            }
            let (tx, rx) = mpsc::channel(8);
            for message in &self.script {
                tx.try_send(message.clone()).unwrap();
            }
            Ok(rx)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stream_messages_trigger_revalidation() {
        let transport = Arc::new(ScriptedTransport {
            opens: AtomicU32::new(0),
            script: vec![
                StreamMessage::Ping {
                    timestamp: Utc::now(),
                },
                StreamMessage::SessionUpdate {
                    data: serde_json::json!({"session_id": "s1"}),
                    timestamp: Utc::now(),
                },
            ],
        });

        let (tx, mut rx) = mpsc::channel(8);
        let handle = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { drive(transport.as_ref(), "token", tx).await })
        };

        // One revalidation from the session update; the ping produces none.
        assert_eq!(rx.recv().await, Some(()));

        // Stream ends, retries fail, agent lands in polling; each poll
        // tick revalidates.
        assert_eq!(rx.recv().await, Some(()));

        // Dropping the receiver is logout; the driver exits.
        drop(rx);
        handle.await.unwrap();
    }
}
