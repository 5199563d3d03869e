//! NotificationDispatcher (C9, §4.9): fans an execution result out across a
//! task's notification channels and aggregates the per-channel outcome.

use std::sync::Arc;

use scheduler_kernel::notify::NotificationSink;
use scheduler_kernel::task::{NotificationChannel, UserId};
use tracing::warn;

/// Per-channel delivery outcome for one dispatch call.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub delivered: Vec<NotificationChannel>,
    pub failed: Vec<NotificationChannel>,
}

impl DispatchReport {
    /// §4.9: at least one success is sufficient to consider the execution delivered.
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }
}

pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Sends `payload` to every channel in `channels`, never short-circuiting
    /// on an individual failure.
    pub async fn dispatch(&self, channels: &[NotificationChannel], user_id: UserId, payload: &str) -> DispatchReport {
        let mut delivered = Vec::new();
        let mut failed = Vec::new();

        for &channel in channels {
            match self.sink.send(channel, user_id, payload).await {
                Ok(()) => delivered.push(channel),
                Err(err) => {
                    warn!(channel = %channel, %user_id, error = %err, "notification dispatch failed");
                    failed.push(channel);
                }
            }
        }

        DispatchReport { delivered, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scheduler_kernel::notify::DispatchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct FlakySink {
        fail_channels: Vec<NotificationChannel>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn send(&self, channel: NotificationChannel, _user_id: UserId, _payload: &str) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_channels.contains(&channel) {
                Err(DispatchError {
                    channel,
                    reason: "simulated failure".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn reports_partial_failure_without_short_circuiting() {
        let sink = Arc::new(FlakySink {
            fail_channels: vec![NotificationChannel::Sms],
            calls: AtomicUsize::new(0),
        });
        let dispatcher = NotificationDispatcher::new(sink.clone());
        let report = dispatcher
            .dispatch(&[NotificationChannel::Sms, NotificationChannel::Email], Uuid::new_v4(), "hello")
            .await;

        assert_eq!(report.delivered, vec![NotificationChannel::Email]);
        assert_eq!(report.failed, vec![NotificationChannel::Sms]);
        assert!(report.any_delivered());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn all_failures_yields_no_delivery() {
        let sink = Arc::new(FlakySink {
            fail_channels: vec![NotificationChannel::Push],
            calls: AtomicUsize::new(0),
        });
        let dispatcher = NotificationDispatcher::new(sink);
        let report = dispatcher.dispatch(&[NotificationChannel::Push], Uuid::new_v4(), "hello").await;

        assert!(!report.any_delivered());
        assert_eq!(report.failed, vec![NotificationChannel::Push]);
    }
}
