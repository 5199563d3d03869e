//! The notification sink interface (§6.2). The scheduler fans a result out
//! to each of a task's channels via one of these; it never interprets
//! payload formatting.

use async_trait::async_trait;

use crate::task::{NotificationChannel, UserId};

#[derive(Debug, thiserror::Error)]
#[error("dispatch to {channel} failed: {reason}")]
pub struct DispatchError {
    pub channel: NotificationChannel,
    pub reason: String,
}

/// `Sink.Send(channel, user_id, payload) -> ok | error`.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(
        &self,
        channel: NotificationChannel,
        user_id: UserId,
        payload: &str,
    ) -> Result<(), DispatchError>;
}
