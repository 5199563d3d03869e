//! Default local backends for the two opaque external interfaces (§6.1,
//! §6.2). The engine treats `Agent` and `NotificationSink` as pluggable; a
//! real deployment would swap these for an LLM client and an SMS/email/push
//! provider. These exist so `scheduler serve` is runnable out of the box.

use async_trait::async_trait;
use std::time::Duration;

use scheduler_kernel::error::AgentError;
use scheduler_kernel::notify::{DispatchError, NotificationSink};
use scheduler_kernel::task::{NotificationChannel, UserId};
use tracing::info;

/// Acknowledges the prompt and echoes back a short structured response. Good
/// enough to exercise the full claim/execute/assess/dispatch pipeline without
/// requiring network access.
pub struct LoggingAgent;

#[async_trait]
impl scheduler_kernel::agent::Agent for LoggingAgent {
    async fn run(&self, prompt: &str, _deadline: Duration) -> Result<String, AgentError> {
        info!(prompt_len = prompt.len(), "running local agent backend");
        Ok("Acknowledged. Here's what I did: 1. Reviewed the task context. 2. Noted the deadline. \
            I'm here to help if anything changes before the next run."
            .to_string())
    }
}

/// Logs each notification instead of calling a real provider.
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn send(&self, channel: NotificationChannel, user_id: UserId, payload: &str) -> Result<(), DispatchError> {
        info!(%channel, %user_id, payload, "dispatching notification (local backend)");
        Ok(())
    }
}
