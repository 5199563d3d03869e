//! The Agent interface (§6.1) — deliberately the thinnest possible
//! abstraction over "an LLM client". The scheduler treats it as opaque.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::AgentError;

/// `Agent(prompt) -> text`. Implementations must respect `deadline`: if the
/// underlying call can't honor it, they should return
/// [`AgentError::Timeout`] rather than block indefinitely.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, prompt: &str, deadline: Duration) -> Result<String, AgentError>;
}
