use async_trait::async_trait;

use crate::types::{AgentError, ObservedElement};

/// The interface the decision core needs from a browser-automation
/// backend. One implementor wraps one live browser context; the core
/// never looks inside the handle.
///
/// `close` must be idempotent: the loop releases the session on every
/// exit path and may reach an already-released backend.
#[async_trait]
pub trait Browser: Send {
    /// Navigate the context to `url`. Implementations wait until the
    /// navigation has committed; the executor owns the upper time bound.
    async fn navigate(&mut self, url: &str) -> Result<(), AgentError>;

    /// Perform exactly one UI action described in natural language.
    async fn act(&mut self, description: &str) -> Result<(), AgentError>;

    /// Pull data matching the description out of the current page.
    async fn extract(&mut self, description: &str) -> Result<String, AgentError>;

    /// Enumerate currently visible elements matching the description,
    /// in page order.
    async fn observe(&mut self, description: &str) -> Result<Vec<ObservedElement>, AgentError>;

    async fn current_url(&mut self) -> Result<String, AgentError>;

    async fn go_back(&mut self) -> Result<(), AgentError>;

    /// Capture the current page as PNG bytes.
    async fn screenshot(&mut self) -> Result<Vec<u8>, AgentError>;

    /// Release the underlying browser resources.
    async fn close(&mut self) -> Result<(), AgentError>;
}
