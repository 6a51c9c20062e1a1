pub mod agent;
pub mod browser;
pub mod decider;
pub mod engine;
pub mod executor;
pub mod js;
pub mod model;
pub mod perception;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use agent::{Agent, DEFAULT_MAX_STEPS, RunOutcome, RunStatus};
pub use browser::Browser;
pub use engine::Engine;
pub use model::{Inference, OllamaModel, Prompt};
pub use session::{SessionOptions, WebDriverSession};
pub use types::{
    AgentError, LastResult, ObservedElement, StartingPoint, Step, Tool,
};
