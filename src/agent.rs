use log::{debug, info, warn};

use crate::browser::Browser;
use crate::decider;
use crate::executor;
use crate::model::Inference;
use crate::types::{AgentError, LastResult, Step, Tool};

pub const DEFAULT_MAX_STEPS: usize = 25;

/// How a run ended. `Exhausted` marks the iteration ceiling firing
/// without the model ever closing out the goal; `Failed` marks a run
/// torn down by an error (the error itself was surfaced to the caller).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Exhausted,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Terminated(RunStatus),
}

/// The control loop: ask the decider for a step, execute it, fold the
/// result back into history and perception, repeat until the terminal
/// tool, the step ceiling, or an unrecoverable failure.
///
/// One `Agent` is one run. The goal and backend handles are fixed at
/// construction; history grows monotonically and is discarded with the
/// agent. The terminal state is absorbing: a terminated agent performs
/// no further decider or executor calls.
pub struct Agent<B, M> {
    browser: B,
    model: M,
    goal: String,
    max_steps: usize,
    history: Vec<Step>,
    last_result: Option<LastResult>,
    state: State,
}

impl<B: Browser, M: Inference> Agent<B, M> {
    pub fn new(browser: B, model: M, goal: impl Into<String>) -> Self {
        Self {
            browser,
            model,
            goal: goal.into(),
            max_steps: DEFAULT_MAX_STEPS,
            history: Vec::new(),
            last_result: None,
            state: State::Running,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn history(&self) -> &[Step] {
        &self.history
    }

    /// Drive the run to termination. Re-invoking a terminated agent
    /// returns the recorded outcome without touching either backend.
    pub async fn run(&mut self) -> Result<RunOutcome, AgentError> {
        if let State::Terminated(status) = self.state {
            return Ok(RunOutcome {
                status,
                steps: self.history.clone(),
            });
        }

        match self.drive().await {
            Ok(status) => {
                self.state = State::Terminated(status);
                Ok(RunOutcome {
                    status,
                    steps: self.history.clone(),
                })
            }
            Err(err) => {
                self.release().await;
                self.state = State::Terminated(RunStatus::Failed);
                Err(err)
            }
        }
    }

    async fn drive(&mut self) -> Result<RunStatus, AgentError> {
        if self.history.is_empty() {
            let choice = decider::select_starting_point(&self.model, &self.goal).await?;
            info!("starting point: {} ({})", choice.url, choice.reasoning);
            let opening = Step {
                text: format!("Navigating to {}", choice.url),
                reasoning: choice.reasoning,
                tool: Tool::Goto,
                instruction: choice.url,
            };
            self.last_result = executor::execute(&mut self.browser, &opening).await?;
            self.history.push(opening);
        }

        loop {
            if self.history.len() >= self.max_steps {
                info!(
                    "step ceiling of {} reached without the goal being closed out",
                    self.max_steps
                );
                self.release().await;
                return Ok(RunStatus::Exhausted);
            }

            let (step, updated) = decider::decide_step(
                &self.model,
                &mut self.browser,
                &self.goal,
                &self.history,
                self.last_result.as_ref(),
            )
            .await?;

            info!(
                "step {} [{}]: {} ({})",
                updated.len(),
                step.tool,
                step.text,
                step.instruction
            );
            debug!("reasoning: {}", step.reasoning);

            self.last_result = executor::execute(&mut self.browser, &step).await?;
            let closed = step.tool == Tool::Close;
            self.history = updated;

            if closed {
                return Ok(RunStatus::Completed);
            }
        }
    }

    async fn release(&mut self) {
        if let Err(err) = self.browser.close().await {
            warn!("failed to release browser session: {err}");
        }
    }
}
