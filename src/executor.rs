use log::warn;
use tokio::time::{Duration, sleep, timeout};

use crate::browser::Browser;
use crate::types::{AgentError, LastResult, Step, Tool};

/// Fixed upper bound on a single GOTO. Navigation past this fails the
/// call; every other operation inherits the backend's own bounds.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Dispatch one decided step against the browser backend.
///
/// EXTRACT and OBSERVE return a tagged payload for the next iteration's
/// perception; every other tool returns `None`. On any failure the open
/// session is released before the error propagates, so no error path
/// leaks a live browser context.
pub async fn execute<B: Browser>(
    browser: &mut B,
    step: &Step,
) -> Result<Option<LastResult>, AgentError> {
    match dispatch(browser, step).await {
        Ok(result) => Ok(result),
        Err(err) => {
            release(browser).await;
            Err(err)
        }
    }
}

async fn dispatch<B: Browser>(
    browser: &mut B,
    step: &Step,
) -> Result<Option<LastResult>, AgentError> {
    match step.tool {
        Tool::Goto => match timeout(NAVIGATION_TIMEOUT, browser.navigate(&step.instruction)).await
        {
            Ok(outcome) => outcome.map(|()| None),
            Err(_) => Err(AgentError::NavigationTimeout(step.instruction.clone())),
        },
        Tool::Act => browser.act(&step.instruction).await.map(|()| None),
        Tool::Extract => browser
            .extract(&step.instruction)
            .await
            .map(|payload| Some(LastResult::Extraction(payload))),
        Tool::Observe => browser
            .observe(&step.instruction)
            .await
            .map(|elements| Some(LastResult::Observation(elements))),
        Tool::Wait => {
            let millis = parse_wait_millis(&step.instruction)?;
            sleep(Duration::from_millis(millis)).await;
            Ok(None)
        }
        Tool::Navback => browser.go_back().await.map(|()| None),
        Tool::Close => browser.close().await.map(|()| None),
    }
}

/// Capture the current page for the decider's perception. Not part of
/// the step vocabulary the model can return.
pub async fn capture_screenshot<B: Browser>(browser: &mut B) -> Result<Vec<u8>, AgentError> {
    match browser.screenshot().await {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            release(browser).await;
            Err(err)
        }
    }
}

/// WAIT instructions carry a literal millisecond count. Anything else is
/// a contract violation, not a zero.
pub fn parse_wait_millis(instruction: &str) -> Result<u64, AgentError> {
    instruction.trim().parse::<u64>().map_err(|_| {
        AgentError::MalformedInstruction(format!(
            "WAIT expects a millisecond count, got {instruction:?}"
        ))
    })
}

async fn release<B: Browser>(browser: &mut B) {
    if let Err(err) = browser.close().await {
        warn!("failed to release browser session after error: {err}");
    }
}
