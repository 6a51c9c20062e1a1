use log::warn;

use crate::browser::Browser;
use crate::executor;
use crate::types::{AgentError, LastResult, Step, Tool};

/// The transient bundle rebuilt for every decision: the page URL when it
/// can be read, and a screenshot once there is a page worth seeing.
#[derive(Debug, Clone, Default)]
pub struct Perception {
    pub current_url: Option<String>,
    pub screenshot: Option<Vec<u8>>,
}

/// Gather perception for the next decision.
///
/// The URL read is best-effort: a failure degrades to absent and is
/// logged, never treated as success of another kind. The screenshot is
/// attached if and only if the history already contains a GOTO; before
/// any navigation there is nothing meaningful to show.
pub async fn assemble<B: Browser>(
    browser: &mut B,
    history: &[Step],
) -> Result<Perception, AgentError> {
    let current_url = match browser.current_url().await {
        Ok(url) => Some(url),
        Err(err) => {
            warn!("could not read current url, deciding without it: {err}");
            None
        }
    };

    let screenshot = if has_navigated(history) {
        Some(executor::capture_screenshot(browser).await?)
    } else {
        None
    };

    Ok(Perception {
        current_url,
        screenshot,
    })
}

pub fn has_navigated(history: &[Step]) -> bool {
    history.iter().any(|step| step.tool == Tool::Goto)
}

/// The main text block of the decision prompt: goal, current URL when
/// known, the full formatted history, and the atomic-step guidelines.
pub fn step_text(goal: &str, current_url: Option<&str>, history: &[Step]) -> String {
    let url_part = current_url
        .map(|url| format!(" (URL: {url})"))
        .unwrap_or_default();
    let history_part = if history.is_empty() {
        String::new()
    } else {
        format!("Previous steps taken:\n{}\n\n", format_history(history))
    };

    format!(
        "Consider the following screenshot of a web page{url_part}, with the goal being \"{goal}\".\n{history_part}Determine the immediate next step to take to achieve the goal.\n\nImportant guidelines:\n1. Break down complex actions into individual atomic steps\n2. For ACT commands, use only one action at a time, such as:\n   - Single click on a specific element\n   - Type into a single input field\n   - Select a single option\n3. Avoid combining multiple actions in one instruction\n4. If multiple actions are needed, they should be separate steps\n\nIf the goal has been achieved, return \"close\"."
    )
}

/// Render the history the decider reads back. Each field is reproduced
/// verbatim; nothing is reformatted or elided.
pub fn format_history(history: &[Step]) -> String {
    history
        .iter()
        .enumerate()
        .map(|(index, step)| {
            format!(
                "Step {}:\n- Action: {}\n- Reasoning: {}\n- Tool Used: {}\n- Instruction: {}",
                index + 1,
                step.text,
                step.reasoning,
                step.tool,
                step.instruction
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Text block stating what the previous perception step produced.
pub fn last_result_block(last: &LastResult) -> String {
    let payload = match last {
        LastResult::Extraction(text) => text.clone(),
        LastResult::Observation(elements) => {
            serde_json::to_string(elements).unwrap_or_default()
        }
    };
    format!("The result of the previous {} is: {payload}.", last.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeBrowser, sample_element, step};

    #[tokio::test]
    async fn screenshot_is_absent_before_any_navigation() {
        let mut browser = FakeBrowser::new();
        let history = vec![step(Tool::Observe, "anything visible")];
        let perception = assemble(&mut browser, &history).await.unwrap();
        assert!(perception.screenshot.is_none());
        assert!(!browser.calls().contains(&"screenshot".to_string()));
    }

    #[tokio::test]
    async fn screenshot_is_attached_once_history_contains_a_goto() {
        let mut browser = FakeBrowser::new();
        let history = vec![
            step(Tool::Goto, "https://example.com/"),
            step(Tool::Act, "click the search box"),
        ];
        let perception = assemble(&mut browser, &history).await.unwrap();
        assert!(perception.screenshot.is_some());
        assert!(browser.calls().contains(&"screenshot".to_string()));
    }

    #[tokio::test]
    async fn url_read_failure_degrades_to_absent() {
        let mut browser = FakeBrowser::new();
        browser.url = None;
        let perception = assemble(&mut browser, &[]).await.unwrap();
        assert!(perception.current_url.is_none());
    }

    #[test]
    fn history_block_reproduces_every_field_verbatim() {
        let quirky = Step {
            text: "Typed \"rust async\" into the box".into(),
            reasoning: "the query must match the user's phrasing exactly".into(),
            tool: Tool::Act,
            instruction: "type \"rust async\" into [name=q]".into(),
        };
        let second = step(Tool::Extract, "the first result's title");
        let block = format_history(&[quirky.clone(), second.clone()]);

        for field in [
            quirky.text.as_str(),
            quirky.reasoning.as_str(),
            quirky.instruction.as_str(),
            second.instruction.as_str(),
        ] {
            assert!(block.contains(field), "missing field {field:?} in {block}");
        }
        assert!(block.contains("Step 1:"));
        assert!(block.contains("Step 2:"));
        assert!(block.contains("- Tool Used: ACT"));
        assert!(block.contains("- Tool Used: EXTRACT"));
    }

    #[test]
    fn step_text_includes_url_only_when_known() {
        let with_url = step_text("find the pricing page", Some("https://example.com/"), &[]);
        assert!(with_url.contains("(URL: https://example.com/)"));

        let without_url = step_text("find the pricing page", None, &[]);
        assert!(!without_url.contains("(URL:"));
        assert!(without_url.contains("\"find the pricing page\""));
    }

    #[test]
    fn last_result_block_names_the_origin_tool() {
        let extraction = last_result_block(&LastResult::Extraction("$12.99".into()));
        assert!(extraction.contains("previous extraction"));
        assert!(extraction.contains("$12.99"));

        let observation =
            last_result_block(&LastResult::Observation(vec![sample_element()]));
        assert!(observation.contains("previous observation"));
        assert!(observation.contains("#search"));
    }

    #[test]
    fn has_navigated_requires_a_goto() {
        assert!(!has_navigated(&[]));
        assert!(!has_navigated(&[step(Tool::Act, "click")]));
        assert!(has_navigated(&[
            step(Tool::Act, "click"),
            step(Tool::Goto, "https://example.com/"),
        ]));
    }
}
