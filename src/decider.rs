use url::Url;

use crate::browser::Browser;
use crate::model::{Inference, Prompt};
use crate::perception;
use crate::types::{AgentError, LastResult, StartingPoint, Step};

/// Decide the single next step from goal, history, and fresh perception.
///
/// Returns the step together with a new history ending in it; the input
/// history is never mutated. The returned step is the generated value
/// taken verbatim, checked only against the step contract.
pub async fn decide_step<B, M>(
    model: &M,
    browser: &mut B,
    goal: &str,
    history: &[Step],
    last_result: Option<&LastResult>,
) -> Result<(Step, Vec<Step>), AgentError>
where
    B: Browser,
    M: Inference,
{
    let perception = perception::assemble(browser, history).await?;

    let mut blocks = vec![perception::step_text(
        goal,
        perception.current_url.as_deref(),
        history,
    )];
    if let Some(last) = last_result {
        blocks.push(perception::last_result_block(last));
    }

    let prompt = Prompt {
        blocks,
        image_png: perception.screenshot,
    };

    let step = model.next_step(prompt).await?;
    step.validate()?;

    let mut updated = history.to_vec();
    updated.push(step.clone());
    Ok((step, updated))
}

/// One-shot selection of the entry URL before the loop starts. A
/// generated URL that does not parse is a hard failure for the run; the
/// retry policy, if any, belongs to the caller.
pub async fn select_starting_point<M: Inference>(
    model: &M,
    goal: &str,
) -> Result<StartingPoint, AgentError> {
    let choice = model
        .starting_point(Prompt::from_text(starting_point_text(goal)))
        .await?;

    Url::parse(&choice.url).map_err(|err| {
        AgentError::SchemaViolation(format!(
            "starting url {:?} is not a valid URL: {err}",
            choice.url
        ))
    })?;

    Ok(choice)
}

fn starting_point_text(goal: &str) -> String {
    format!(
        "Given the goal: \"{goal}\", determine the best URL to start from.\nChoose from:\n1. A relevant search engine (Google, Bing, etc.)\n2. A direct URL if you're confident about the target website\n3. Any other appropriate starting point\n\nReturn a URL that would be most effective for achieving this goal."
    )
}
