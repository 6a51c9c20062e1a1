mod cli;

use anyhow::Context;
use clap::Parser;
use log::info;
use ollama_rs::Ollama;

use cli::{Cli, Commands};
use webpilot::{Agent, Engine, OllamaModel, RunStatus, SessionOptions, WebDriverSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            goal,
            model,
            webdriver,
            headless,
            max_steps,
            artifacts,
        } => {
            let mut options = SessionOptions::new()
                .headless(headless)
                .webdriver_url(&webdriver);
            if let Some(dir) = artifacts {
                options = options.artifacts_dir(dir);
            }

            let session = WebDriverSession::connect(options)
                .await
                .context("connecting to the WebDriver endpoint")?;
            let browser = Engine::new(session, model.as_str());
            let decider = OllamaModel::new(Ollama::default(), model.as_str());

            info!("running goal: {goal}");
            let mut agent = Agent::new(browser, decider, goal.as_str()).with_max_steps(max_steps);
            let outcome = agent.run().await.context("agent run failed")?;

            for (index, step) in outcome.steps.iter().enumerate() {
                println!(
                    "{}. [{}] {} ({})",
                    index + 1,
                    step.tool,
                    step.text,
                    step.instruction
                );
            }
            match outcome.status {
                RunStatus::Completed => println!("Goal closed out in {} steps.", outcome.steps.len()),
                RunStatus::Exhausted => println!(
                    "Gave up after {} steps without the goal being closed out.",
                    outcome.steps.len()
                ),
                RunStatus::Failed => println!("Run failed before the goal was closed out."),
            }
        }
    }

    Ok(())
}
