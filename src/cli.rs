use clap::{Parser, Subcommand};
use std::path::PathBuf;

use webpilot::DEFAULT_MAX_STEPS;

#[derive(Parser, Debug)]
#[command(
    name = "wp",
    about = "Goal-directed web browsing: give it a goal, it drives the browser",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the agent until the goal is achieved or given up on
    Run {
        /// Natural-language goal, e.g. "find the cheapest ticket to Oslo"
        goal: String,

        /// Ollama model used for decisions (a vision model sees the page)
        #[arg(short, long, default_value = "llama3.2-vision")]
        model: String,

        /// WebDriver endpoint
        #[arg(long, default_value = "http://localhost:4444")]
        webdriver: String,

        /// Run the browser in headless mode
        #[arg(long)]
        headless: bool,

        /// Hard ceiling on the number of steps in one run
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        /// Directory to mirror perception screenshots into
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
}
