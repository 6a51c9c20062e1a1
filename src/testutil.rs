use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::browser::Browser;
use crate::model::{Inference, Prompt};
use crate::types::{AgentError, ObservedElement, StartingPoint, Step, Tool};

pub fn step(tool: Tool, instruction: &str) -> Step {
    Step {
        text: format!("{tool} {instruction}"),
        reasoning: format!("chose {tool} to advance the goal"),
        tool,
        instruction: instruction.to_string(),
    }
}

pub fn sample_element() -> ObservedElement {
    ObservedElement {
        selector: "#search".into(),
        tag: "input".into(),
        text: String::new(),
        placeholder: "Search".into(),
    }
}

#[derive(Default)]
pub struct BrowserLog {
    pub calls: Vec<String>,
    pub closes: usize,
}

/// Scriptable in-memory browser backend. Clones share one call log so a
/// test can keep a handle while the agent owns its copy.
#[derive(Clone)]
pub struct FakeBrowser {
    pub log: Arc<Mutex<BrowserLog>>,
    pub url: Option<String>,
    pub extraction: String,
    pub observed: Vec<ObservedElement>,
    pub hang_navigation: bool,
    pub fail_act: bool,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(BrowserLog::default())),
            url: Some("https://example.com/".into()),
            extraction: "payload".into(),
            observed: vec![sample_element()],
            hang_navigation: false,
            fail_act: false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().calls.push(call.into());
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), AgentError> {
        self.record(format!("navigate {url}"));
        if self.hang_navigation {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn act(&mut self, description: &str) -> Result<(), AgentError> {
        self.record(format!("act {description}"));
        if self.fail_act {
            return Err(AgentError::Session("act failed".into()));
        }
        Ok(())
    }

    async fn extract(&mut self, description: &str) -> Result<String, AgentError> {
        self.record(format!("extract {description}"));
        Ok(self.extraction.clone())
    }

    async fn observe(&mut self, description: &str) -> Result<Vec<ObservedElement>, AgentError> {
        self.record(format!("observe {description}"));
        Ok(self.observed.clone())
    }

    async fn current_url(&mut self) -> Result<String, AgentError> {
        self.record("current_url");
        self.url
            .clone()
            .ok_or_else(|| AgentError::Session("current url unavailable".into()))
    }

    async fn go_back(&mut self) -> Result<(), AgentError> {
        self.record("go_back");
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, AgentError> {
        self.record("screenshot");
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&mut self) -> Result<(), AgentError> {
        let mut log = self.log.lock().unwrap();
        log.calls.push("close".into());
        log.closes += 1;
        Ok(())
    }
}

pub struct InferenceState {
    pub scripted: VecDeque<Step>,
    pub starting: StartingPoint,
    pub prompts: Vec<Prompt>,
    pub starting_prompts: Vec<Prompt>,
}

/// Scriptable inference backend: pops pre-baked steps in order and
/// records every prompt it was shown.
#[derive(Clone)]
pub struct FakeInference {
    pub state: Arc<Mutex<InferenceState>>,
}

impl FakeInference {
    pub fn scripted(steps: Vec<Step>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InferenceState {
                scripted: steps.into(),
                starting: StartingPoint {
                    url: "https://search.example/".into(),
                    reasoning: "a search engine is the safest entry point".into(),
                },
                prompts: Vec::new(),
                starting_prompts: Vec::new(),
            })),
        }
    }

    pub fn with_starting_url(self, url: &str) -> Self {
        self.state.lock().unwrap().starting.url = url.to_string();
        self
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.state.lock().unwrap().prompts.clone()
    }

    pub fn starting_prompts(&self) -> Vec<Prompt> {
        self.state.lock().unwrap().starting_prompts.clone()
    }

    pub fn decide_calls(&self) -> usize {
        self.state.lock().unwrap().prompts.len()
    }

    pub fn starting_calls(&self) -> usize {
        self.state.lock().unwrap().starting_prompts.len()
    }
}

#[async_trait]
impl Inference for FakeInference {
    async fn next_step(&self, prompt: Prompt) -> Result<Step, AgentError> {
        let mut state = self.state.lock().unwrap();
        state.prompts.push(prompt);
        state
            .scripted
            .pop_front()
            .ok_or_else(|| AgentError::Inference("no scripted step left".into()))
    }

    async fn starting_point(&self, prompt: Prompt) -> Result<StartingPoint, AgentError> {
        let mut state = self.state.lock().unwrap();
        state.starting_prompts.push(prompt);
        Ok(state.starting.clone())
    }
}
