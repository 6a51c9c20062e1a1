use chrono::Local;
use fantoccini::key::Key;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use log::warn;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use crate::js;
use crate::types::{AgentError, ObservedElement};

/// Rendered page text handed to the model is capped at this many chars.
const VISIBLE_TEXT_MAX_CHARS: usize = 6000;

/// Configuration for one WebDriver-backed browser session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Whether the browser should run without a UI.
    pub headless: bool,
    /// Optional window dimensions (width, height).
    pub window_size: Option<(u32, u32)>,
    /// Optional user agent string override.
    pub user_agent: Option<String>,
    /// WebDriver endpoint to connect to.
    pub webdriver_url: String,
    /// When set, every screenshot is also written here as a
    /// timestamped PNG.
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: Some((1920, 1080)),
            user_agent: None,
            webdriver_url: "http://localhost:4444".to_string(),
            artifacts_dir: None,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headless(mut self, enabled: bool) -> Self {
        self.headless = enabled;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    pub fn webdriver_url(mut self, url: &str) -> Self {
        self.webdriver_url = url.to_string();
        self
    }

    pub fn artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }
}

/// One live browser context driven over WebDriver.
///
/// The client is held in an `Option` so `close` can consume it and stay
/// idempotent; every other call on a closed session reports a session
/// failure instead of panicking.
pub struct WebDriverSession {
    client: Option<Client>,
    options: SessionOptions,
}

impl WebDriverSession {
    /// Connects to the WebDriver server and opens a fresh context.
    pub async fn connect(options: SessionOptions) -> Result<Self, AgentError> {
        let mut caps = Capabilities::new();

        let mut firefox_options = json!({
            "args": if options.headless {
                vec!["-headless"]
            } else {
                vec![]
            }
        });
        if let Some(ua) = &options.user_agent {
            firefox_options["prefs"] = json!({
                "general.useragent.override": ua
            });
        }
        caps.insert("moz:firefoxOptions".to_string(), firefox_options);

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await
            .map_err(|e| AgentError::Connection(e.to_string()))?;

        if let Some((width, height)) = options.window_size {
            client
                .set_window_size(width, height)
                .await
                .map_err(|e| AgentError::Session(e.to_string()))?;
        }

        Ok(Self {
            client: Some(client),
            options,
        })
    }

    fn client(&self) -> Result<&Client, AgentError> {
        self.client
            .as_ref()
            .ok_or_else(|| AgentError::Session("session already closed".into()))
    }

    /// Navigates the context to the given URL.
    pub async fn navigate(&self, url: &str) -> Result<(), AgentError> {
        self.client()?
            .goto(url)
            .await
            .map_err(|e| AgentError::Session(e.to_string()))
    }

    /// Navigates back in the browser history.
    pub async fn back(&self) -> Result<(), AgentError> {
        self.client()?
            .back()
            .await
            .map_err(|e| AgentError::Session(e.to_string()))
    }

    pub async fn current_url(&self) -> Result<String, AgentError> {
        self.client()?
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| AgentError::Session(e.to_string()))
    }

    /// Captures the page as PNG bytes, mirroring them into the
    /// artifacts directory when one is configured.
    pub async fn screenshot(&self) -> Result<Vec<u8>, AgentError> {
        let png = self
            .client()?
            .screenshot()
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;

        if let Some(dir) = &self.options.artifacts_dir {
            let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
            let path = dir.join(format!("page-{timestamp}.png"));
            if let Err(err) = fs::create_dir_all(dir).and_then(|()| fs::write(&path, &png)) {
                warn!("could not persist screenshot to {}: {err}", path.display());
            }
        }

        Ok(png)
    }

    /// Clicks the element matching the CSS selector, waiting for it to
    /// appear first.
    pub async fn click(&self, selector: &str) -> Result<(), AgentError> {
        let el = self
            .client()?
            .wait()
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| AgentError::Session(format!("failed to find '{selector}': {e}")))?;

        el.click()
            .await
            .map_err(|e| AgentError::Session(format!("click failed '{selector}': {e}")))
    }

    /// Sends keys to the element matching the CSS selector.
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<(), AgentError> {
        let el = self
            .client()?
            .wait()
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| AgentError::Session(format!("failed to find '{selector}': {e}")))?;

        el.send_keys(text)
            .await
            .map_err(|e| AgentError::Session(format!("send keys failed '{selector}': {e}")))
    }

    /// Presses a named key (Enter, Tab, ...) on the focused element.
    pub async fn press_key(&self, key: &str) -> Result<(), AgentError> {
        let sequence = match named_key(key) {
            Some(k) => String::from(char::from(k)),
            None if key.chars().count() == 1 => key.to_string(),
            None => {
                return Err(AgentError::MalformedInstruction(format!(
                    "unsupported key {key:?}"
                )));
            }
        };

        let el = self
            .client()?
            .active_element()
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;

        el.send_keys(&sequence)
            .await
            .map_err(|e| AgentError::Session(format!("key press failed {key:?}: {e}")))
    }

    /// Enumerates the currently visible interactive elements.
    pub async fn visible_elements(&self) -> Result<Vec<ObservedElement>, AgentError> {
        let value = self
            .client()?
            .execute(js::VISIBLE_ELEMENTS, vec![])
            .await
            .map_err(|e| AgentError::Dom(e.to_string()))?;

        serde_json::from_value(value).map_err(|e| AgentError::Dom(format!("invalid JSON: {e}")))
    }

    /// Rendered text of the page, capped to keep prompts bounded.
    pub async fn visible_text(&self) -> Result<String, AgentError> {
        let value = self
            .client()?
            .execute(js::VISIBLE_TEXT, vec![])
            .await
            .map_err(|e| AgentError::Dom(e.to_string()))?;

        let text = value.as_str().unwrap_or_default();
        Ok(text.chars().take(VISIBLE_TEXT_MAX_CHARS).collect())
    }

    /// Shuts the browser context down. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), AgentError> {
        match self.client.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| AgentError::Session(e.to_string())),
            None => Ok(()),
        }
    }
}

fn named_key(name: &str) -> Option<Key> {
    match name.trim().to_ascii_lowercase().as_str() {
        "enter" | "return" => Some(Key::Enter),
        "tab" => Some(Key::Tab),
        "escape" | "esc" => Some(Key::Escape),
        "backspace" => Some(Key::Backspace),
        "delete" => Some(Key::Delete),
        "space" => Some(Key::Space),
        "arrowdown" | "down" => Some(Key::Down),
        "arrowup" | "up" => Some(Key::Up),
        "arrowleft" | "left" => Some(Key::Left),
        "arrowright" | "right" => Some(Key::Right),
        "pageup" => Some(Key::PageUp),
        "pagedown" => Some(Key::PageDown),
        "home" => Some(Key::Home),
        "end" => Some(Key::End),
        _ => None,
    }
}
