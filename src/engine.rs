use async_trait::async_trait;
use ollama_rs::Ollama;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::browser::Browser;
use crate::model;
use crate::model::Prompt;
use crate::session::WebDriverSession;
use crate::types::{AgentError, ObservedElement};

/// Browser backend that resolves natural-language instructions against
/// the live page: ACT descriptions become one WebDriver primitive,
/// EXTRACT descriptions are answered from the page text, OBSERVE
/// descriptions filter the visible elements. Each resolution is a
/// single schema-constrained generation, no retries.
pub struct Engine {
    session: WebDriverSession,
    ollama: Ollama,
    model: String,
    temperature: f32,
}

impl Engine {
    pub fn new(session: WebDriverSession, model: impl Into<String>) -> Self {
        Self {
            session,
            ollama: Ollama::default(),
            model: model.into(),
            temperature: 0.2,
        }
    }

    pub fn with_ollama(mut self, ollama: Ollama) -> Self {
        self.ollama = ollama;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn resolve<T>(&self, prompt: String) -> Result<T, AgentError>
    where
        T: serde::de::DeserializeOwned + JsonSchema,
    {
        model::structured::<T>(
            &self.ollama,
            &self.model,
            self.temperature,
            Prompt::from_text(prompt),
        )
        .await
    }
}

/// One WebDriver primitive an ACT description resolves into.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum PrimitiveKind {
    Click,
    Type,
    Press,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct Primitive {
    kind: PrimitiveKind,
    /// CSS selector of the target element; empty for `press`.
    selector: String,
    /// Text to type; empty unless `kind` is `type`.
    text: String,
    /// Key name such as "Enter"; empty unless `kind` is `press`.
    key: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct Selection {
    indices: Vec<usize>,
}

fn render_elements(elements: &[ObservedElement]) -> String {
    elements
        .iter()
        .enumerate()
        .map(|(index, el)| {
            format!(
                "{index}: <{}> text={:?} placeholder={:?} selector={:?}",
                el.tag, el.text, el.placeholder, el.selector
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps the listed indices, in page order, dropping anything out of
/// range or repeated.
fn select_observed(elements: Vec<ObservedElement>, indices: &[usize]) -> Vec<ObservedElement> {
    elements
        .into_iter()
        .enumerate()
        .filter(|(index, _)| indices.contains(index))
        .map(|(_, el)| el)
        .collect()
}

#[async_trait]
impl Browser for Engine {
    async fn navigate(&mut self, url: &str) -> Result<(), AgentError> {
        self.session.navigate(url).await
    }

    async fn act(&mut self, description: &str) -> Result<(), AgentError> {
        let elements = self.session.visible_elements().await?;
        let prompt = format!(
            "These interactive elements are currently visible on the page:\n{}\n\nPerform exactly one UI action: \"{description}\"\n\nRespond with the primitive that performs it:\n- kind \"click\": set selector to the element's CSS selector, leave text and key empty\n- kind \"type\": set selector and text, leave key empty\n- kind \"press\": set key to a key name such as Enter, leave selector and text empty",
            render_elements(&elements)
        );
        let primitive: Primitive = self.resolve(prompt).await?;

        match primitive.kind {
            PrimitiveKind::Click => {
                if primitive.selector.trim().is_empty() {
                    return Err(AgentError::SchemaViolation(
                        "click primitive without a selector".into(),
                    ));
                }
                self.session.click(&primitive.selector).await
            }
            PrimitiveKind::Type => {
                if primitive.selector.trim().is_empty() {
                    return Err(AgentError::SchemaViolation(
                        "type primitive without a selector".into(),
                    ));
                }
                self.session
                    .type_into(&primitive.selector, &primitive.text)
                    .await
            }
            PrimitiveKind::Press => self.session.press_key(&primitive.key).await,
        }
    }

    async fn extract(&mut self, description: &str) -> Result<String, AgentError> {
        let text = self.session.visible_text().await?;
        let prompt = format!(
            "Page text:\n{text}\n\nExtract the following from the page: \"{description}\".\nReturn only the extracted data, with no commentary."
        );
        model::freeform(&self.ollama, &self.model, self.temperature, prompt).await
    }

    async fn observe(&mut self, description: &str) -> Result<Vec<ObservedElement>, AgentError> {
        let elements = self.session.visible_elements().await?;
        if description.trim().is_empty() || elements.is_empty() {
            return Ok(elements);
        }

        let prompt = format!(
            "These interactive elements are currently visible on the page:\n{}\n\nReturn the indices of the elements matching: \"{description}\"",
            render_elements(&elements)
        );
        let selection: Selection = self.resolve(prompt).await?;
        Ok(select_observed(elements, &selection.indices))
    }

    async fn current_url(&mut self) -> Result<String, AgentError> {
        self.session.current_url().await
    }

    async fn go_back(&mut self) -> Result<(), AgentError> {
        self.session.back().await
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, AgentError> {
        self.session.screenshot().await
    }

    async fn close(&mut self) -> Result<(), AgentError> {
        self.session.close().await
    }
}
