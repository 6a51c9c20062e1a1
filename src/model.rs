use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ollama_rs::{
    Ollama,
    generation::completion::request::GenerationRequest,
    generation::images::Image,
    generation::parameters::{FormatType, JsonStructure},
    models::ModelOptions,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::types::{AgentError, StartingPoint, Step};

/// A single user-turn prompt: ordered text blocks plus an optional PNG
/// screenshot attached as an image part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    pub blocks: Vec<String>,
    pub image_png: Option<Vec<u8>>,
}

impl Prompt {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![text.into()],
            image_png: None,
        }
    }

    pub fn flatten(&self) -> String {
        self.blocks.join("\n\n")
    }

    pub fn has_image(&self) -> bool {
        self.image_png.is_some()
    }
}

/// The interface the decision core needs from a structured-generation
/// backend. Both methods issue exactly one constrained generation; any
/// value that fails its contracted schema surfaces as
/// [`AgentError::SchemaViolation`], never as a best-effort coercion.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn next_step(&self, prompt: Prompt) -> Result<Step, AgentError>;

    async fn starting_point(&self, prompt: Prompt) -> Result<StartingPoint, AgentError>;
}

/// Ollama-backed inference. The client and model id are injected rather
/// than read from process-wide state, so concurrent runs can use
/// different models without cross-talk.
#[derive(Debug)]
pub struct OllamaModel {
    ollama: Ollama,
    model: String,
    temperature: f32,
}

impl OllamaModel {
    pub fn new(ollama: Ollama, model: impl Into<String>) -> Self {
        Self {
            ollama,
            model: model.into(),
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Inference for OllamaModel {
    async fn next_step(&self, prompt: Prompt) -> Result<Step, AgentError> {
        structured::<Step>(&self.ollama, &self.model, self.temperature, prompt).await
    }

    async fn starting_point(&self, prompt: Prompt) -> Result<StartingPoint, AgentError> {
        structured::<StartingPoint>(&self.ollama, &self.model, self.temperature, prompt).await
    }
}

/// One generation call constrained to the JSON schema of `T`, decoded
/// into `T`. Decode failures are schema violations by contract.
pub(crate) async fn structured<T>(
    ollama: &Ollama,
    model: &str,
    temperature: f32,
    prompt: Prompt,
) -> Result<T, AgentError>
where
    T: DeserializeOwned + JsonSchema,
{
    let Prompt { blocks, image_png } = prompt;
    let mut request = GenerationRequest::new(model.to_string(), blocks.join("\n\n"))
        .options(ModelOptions::default().temperature(temperature))
        .format(FormatType::StructuredJson(Box::new(JsonStructure::new::<T>())));

    if let Some(png) = image_png {
        request = request.add_image(Image::from_base64(BASE64.encode(&png)));
    }

    let res = ollama
        .generate(request)
        .await
        .map_err(|e| AgentError::Inference(e.to_string()))?;

    serde_json::from_str(&res.response).map_err(|e| {
        AgentError::SchemaViolation(format!("{e}; model returned {:?}", res.response.trim()))
    })
}

/// One unconstrained generation call; returns the trimmed response text.
pub(crate) async fn freeform(
    ollama: &Ollama,
    model: &str,
    temperature: f32,
    prompt: String,
) -> Result<String, AgentError> {
    let request = GenerationRequest::new(model.to_string(), prompt)
        .options(ModelOptions::default().temperature(temperature));

    let res = ollama
        .generate(request)
        .await
        .map_err(|e| AgentError::Inference(e.to_string()))?;

    Ok(res.response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_flattens_blocks_in_order() {
        let prompt = Prompt {
            blocks: vec!["first".into(), "second".into()],
            image_png: None,
        };
        assert_eq!(prompt.flatten(), "first\n\nsecond");
        assert!(!prompt.has_image());
    }

    #[test]
    fn from_text_builds_a_single_block() {
        let prompt = Prompt::from_text("hello");
        assert_eq!(prompt.blocks, vec!["hello".to_string()]);
        assert!(prompt.image_png.is_none());
    }
}
