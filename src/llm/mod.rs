//! Language model access
//!
//! - `CompletionProvider` trait for the `complete(prompt) -> text` capability
//! - `OpenAiCompatibleProvider` for any OpenAI-style chat completions endpoint
//! - `PromptTemplate` for the classifier and grounding prompts

mod openai;
mod template;

pub use openai::OpenAiCompatibleProvider;
pub use template::{PromptTemplate, TemplateError, CLASSIFIER_PROMPT, GROUNDING_PROMPT};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("API key missing: set the {0} environment variable")]
    ApiKeyMissing(String),

    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    InvalidResponse(String),
}

/// A model that turns a prompt into a single text reply
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    fn model_name(&self) -> &str;
}
