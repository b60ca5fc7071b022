//! Grounded answer generation from retrieved chunks

use super::{Answer, RetrievedChunk, Route};
use crate::error::Result;
use crate::llm::{CompletionProvider, PromptTemplate};
use std::sync::Arc;

/// Separator placed between chunk contents in the prompt context
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub struct AnswerSynthesizer {
    completion: Arc<dyn CompletionProvider>,
    template: PromptTemplate,
}

impl AnswerSynthesizer {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Result<Self> {
        Ok(Self {
            completion,
            template: PromptTemplate::grounding()?,
        })
    }

    /// Render the grounding prompt for `question` over `chunks`
    pub fn prompt(&self, question: &str, chunks: &[RetrievedChunk]) -> Result<String> {
        let context = chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        Ok(self
            .template
            .render(&[("context", context.as_str()), ("question", question)])?)
    }

    /// One model call; the reply is returned verbatim with the chunk ids in order
    pub async fn synthesize(
        &self,
        question: &str,
        chunks: &[RetrievedChunk],
        route: Route,
    ) -> Result<Answer> {
        let prompt = self.prompt(question, chunks)?;
        let answer = self.completion.complete(&prompt).await?;

        Ok(Answer {
            answer,
            sources: chunks.iter().map(|chunk| chunk.id.clone()).collect(),
            route,
        })
    }
}
