//! Global/local question classification

use super::Scope;
use crate::error::Result;
use crate::llm::{CompletionProvider, PromptTemplate};
use std::sync::Arc;

/// Map a model reply to a scope
///
/// Only a whole reply of exactly `global` (after trimming and lower-casing)
/// selects `Global`. Everything else, empty or explained replies included,
/// is `Local`.
pub fn parse_scope(response: &str) -> Scope {
    if response.trim().eq_ignore_ascii_case("global") {
        Scope::Global
    } else {
        Scope::Local
    }
}

/// Asks the model whether a question needs the whole corpus
pub struct QuestionClassifier {
    completion: Arc<dyn CompletionProvider>,
    template: PromptTemplate,
}

impl QuestionClassifier {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Result<Self> {
        Ok(Self {
            completion,
            template: PromptTemplate::classifier()?,
        })
    }

    pub async fn classify(&self, question: &str) -> Result<Scope> {
        let prompt = self.template.render(&[("query", question)])?;
        let response = self.completion.complete(&prompt).await?;
        let scope = parse_scope(&response);

        tracing::debug!("Classifier replied {:?}, treating question as {:?}", response.trim(), scope);
        Ok(scope)
    }
}
