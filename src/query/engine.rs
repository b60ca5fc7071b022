//! Routing between the FAQ shortcut and retrieval-augmented synthesis

use super::{
    Answer, AnswerSynthesizer, ContextRetriever, ConversationLog, FaqMatcher, FaqSearchMode,
    QuestionClassifier, Route, Scope,
};
use crate::config::{Config, RetrievalConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::llm::CompletionProvider;
use crate::storage::IndexStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Query-time knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuerySettings {
    pub top_k: usize,
    pub faq_threshold: f32,
    pub faq_top_k: usize,
    pub faq_search: FaqSearchMode,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            faq_threshold: 0.45,
            faq_top_k: 1,
            faq_search: FaqSearchMode::Prefiltered,
        }
    }
}

impl From<&RetrievalConfig> for QuerySettings {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            faq_threshold: config.faq_threshold,
            faq_top_k: config.faq_top_k,
            faq_search: config.faq_search,
        }
    }
}

/// Answers one question per call; safe to share across tasks
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    classifier: QuestionClassifier,
    faq: FaqMatcher,
    retriever: ContextRetriever,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(
        store: Arc<IndexStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionProvider>,
        settings: QuerySettings,
    ) -> Result<Self> {
        Ok(Self {
            classifier: QuestionClassifier::new(completion.clone())?,
            faq: FaqMatcher::new(
                store.clone(),
                embedder.clone(),
                settings.faq_threshold,
                settings.faq_top_k,
                settings.faq_search,
            ),
            retriever: ContextRetriever::new(store, embedder.clone()),
            synthesizer: AnswerSynthesizer::new(completion)?,
            embedder,
            top_k: settings.top_k,
        })
    }

    /// Open the configured index and wire every component to it
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        let store = IndexStore::open(
            &config.storage.index_dir,
            embedder.model_name(),
            embedder.dimension(),
            config.retrieval.hnsw_params(),
        )?;
        if store.is_empty() {
            tracing::warn!(
                "Index at {} is empty; run `gita-rag ingest` first",
                config.storage.index_dir.display()
            );
        }

        Self::new(
            Arc::new(store),
            embedder,
            completion,
            QuerySettings::from(&config.retrieval),
        )
    }

    /// Classify, then answer from the FAQ or from retrieved context
    ///
    /// Single pass with no retries. Embedding and model failures are returned
    /// as errors; the call has no side effects and can be repeated.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let scope = self.classifier.classify(question).await?;
        info!("Question classified as {:?}", scope);

        let query = self.embedder.embed(question)?;

        let route = match scope {
            Scope::Global => {
                if let Some(faq) = self.faq.find_by_vector(&query)? {
                    info!(
                        "Matched FAQ entry {} at distance {:.4}",
                        faq.entry_id, faq.distance
                    );
                    return Ok(Answer {
                        answer: faq.answer,
                        sources: vec![faq.entry_id],
                        route: Route::FaqShortcut,
                    });
                }
                debug!("No FAQ match, falling back to top-{} retrieval", self.top_k);
                Route::GlobalRetrieval
            }
            Scope::Local => Route::LocalRetrieval,
        };

        let chunks = self.retriever.retrieve_by_vector(&query, self.top_k)?;
        self.synthesizer.synthesize(question, &chunks, route).await
    }

    /// Answer and append the turn to `log`
    pub async fn answer_in(&self, log: &mut ConversationLog, question: &str) -> Result<Answer> {
        let answer = self.answer(question).await?;
        log.push(question, answer.clone());
        Ok(answer)
    }
}
