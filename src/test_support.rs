//! Deterministic doubles for the embedding and completion capabilities

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::llm::{CompletionError, CompletionProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One axis per keyword plus a small bias axis
///
/// A text's vector marks each keyword it contains (case-insensitive substring),
/// so texts sharing keywords are close and texts sharing none are far apart.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of texts embedded so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| if lowered.contains(k.as_str()) { 1.0 } else { 0.0 })
            .collect();
        vector.push(0.05);
        vector
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.keywords.len() + 1
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Embedder that fails every call
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::GenerationError("embedder offline".to_string()))
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::GenerationError("embedder offline".to_string()))
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Completion double answering classifier prompts and grounding prompts separately
pub struct ScriptedCompletion {
    label: String,
    answer: String,
    classify_calls: AtomicUsize,
    synthesis_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedCompletion {
    pub fn new(label: &str, answer: &str) -> Self {
        Self {
            label: label.to_string(),
            answer: answer.to_string(),
            classify_calls: AtomicUsize::new(0),
            synthesis_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn synthesis_calls(&self) -> usize {
        self.synthesis_calls.load(Ordering::SeqCst)
    }

    /// The most recent grounding prompt
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        if prompt.contains("Classify the following question") {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(self.label.clone());
        }

        self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Completion double that fails every call
pub struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Request("upstream unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}
