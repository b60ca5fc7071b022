//! Shared doubles for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use gita_rag::embedding::{EmbeddingError, EmbeddingProvider};
use gita_rag::llm::{CompletionError, CompletionProvider};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Marks which keywords a text contains, plus a constant bias axis
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

/// Replies with a fixed label to classifier prompts and a fixed answer otherwise
pub struct ScriptedCompletion {
    label: String,
    answer: String,
    classify_calls: AtomicUsize,
    synthesis_calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(label: &str, answer: &str) -> Self {
        Self {
            label: label.to_string(),
            answer: answer.to_string(),
            classify_calls: AtomicUsize::new(0),
            synthesis_calls: AtomicUsize::new(0),
        }
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn synthesis_calls(&self) -> usize {
        self.synthesis_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        if prompt.contains("Classify the following question") {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label.clone())
        } else {
            self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
