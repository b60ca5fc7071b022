//! Question answering: classify, try the FAQ, retrieve, synthesize
//!
//! ```text
//! question -> classifier -> global -> FAQ matcher -> hit  -> FAQ answer
//!                                                 -> miss -> retrieve -> synthesize
//!                        -> local  -> retrieve -> synthesize
//! ```
//!
//! Every component holds only shared read-only handles, so one `QueryEngine`
//! serves concurrent requests behind an `Arc`.

mod classifier;
mod conversation;
mod engine;
mod faq_matcher;
mod retriever;
mod synthesizer;

pub use classifier::{parse_scope, QuestionClassifier};
pub use conversation::{ConversationLog, Turn};
pub use engine::{QueryEngine, QuerySettings};
pub use faq_matcher::{extract_answer, FaqAnswer, FaqMatcher, FaqSearchMode};
pub use retriever::ContextRetriever;
pub use synthesizer::{AnswerSynthesizer, CONTEXT_SEPARATOR};

use crate::storage::ScoredEntry;
use serde::{Deserialize, Serialize};

/// Whether a question needs the whole corpus or a few passages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
}

/// Path a question took through the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    FaqShortcut,
    GlobalRetrieval,
    LocalRetrieval,
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub content: String,
    pub source: String,
    pub page: u32,
    /// Cosine distance to the question, lower is closer
    pub distance: f32,
}

impl From<ScoredEntry> for RetrievedChunk {
    fn from(scored: ScoredEntry) -> Self {
        Self {
            id: scored.entry.id,
            content: scored.entry.content,
            source: scored.entry.source,
            page: scored.entry.page,
            distance: scored.distance,
        }
    }
}

/// Final answer with the ids of the chunks it was drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    /// Chunk ids in retrieval order; the FAQ entry id for FAQ answers
    pub sources: Vec<String>,
    pub route: Route,
}
