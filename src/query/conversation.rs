//! Caller-owned record of questions and answers

use super::Answer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question and the answer it received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: Answer,
    pub asked_at: DateTime<Utc>,
}

/// Ordered question/answer history
///
/// Only a record for display; earlier turns are never sent back to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: Answer) {
        self.turns.push(Turn {
            question: question.into(),
            answer,
            asked_at: Utc::now(),
        });
    }

    /// Turns in the order they were asked
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Route;

    fn answer(text: &str) -> Answer {
        Answer {
            answer: text.to_string(),
            sources: vec![],
            route: Route::LocalRetrieval,
        }
    }

    #[test]
    fn test_order() {
        let mut log = ConversationLog::new();
        log.push("first?", answer("one"));
        log.push("second?", answer("two"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.turns()[0].question, "first?");

        let newest: Vec<&str> = log.newest_first().map(|t| t.question.as_str()).collect();
        assert_eq!(newest, vec!["second?", "first?"]);

        log.clear();
        assert!(log.is_empty());
    }
}
