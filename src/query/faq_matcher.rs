//! FAQ shortcut for global questions

use crate::corpus::FAQ_SOURCE;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::storage::{IndexStore, ScoredEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How FAQ candidates are drawn from the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaqSearchMode {
    /// Search only among FAQ entries
    Prefiltered,
    /// Search the whole index, then keep FAQ entries
    ///
    /// An FAQ entry is missed when `faq_top_k` page chunks rank above it,
    /// even if it would pass the threshold. Raise `faq_top_k` to widen the window.
    Postfiltered,
}

impl FromStr for FaqSearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefiltered" => Ok(Self::Prefiltered),
            "postfiltered" => Ok(Self::Postfiltered),
            other => Err(format!(
                "unknown FAQ search mode '{}', expected 'prefiltered' or 'postfiltered'",
                other
            )),
        }
    }
}

impl fmt::Display for FaqSearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefiltered => write!(f, "prefiltered"),
            Self::Postfiltered => write!(f, "postfiltered"),
        }
    }
}

/// A curated answer that matched the question
#[derive(Debug, Clone, PartialEq)]
pub struct FaqAnswer {
    pub answer: String,
    /// Id of the matched FAQ chunk
    pub entry_id: String,
    pub distance: f32,
}

/// Text after `A:` on the first line that starts with it
pub fn extract_answer(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("A:"))
        .map(|answer| answer.trim().to_string())
        .filter(|answer| !answer.is_empty())
}

/// Looks for an FAQ entry close enough to answer the question directly
pub struct FaqMatcher {
    store: Arc<IndexStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    threshold: f32,
    top_k: usize,
    mode: FaqSearchMode,
}

impl FaqMatcher {
    pub fn new(
        store: Arc<IndexStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        threshold: f32,
        top_k: usize,
        mode: FaqSearchMode,
    ) -> Self {
        Self {
            store,
            embedder,
            threshold,
            top_k: top_k.max(1),
            mode,
        }
    }

    pub fn find(&self, question: &str) -> Result<Option<FaqAnswer>> {
        let query = self.embedder.embed(question)?;
        self.find_by_vector(&query)
    }

    /// Same as `find` with the question already embedded
    pub fn find_by_vector(&self, query: &[f32]) -> Result<Option<FaqAnswer>> {
        let candidates = match self.mode {
            FaqSearchMode::Prefiltered => self.store.search_source(query, FAQ_SOURCE, self.top_k)?,
            FaqSearchMode::Postfiltered => self.store.search(query, self.top_k)?,
        };

        for candidate in &candidates {
            tracing::debug!(
                "FAQ candidate {} ({}) at distance {:.4}",
                candidate.entry.id,
                candidate.entry.source,
                candidate.distance
            );
        }

        Ok(self.select(&candidates))
    }

    /// Best FAQ candidate strictly under the threshold, with its answer parsed
    ///
    /// `candidates` must be sorted closest first.
    pub fn select(&self, candidates: &[ScoredEntry]) -> Option<FaqAnswer> {
        let best = candidates
            .iter()
            .find(|candidate| candidate.entry.source == FAQ_SOURCE)?;

        if best.distance >= self.threshold {
            tracing::debug!(
                "Best FAQ match {} at {:.4} is not under threshold {}",
                best.entry.id,
                best.distance,
                self.threshold
            );
            return None;
        }

        let answer = extract_answer(&best.entry.content)?;
        Some(FaqAnswer {
            answer,
            entry_id: best.entry.id.clone(),
            distance: best.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HnswParams;
    use crate::storage::IndexEntry;
    use crate::test_support::KeywordEmbedder;
    use tempfile::TempDir;

    fn scored(id: &str, source: &str, content: &str, distance: f32) -> ScoredEntry {
        ScoredEntry {
            entry: IndexEntry {
                row_id: 1,
                id: id.to_string(),
                source: source.to_string(),
                page: 0,
                chunk_index: 0,
                content: content.to_string(),
                content_hash: String::new(),
            },
            distance,
        }
    }

    fn matcher(dir: &std::path::Path, mode: FaqSearchMode) -> FaqMatcher {
        let embedder = Arc::new(KeywordEmbedder::new(&["yoga"]));
        let store = IndexStore::open(dir, "keyword-test", 2, HnswParams::default()).unwrap();
        FaqMatcher::new(Arc::new(store), embedder, 0.45, 1, mode)
    }

    #[test]
    fn test_extract_answer() {
        assert_eq!(
            extract_answer("Q: Which yogas?\nA: Karma Yoga, Bhakti Yoga"),
            Some("Karma Yoga, Bhakti Yoga".to_string())
        );
        assert_eq!(extract_answer("Q: no answer line"), None);
        assert_eq!(extract_answer("Q: blank\nA:   "), None);
        assert_eq!(extract_answer("  A: indented  "), Some("indented".to_string()));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let temp = TempDir::new().unwrap();
        let matcher = matcher(temp.path(), FaqSearchMode::Prefiltered);
        let content = "Q: q\nA: the answer";

        assert!(matcher.select(&[scored("FAQ:0:0", "FAQ", content, 0.45)]).is_none());
        assert!(matcher.select(&[scored("FAQ:0:0", "FAQ", content, 0.46)]).is_none());

        let hit = matcher
            .select(&[scored("FAQ:0:0", "FAQ", content, 0.4499)])
            .unwrap();
        assert_eq!(hit.answer, "the answer");
        assert_eq!(hit.entry_id, "FAQ:0:0");
    }

    #[test]
    fn test_select_ignores_non_faq_candidates() {
        let temp = TempDir::new().unwrap();
        let matcher = matcher(temp.path(), FaqSearchMode::Postfiltered);

        let candidates = [
            scored("gita.pdf:3:0", "gita.pdf", "A: not an faq", 0.01),
            scored("FAQ:0:1", "FAQ", "Q: q\nA: from the faq", 0.2),
        ];
        assert_eq!(matcher.select(&candidates).unwrap().answer, "from the faq");
        assert!(matcher.select(&candidates[..1]).is_none());
        assert!(matcher.select(&[]).is_none());
    }

    #[test]
    fn test_search_mode_parsing() {
        assert_eq!("prefiltered".parse::<FaqSearchMode>(), Ok(FaqSearchMode::Prefiltered));
        assert_eq!(" Postfiltered ".parse::<FaqSearchMode>(), Ok(FaqSearchMode::Postfiltered));
        assert!("both".parse::<FaqSearchMode>().is_err());
        assert_eq!(FaqSearchMode::Postfiltered.to_string(), "postfiltered");
    }
}
