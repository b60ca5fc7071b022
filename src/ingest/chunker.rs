//! Fixed-size character windows with overlap

use crate::config::ChunkingConfig;
use crate::corpus::{Chunk, DocumentUnit};

/// Split every unit into overlapping windows of at most `chunk_size` characters
///
/// Windows advance by `chunk_size - chunk_overlap` characters with no
/// preference for whitespace or sentence boundaries. Whitespace-only windows
/// are dropped, so an empty page produces no chunks. Output keeps input order,
/// grouped by unit, with `chunk_index` and `id` left for the identity assigner.
pub fn split_documents(units: &[DocumentUnit], config: &ChunkingConfig) -> Vec<Chunk> {
    units
        .iter()
        .flat_map(|unit| {
            split_text(&unit.content, config)
                .into_iter()
                .map(move |content| Chunk {
                    content,
                    source: unit.source.clone(),
                    page: unit.page,
                    chunk_index: 0,
                    id: String::new(),
                })
        })
        .collect()
}

/// Split one text into overlapping character windows
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let size = config.chunk_size.max(1);
    let step = size.saturating_sub(config.chunk_overlap).max(1);

    let chars: Vec<char> = text.chars().collect();
    let mut windows = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            windows.push(window);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("Q: question\nA: answer", &ChunkingConfig::default());
        assert_eq!(chunks, vec!["Q: question\nA: answer".to_string()]);
    }

    #[test]
    fn test_window_bounds_and_overlap() {
        let text: String = ('a'..='z').cycle().take(2000).collect();
        let chunks = split_text(&text, &ChunkingConfig::default());

        // starts at 0, 720, 1440; the last window reaches the end
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 800);
        assert_eq!(chunks[1].chars().count(), 800);
        assert_eq!(chunks[2].chars().count(), 560);

        let tail: String = chunks[0].chars().skip(720).collect();
        let head: String = chunks[1].chars().take(80).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_overlap_chunk() {
        let text = "x".repeat(800);
        assert_eq!(split_text(&text, &ChunkingConfig::default()).len(), 1);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "कृष्ण".repeat(10);
        let chunks = split_text(&text, &config(10, 2));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0].chars().count(), 10);
    }

    #[test]
    fn test_empty_and_whitespace_pages() {
        assert!(split_text("", &ChunkingConfig::default()).is_empty());
        assert!(split_text("   \n\t  ", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let units = vec![
            DocumentUnit::new("a".repeat(1700), "gita.pdf", 1),
            DocumentUnit::new("b".repeat(300), "gita.pdf", 2),
        ];
        let first = split_documents(&units, &ChunkingConfig::default());
        let second = split_documents(&units, &ChunkingConfig::default());
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[3].page, 2);
    }

    #[test]
    fn test_degenerate_config_terminates() {
        let chunks = split_text("abcdef", &config(2, 5));
        assert_eq!(chunks.len(), 5);
    }
}
