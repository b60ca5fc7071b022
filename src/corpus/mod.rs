//! Source corpus: page documents and the curated FAQ set

mod faq;
mod normalizer;

pub use faq::{faq_entries, load_faq_documents, FaqEntry, FAQ_ENTRIES};
pub use normalizer::{
    extract_document, load_documents, normalize_glyphs, ExtractorRegistry, PageExtractor,
    PdfExtractor, TextExtractor, GLYPH_FIXES,
};

use serde::{Deserialize, Serialize};

/// Source tag carried by every FAQ-derived unit
pub const FAQ_SOURCE: &str = "FAQ";

/// One page of a source document, or one FAQ entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub content: String,
    /// Origin path, or `FAQ`
    pub source: String,
    /// 1-based page number; 0 for FAQ entries
    pub page: u32,
}

impl DocumentUnit {
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
        }
    }

    pub fn is_faq(&self) -> bool {
        self.source == FAQ_SOURCE
    }
}

/// A contiguous slice of a unit's text, identified by `source:page:chunk_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub page: u32,
    /// 0-based position among chunks sharing the same source and page
    pub chunk_index: u32,
    /// Empty until the identity assigner runs
    pub id: String,
}

impl Chunk {
    /// `source:page` key the identity assigner groups by
    pub fn page_key(&self) -> String {
        format!("{}:{}", self.source, self.page)
    }
}
