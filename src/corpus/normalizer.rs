//! Page extraction and glyph repair for source documents

use super::DocumentUnit;
use crate::error::{RagError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mis-decoded glyphs seen in the corpus, mapped to the intended ASCII
pub const GLYPH_FIXES: &[(char, char)] = &[('ß', 's'), ('†', 't'), ('å', 'a'), ('√', 'n')];

/// Replace known broken glyphs with their intended characters
pub fn normalize_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| {
            GLYPH_FIXES
                .iter()
                .find(|(broken, _)| *broken == c)
                .map(|(_, fixed)| *fixed)
                .unwrap_or(c)
        })
        .collect()
}

/// The `document_extract(path) -> page texts` capability
pub trait PageExtractor: Send + Sync {
    /// Raw text of every page, in page order
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDF page extraction backed by `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let document = lopdf::Document::load(path).map_err(|e| RagError::Document {
            path: path.to_path_buf(),
            message: format!("cannot open PDF: {}", e),
        })?;

        // get_pages is keyed by 1-based page number, already sorted
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let text = document
                .extract_text(&[page_number])
                .map_err(|e| RagError::Document {
                    path: path.to_path_buf(),
                    message: format!("cannot extract page {}: {}", page_number, e),
                })?;
            pages.push(text);
        }
        Ok(pages)
    }
}

/// Plain text extraction; form feeds separate pages
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl PageExtractor for TextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(path).map_err(|e| RagError::Document {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(text.split('\x0c').map(str::to_string).collect())
    }
}

/// Extractors keyed by lower-case file extension
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn PageExtractor>>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    pub fn register(mut self, extension: &str, extractor: Box<dyn PageExtractor>) -> Self {
        self.extractors
            .insert(extension.to_ascii_lowercase(), extractor);
        self
    }

    pub fn get(&self, path: &Path) -> Option<&dyn PageExtractor> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extractors.get(&extension).map(|e| e.as_ref())
    }
}

impl Default for ExtractorRegistry {
    /// PDFs only, like the corpus directory the tool is built around
    fn default() -> Self {
        Self::empty().register("pdf", Box::new(PdfExtractor))
    }
}

/// Extract every page of one document as normalized units
///
/// Pages are numbered from 1. The source is the path as given.
pub fn extract_document(path: &Path, extractor: &dyn PageExtractor) -> Result<Vec<DocumentUnit>> {
    let source = path.display().to_string();
    let pages = extractor.extract_pages(path)?;

    Ok(pages
        .iter()
        .enumerate()
        .map(|(i, raw)| DocumentUnit::new(normalize_glyphs(raw), source.clone(), i as u32 + 1))
        .collect())
}

/// Load every supported document in `dir`, in sorted path order
///
/// Any document that fails to open aborts the whole load.
pub fn load_documents(dir: &Path, registry: &ExtractorRegistry) -> Result<Vec<DocumentUnit>> {
    let entries = std::fs::read_dir(dir).map_err(|e| RagError::Io {
        source: e,
        context: format!("Failed to read documents directory: {}", dir.display()),
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to read entry in {}", dir.display()),
        })?;
        let path = entry.path();
        if path.is_file() && registry.get(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut units = Vec::new();
    for path in paths {
        if let Some(extractor) = registry.get(&path) {
            let pages = extract_document(&path, extractor)?;
            tracing::info!("Loaded {} pages from {}", pages.len(), path.display());
            units.extend(pages);
        }
    }

    Ok(units)
}
