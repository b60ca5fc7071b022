mod common;

use common::KeywordEmbedder;
use gita_rag::config::ChunkingConfig;
use gita_rag::corpus::{DocumentUnit, ExtractorRegistry, TextExtractor, FAQ_ENTRIES};
use gita_rag::embedding::EmbeddingProvider;
use gita_rag::ingest::Ingestor;
use gita_rag::RagError;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn text_ingestor(embedder: Arc<dyn EmbeddingProvider>) -> Ingestor {
    Ingestor::new(embedder, ChunkingConfig::default())
        .with_extractors(ExtractorRegistry::empty().register("txt", Box::new(TextExtractor)))
}

fn write_corpus(dir: &Path) {
    std::fs::create_dir_all(dir).expect("Failed to create corpus dir");
    let chapter_one = "Dhritarashtra said: on the field of dharma ".repeat(40);
    let chapter_two = "Krishna said to Arjuna ".repeat(60);
    std::fs::write(
        dir.join("gita.txt"),
        format!("{}\x0c{}", chapter_one, chapter_two),
    )
    .expect("Failed to write corpus");
}

#[test]
fn test_ingesting_twice_is_idempotent() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let docs = temp.path().join("data");
    let index = temp.path().join("index");
    write_corpus(&docs);

    let embedder = Arc::new(KeywordEmbedder::new(&["krishna", "arjuna", "dharma"]));
    let ingestor = text_ingestor(embedder.clone());

    let first = ingestor.run(&docs, &index, false).expect("First ingest failed");
    println!("First run: {:?}", first.upsert);
    assert_eq!(first.upsert.existing, 0);
    assert_eq!(first.upsert.added, first.chunks);
    assert_eq!(first.stats.faq_entries, FAQ_ENTRIES.len());

    let embedded_after_first = embedder.calls();
    let second = ingestor.run(&docs, &index, false).expect("Second ingest failed");

    assert_eq!(second.upsert.added, 0, "Re-ingest must not add entries");
    assert_eq!(second.upsert.unchanged, second.chunks);
    assert_eq!(second.stats.entries, first.stats.entries);
    assert_eq!(embedder.calls(), embedded_after_first, "Nothing should be re-embedded");
}

#[test]
fn test_single_page_document_twice_keeps_chunk_count() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder::new(&["arjuna"]));
    let ingestor = Ingestor::new(embedder, ChunkingConfig::default());
    let store = ingestor.open_store(temp.path()).expect("Failed to open index");

    let page = vec![DocumentUnit::new("Arjuna ".repeat(200), "data/gita.pdf", 1)];

    let first = ingestor.ingest_into(&store, &page).expect("First ingest failed");
    let count = store.len();
    assert_eq!(count, first.chunks);
    assert!(count > 1, "A 1400 character page spans several chunks");

    ingestor.ingest_into(&store, &page).expect("Second ingest failed");
    assert_eq!(store.len(), count);

    let ids = store.existing_ids().expect("Failed to read ids");
    for index in 0..count {
        assert!(ids.contains(&format!("data/gita.pdf:1:{}", index)));
    }
}

#[test]
fn test_unreadable_document_leaves_index_unchanged() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let docs = temp.path().join("data");
    let index = temp.path().join("index");
    write_corpus(&docs);

    let embedder = Arc::new(KeywordEmbedder::new(&["krishna"]));
    let before = text_ingestor(embedder.clone())
        .run(&docs, &index, false)
        .expect("Initial ingest failed");

    std::fs::write(docs.join("broken.pdf"), b"not a pdf").expect("Failed to write PDF");
    let registry = ExtractorRegistry::default().register("txt", Box::new(TextExtractor));
    let result = Ingestor::new(embedder.clone(), ChunkingConfig::default())
        .with_extractors(registry)
        .run(&docs, &index, false);

    assert!(matches!(result, Err(RagError::Document { .. })));

    let store = Ingestor::new(embedder, ChunkingConfig::default())
        .open_store(&index)
        .expect("Failed to reopen index");
    assert_eq!(store.len(), before.stats.entries);
}
