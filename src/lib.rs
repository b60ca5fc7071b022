//! gita-rag - Retrieval-augmented question answering over the Bhagavad Gita
//!
//! Pages of the source documents and a curated FAQ are chunked, embedded
//! locally and stored in a persistent vector index. Questions are classified
//! as global or local; global questions are answered from the FAQ when one
//! matches closely enough, everything else is answered by a language model
//! grounded in the nearest chunks.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod query;
pub mod server;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{RagError, Result};
