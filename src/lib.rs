//! # Docent
//!
//! A retrieval-augmented question answering service for fixed-domain
//! document assistants.
//!
//! Docent ingests a source document (PDF or plain text), chunks and
//! embeds it into a vector index, and answers questions by retrieving the
//! most similar chunks and prompting a generative model constrained to
//! that context. Two deployments — career guidance and HR policy — run
//! the same binary with different configuration.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Reader  │──▶│   Pipeline    │──▶│ VectorIndex │
//! │ PDF/text │   │ Chunk+Embed  │   │ sqlite/mem  │
//! └──────────┘   └──────────────┘   └──────┬──────┘
//!                                          │
//!                     question ──▶ embed ──┤
//!                                          ▼
//!                                   ┌─────────────┐   ┌───────────┐
//!                                   │ QueryEngine │──▶│ Generator │
//!                                   │  (per domain)│   │  (Ollama)  │
//!                                   └──────┬──────┘   └───────────┘
//!                                          ▼
//!                                     POST /chat
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docent ingest                 # read, chunk, embed, index the document
//! docent ask "What roles suit a statistics degree?"
//! docent serve                  # start the HTTP assistant
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`reader`] | Page extraction from source documents |
//! | [`chunk`] | Deterministic text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Vector index backends |
//! | [`generate`] | Prompt template and generative backends |
//! | [`query`] | Domain-parameterized query processor |
//! | [`ingest`] | Offline ingestion pipeline |
//! | [`server`] | HTTP service |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod generate;
pub mod index;
pub mod ingest;
pub mod models;
pub mod query;
pub mod reader;
pub mod server;
