//! reqcover: semantic coverage analysis of requirements against design
//! documents.
//!
//! Both documents are split into statements (JSON/YAML structure, line
//! splitting, or sentence segmentation), embedded in a shared TF-IDF
//! space, and every requirement is classified Present or Missing by
//! cosine similarity against the design statements. A conversation layer
//! lets callers discuss a report with an LLM-backed narrative generator;
//! without an API key a deterministic local generator stands in.
//!
//! Hosts construct a [`service::CoverageService`] from [`config::Config`]
//! and drive everything through it. The crate binds no transport.

pub mod analysis;
pub mod config;
pub mod conversations;
pub mod error;
pub mod narrative;
pub mod parser;
pub mod prompts;
pub mod segmenter;
pub mod service;
pub mod vectorize;

pub use config::Config;
pub use error::{CoverageError, Result};
pub use service::CoverageService;

// Load env from a simple, standardized location resolution.
// This uses dotenvy::dotenv().ok() which loads .env if present and silently ignores if missing.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Install a fmt subscriber filtered by `REQCOVER_LOG` (default
/// `reqcover=info`). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("REQCOVER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reqcover=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
