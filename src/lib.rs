//! **linecull** - Curates line-oriented corpora
//!
//! Two notions of "already present": exact equality of a derived key for
//! batch cleansing of a file, and normalized edit-distance similarity for
//! online admission into an append-only corpus.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Library error taxonomy
pub mod error;

/// Text and JSON rendering for command results
pub mod output;

/// Dedup and admission engines
pub mod core {
    /// Normalized Levenshtein similarity
    pub mod similarity;
    pub use similarity::{levenshtein, similarity};

    /// Comparison keys for exact dedup
    pub mod key;
    pub use key::{extract_key, extract_key_with};

    /// Batch exact-key dedup of a file
    pub mod dedup;
    pub use dedup::{DedupOptions, DedupStats, DedupStrategy, dedup_exact, dedup_exact_with, run as dedup_run};

    /// Near-duplicate appender with a lazily loaded cache
    pub mod appender;
    pub use appender::{AdmissionResult, Phase, RejectReason, SimilarMatch, UniqueLineAppender};
}

/// Command handlers that sit on top of the engines
pub mod cli_ext {
    /// append / check / score / count
    pub mod corpus_cmd;
}

/// Infrastructure - Configuration and corpus I/O
pub mod infra {
    /// Layered configuration with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Streaming corpus reader, locked append, atomic rewrite
    pub mod io;
    pub use io::{CorpusLines, read_lines};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use error::CullError;
pub use infra::{Config, load_config};

// Core types for external consumers
pub use crate::core::{
    AdmissionResult, DedupOptions, DedupStats, RejectReason, UniqueLineAppender, dedup_exact,
    extract_key, similarity,
};
