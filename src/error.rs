//! Engine error taxonomy.
//!
//! No failure inside the compile/process pipeline is allowed to abort an
//! update cycle: callers map these errors to a best-effort output (previous
//! cache or raw source) plus an out-of-band [`EngineEvent`] for tool panes.
//!
//! [`EngineEvent`]: crate::engine::EngineEvent

use std::path::PathBuf;
use thiserror::Error;

use crate::language::Language;

/// Errors produced by the compilation and preview pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown language id requested from the registry.
    /// Fatal to that resolution, surfaced to the caller.
    #[error("unknown language `{0}`")]
    LanguageNotFound(Language),

    /// Compiler module fetch/initialization failed. Recoverable: the loader
    /// retries on the next explicit request, the module cache is not poisoned.
    #[error("failed to load compiler module for `{language}`: {reason}")]
    ModuleLoad { language: Language, reason: String },

    /// A compiler rejected the given content. Non-fatal to the system: the
    /// previous successfully compiled output for the slot is retained.
    #[error("`{language}` compile failed: {message}")]
    Compile { language: Language, message: String },

    /// A style post-processor failed. Non-fatal: the pipeline continues with
    /// the output as it stood before the failing processor.
    #[error("style processor `{name}` failed: {reason}")]
    Processor { name: &'static str, reason: String },

    /// An `alias_to` chain revisited a language. Configuration defect; the
    /// slot falls back to raw-content passthrough.
    #[error("circular alias chain involving `{0}`")]
    CircularAlias(Language),

    /// A dependency/output chain exceeded the hop bound or revisited a
    /// language. Configuration defect; same passthrough fallback.
    #[error("circular compiler dependency involving `{0}`")]
    CircularDependency(Language),

    /// Writing a cache snapshot to disk failed.
    #[error("failed to persist cache to `{path}`")]
    CachePersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config or cache snapshot could not be serialized or deserialized.
    #[error("malformed JSON payload")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Circular alias/dependency configurations degrade to raw-content
    /// passthrough instead of blocking the pipeline.
    pub fn is_circular(&self) -> bool {
        matches!(
            self,
            EngineError::CircularAlias(_) | EngineError::CircularDependency(_)
        )
    }
}
