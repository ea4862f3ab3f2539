//! Compilation and live-preview orchestration for a multi-language code
//! playground.
//!
//! Three content slots (markup, style, script) each carry a language and raw
//! content. Edits are debounced, compiled through per-language compiler
//! modules to the slot's canonical target (`html`, `css`, `javascript`),
//! post-processed, and assembled into one executable HTML document.
//!
//! The crate is host-agnostic: editors are trait objects, compiler modules
//! arrive through pluggable [`compiler::loader::ModuleSource`]s, and results
//! plus out-of-band failures are delivered over a broadcast channel. The
//! [`engine::Engine`] must be driven inside a Tokio runtime.

pub mod assemble;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod logger;
pub mod processor;

pub use cache::{Cache, CacheStore, ContentHash, EditorCache};
pub use config::{Config, ConfigHandle, EditorConfig, ProcessorsConfig};
pub use engine::{BufferEditor, Code, CodeEditor, CodeSlot, Editors, Engine, EngineEvent};
pub use error::EngineError;
pub use language::{EditorId, Language, LanguageRegistry, registry};
