//! Compiler contracts: the pluggable unit of the compile pipeline.
//!
//! A [`Compiler`] describes *how* a language reaches a canonical target
//! (dependencies, alias substitution, output language) and *how* its output
//! is placed into the assembled document (script type, defer, inline
//! wrapping). The executable compile function itself is produced by a
//! module source and cached by the [`loader`].

pub mod builtin;
pub mod loader;
pub mod resolver;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::Config;
use crate::error::EngineError;
use crate::language::Language;

// ============================================================================
// Compile Function
// ============================================================================

/// Future returned by a compile step.
pub type CompileFuture = Pin<Box<dyn Future<Output = Result<String, EngineError>> + Send>>;

/// An executable compile step: `(source, context) → compiled output`.
pub type CompileFn = Arc<dyn Fn(String, CompileContext) -> CompileFuture + Send + Sync>;

/// Per-invocation input to a compile function.
#[derive(Clone)]
pub struct CompileContext {
    /// Effective config at the time the compile task was started.
    pub config: Arc<Config>,
    /// Canonical id of the language being compiled.
    pub language: Language,
    /// Compiled output of each declared dependency, keyed by language.
    /// Auxiliary input only; compilers decide whether to merge it.
    pub dependencies: FxHashMap<Language, String>,
}

impl CompileContext {
    pub fn new(config: Arc<Config>, language: Language) -> Self {
        Self {
            config,
            language,
            dependencies: FxHashMap::default(),
        }
    }
}

// ============================================================================
// Assembly Directives
// ============================================================================

/// `type` attribute for the compiled script tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptType {
    /// `type="module"`
    Module,
    /// A custom MIME type consumed by a runtime the compiler contributes
    /// (e.g. `text/python`, `application/json`).
    Mime(String),
}

impl ScriptType {
    pub fn as_attr(&self) -> &str {
        match self {
            ScriptType::Module => "module",
            ScriptType::Mime(mime) => mime,
        }
    }
}

/// Extra styles or scripts a compiler contributes to the document.
#[derive(Default, Clone)]
pub enum Contribution {
    #[default]
    None,
    /// Fixed list of URLs.
    Urls(Vec<String>),
    /// Computed from the compiled output (e.g. a runtime included only when
    /// the output actually needs it).
    FromCompiled(Arc<dyn Fn(&str, &Config) -> Vec<String> + Send + Sync>),
}

impl Contribution {
    pub fn urls(urls: &[&str]) -> Self {
        Contribution::Urls(urls.iter().map(|u| u.to_string()).collect())
    }

    /// Resolve to a concrete URL list for the given compiled output.
    pub fn resolve(&self, compiled: &str, config: &Config) -> Vec<String> {
        match self {
            Contribution::None => Vec::new(),
            Contribution::Urls(urls) => urls.clone(),
            Contribution::FromCompiled(f) => f(compiled, config),
        }
    }
}

impl fmt::Debug for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::None => f.write_str("None"),
            Contribution::Urls(urls) => f.debug_tuple("Urls").field(urls).finish(),
            Contribution::FromCompiled(_) => f.write_str("FromCompiled(..)"),
        }
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Declarative compiler contract for one language.
#[derive(Debug, Default, Clone)]
pub struct Compiler {
    /// Languages whose compiled output this compiler needs as auxiliary
    /// input. Must form a DAG across the catalog.
    pub dependencies: Vec<Language>,
    /// Substitute another language's compiler entirely (e.g. `tsx` →
    /// `typescript`).
    pub alias_to: Option<Language>,
    /// Syntax of this compiler's output. `None` means the slot's canonical
    /// target; a non-canonical language continues the chain.
    pub compiled_code_language: Option<Language>,
    /// Module location for the loader. `None` for built-in compilers.
    pub url: Option<String>,
    /// Extra stylesheets the compiler adds to the document.
    pub styles: Contribution,
    /// Extra scripts (runtimes) the compiler adds to the document.
    pub scripts: Contribution,
    /// `type` attribute for the compiled script tag.
    pub script_type: Option<ScriptType>,
    /// Defer execution of the compiled script until the document (and the
    /// contributed runtime scripts) have loaded.
    pub defer_scripts: bool,
    /// Literal script appended after the compiled script (runtime kick-off).
    pub inline_script: Option<String>,
}

impl Compiler {
    pub fn with_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn alias_of(language: &str) -> Self {
        Self {
            alias_to: Some(Language::from(language)),
            ..Self::default()
        }
    }
}
