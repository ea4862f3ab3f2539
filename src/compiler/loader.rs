//! Compiler module loader: lazy fetch, process-lifetime memoization.
//!
//! Two-layer structure like the registry: a pure [`ModuleLoader`] plus a
//! process-wide singleton. Each language gets one `OnceCell`; concurrent
//! requests for the same language share the single in-flight fetch, a
//! successful fetch is cached for the process lifetime, and a failed fetch
//! leaves the cell empty so the next request retries.

use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use tokio::sync::OnceCell;

use super::builtin::BuiltinSource;
use super::{CompileFn, Compiler};
use crate::error::EngineError;
use crate::language::Language;

/// Future returned by a module fetch.
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<CompileFn, EngineError>> + Send>>;

/// Provider of executable compiler modules.
///
/// Hosts register sources for languages whose transpilers live outside this
/// crate (scss, typescript, ...). The compiler contract's `url` tells the
/// source where the module lives.
pub trait ModuleSource: Send + Sync {
    /// Fetch and initialize the compile function for `language`.
    fn fetch(&self, language: &Language, compiler: &Compiler) -> LoadFuture;
}

// ============================================================================
// Loader
// ============================================================================

pub struct ModuleLoader {
    sources: Vec<Arc<dyn ModuleSource>>,
    cells: DashMap<Language, Arc<OnceCell<CompileFn>>>,
}

impl ModuleLoader {
    /// Loader backed by the built-in source only.
    pub fn new() -> Self {
        Self::with_sources(vec![Arc::new(BuiltinSource)])
    }

    /// Loader with explicit sources, tried in order. The first source that
    /// does not fail wins.
    pub fn with_sources(sources: Vec<Arc<dyn ModuleSource>>) -> Self {
        Self {
            sources,
            cells: DashMap::new(),
        }
    }

    /// Get the compile function for `language`, fetching it on first use.
    pub async fn load(
        &self,
        language: &Language,
        compiler: &Compiler,
    ) -> Result<CompileFn, EngineError> {
        let cell = self
            .cells
            .entry(language.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let compile = cell
            .get_or_try_init(|| self.fetch(language, compiler))
            .await?;
        Ok(compile.clone())
    }

    /// Whether the module for `language` is already cached.
    pub fn is_loaded(&self, language: &Language) -> bool {
        self.cells
            .get(language)
            .is_some_and(|cell| cell.initialized())
    }

    async fn fetch(&self, language: &Language, compiler: &Compiler) -> Result<CompileFn, EngineError> {
        let mut last_err = None;
        for source in &self.sources {
            match source.fetch(language, compiler).await {
                Ok(compile) => return Ok(compile),
                Err(err) => {
                    crate::debug!("loader"; "source failed for `{language}`: {err}");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| EngineError::ModuleLoad {
            language: language.clone(),
            reason: "no module source configured".into(),
        }))
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Global Loader
// ============================================================================

static LOADER: LazyLock<Arc<ModuleLoader>> = LazyLock::new(|| Arc::new(ModuleLoader::new()));

/// The process-wide loader shared by all engines.
#[inline]
pub fn loader() -> Arc<ModuleLoader> {
    LOADER.clone()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileContext;
    use crate::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lang(s: &str) -> Language {
        Language::from(s)
    }

    /// Source that counts fetches and can be armed to fail.
    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        fail_first: AtomicUsize,
    }

    impl CountingSource {
        fn new(fail_first: usize) -> (Arc<Self>, Arc<AtomicUsize>) {
            let fetches = Arc::new(AtomicUsize::new(0));
            let source = Arc::new(Self {
                fetches: fetches.clone(),
                fail_first: AtomicUsize::new(fail_first),
            });
            (source, fetches)
        }
    }

    impl ModuleSource for CountingSource {
        fn fetch(&self, language: &Language, _compiler: &Compiler) -> LoadFuture {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let language = language.clone();
            let fail = self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    n.checked_sub(1)
                })
                .is_ok();
            Box::pin(async move {
                if fail {
                    return Err(EngineError::ModuleLoad {
                        language,
                        reason: "fetch failed".into(),
                    });
                }
                let compile: CompileFn = Arc::new(|code, _ctx| {
                    Box::pin(async move { Ok(format!("compiled:{code}")) })
                });
                Ok(compile)
            })
        }
    }

    fn ctx(language: &str) -> CompileContext {
        CompileContext::new(Arc::new(Config::default()), lang(language))
    }

    #[tokio::test]
    async fn load_memoizes_for_process_lifetime() {
        let (source, fetches) = CountingSource::new(0);
        let loader = ModuleLoader::with_sources(vec![source]);
        let compiler = Compiler::default();

        let a = loader.load(&lang("scss"), &compiler).await.unwrap();
        let b = loader.load(&lang("scss"), &compiler).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(loader.is_loaded(&lang("scss")));

        let out = a("x".into(), ctx("scss")).await.unwrap();
        assert_eq!(out, "compiled:x");
        drop(b);
    }

    #[tokio::test]
    async fn concurrent_loads_share_one_fetch() {
        let (source, fetches) = CountingSource::new(0);
        let loader = Arc::new(ModuleLoader::with_sources(vec![source]));
        let compiler = Compiler::default();

        let less = lang("less");
        let (a, b) = tokio::join!(
            loader.load(&less, &compiler),
            loader.load(&less, &compiler),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_retries_on_next_request() {
        let (source, fetches) = CountingSource::new(1);
        let loader = ModuleLoader::with_sources(vec![source]);
        let compiler = Compiler::default();

        let Err(err) = loader.load(&lang("stylus"), &compiler).await else {
            panic!("armed failure must surface");
        };
        assert!(matches!(err, EngineError::ModuleLoad { .. }));
        assert!(!loader.is_loaded(&lang("stylus")));

        // Not poisoned: a later request fetches again and succeeds
        loader.load(&lang("stylus"), &compiler).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert!(loader.is_loaded(&lang("stylus")));
    }

    #[tokio::test]
    async fn distinct_languages_use_distinct_cells() {
        let (source, fetches) = CountingSource::new(0);
        let loader = ModuleLoader::with_sources(vec![source]);
        let compiler = Compiler::default();

        loader.load(&lang("a"), &compiler).await.unwrap();
        loader.load(&lang("b"), &compiler).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
