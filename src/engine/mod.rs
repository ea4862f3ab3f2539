//! The orchestration engine: debounced, cancelable, per-slot compile cycles
//! joined into one assembled preview document.
//!
//! Execution is cooperative and asynchronous; the engine must be created and
//! driven inside a Tokio runtime. Each slot carries a monotonically
//! increasing generation counter: a new edit supersedes the pending debounce
//! timer, and an in-flight compile whose captured generation no longer
//! matches is discarded rather than force-aborted.

mod editor;

pub use editor::{BufferEditor, ChangeCallback, CodeEditor, FormatFn};

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::assemble;
use crate::cache::{Cache, CacheStore, EditorCache, slot_fingerprint};
use crate::compiler::loader::{ModuleLoader, loader};
use crate::compiler::{CompileContext, resolver};
use crate::config::{Config, ConfigHandle};
use crate::error::EngineError;
use crate::language::{EditorId, Language, LanguageRegistry, registry};
use crate::processor;

// ============================================================================
// Events & Snapshots
// ============================================================================

/// Out-of-band signals for tool panes and other listeners. Pipeline failures
/// arrive here; they never abort an update cycle.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A new preview document was committed.
    ResultReady { style_only: bool },
    /// A compiler rejected the slot's content; the previous output is kept.
    CompileError { slot: EditorId, error: String },
    /// A compiler module failed to load; it will be retried on next request.
    ModuleLoadFailed { language: Language, error: String },
    /// A style processor failed; its input passed through unchanged.
    ProcessorFailure { error: String },
}

/// Read-only snapshot of one slot for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct CodeSlot {
    pub language: Language,
    pub content: String,
    pub compiled: String,
}

/// Read-only snapshot of the whole playground, never mutated internally.
#[derive(Debug, Clone, Serialize)]
pub struct Code {
    pub markup: CodeSlot,
    pub style: CodeSlot,
    pub script: CodeSlot,
    pub result: String,
}

/// The three editor backends, one per slot.
pub struct Editors {
    pub markup: Arc<dyn CodeEditor>,
    pub style: Arc<dyn CodeEditor>,
    pub script: Arc<dyn CodeEditor>,
}

impl Editors {
    /// In-memory backends seeded from a config's content units.
    pub fn buffers(config: &Config) -> Self {
        let buffer = |slot: EditorId| -> Arc<dyn CodeEditor> {
            let unit = config.editor(slot);
            BufferEditor::new(
                unit.language.as_str(),
                unit.content.as_deref().unwrap_or_default(),
            )
        };
        Self {
            markup: buffer(EditorId::Markup),
            style: buffer(EditorId::Style),
            script: buffer(EditorId::Script),
        }
    }

    fn get(&self, slot: EditorId) -> &Arc<dyn CodeEditor> {
        match slot {
            EditorId::Markup => &self.markup,
            EditorId::Style => &self.style,
            EditorId::Script => &self.script,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct Engine {
    config: ConfigHandle,
    editors: Editors,
    loader: Arc<ModuleLoader>,
    store: Mutex<CacheStore>,
    generations: [AtomicU64; 3],
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Create an engine over the given editors, using the process-wide
    /// module loader.
    pub fn new(editors: Editors, config: Config) -> Arc<Self> {
        Self::with_loader(editors, config, loader())
    }

    /// Create an engine with an explicit loader (isolated tests, embedders
    /// with their own module sources).
    pub fn with_loader(editors: Editors, config: Config, loader: Arc<ModuleLoader>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let engine = Arc::new(Self {
            config: ConfigHandle::new(config),
            editors,
            loader,
            store: Mutex::new(CacheStore::new()),
            generations: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            events,
        });
        engine.wire_editors();
        engine
    }

    /// Subscribe to out-of-band engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------------

    /// Compile all three slots (cache hits are free), assemble, and commit
    /// the new preview document. Resolves once the document is committed.
    pub async fn run(&self) -> String {
        let generations = EditorId::ALL.map(|slot| self.generation(slot));
        tokio::join!(
            self.compile_slot(EditorId::Markup, generations[0]),
            self.compile_slot(EditorId::Style, generations[1]),
            self.compile_slot(EditorId::Script, generations[2]),
        );
        self.commit_assembly();
        self.store.lock().result().to_string()
    }

    /// Apply each slot's registered formatter in place.
    pub async fn format(&self) {
        for slot in EditorId::ALL {
            self.editors.get(slot).format();
        }
    }

    /// Read-only snapshot of languages, contents, compiled outputs, and the
    /// last committed result.
    pub fn get_code(&self) -> Code {
        let store = self.store.lock();
        let slot = |id: EditorId| {
            let editor = self.editors.get(id);
            CodeSlot {
                language: editor.get_language(),
                content: editor.get_value(),
                compiled: store
                    .last_good(id)
                    .map(|entry| entry.compiled.clone())
                    .unwrap_or_default(),
            }
        };
        Code {
            markup: slot(EditorId::Markup),
            style: slot(EditorId::Style),
            script: slot(EditorId::Script),
            result: store.result().to_string(),
        }
    }

    /// Current effective config.
    pub fn get_config(&self) -> Arc<Config> {
        self.config.load()
    }

    /// Replace the config; returns the new effective config (`version`
    /// carried over). Slots whose language changed are invalidated and
    /// their editors updated.
    pub fn set_config(&self, config: Config) -> Arc<Config> {
        let effective = self.config.store(config);
        for slot in EditorId::ALL {
            let unit = effective.editor(slot);
            let editor = self.editors.get(slot);
            if editor.get_language() != unit.language {
                self.store.lock().invalidate(slot);
                editor.set_language(unit.language.clone(), unit.content.clone());
            }
        }
        effective
    }

    /// Serializable snapshot for persistence/sync collaborators.
    pub fn get_cache(&self) -> Cache {
        let config = self.config.load();
        Cache::from_store(&self.store.lock(), &config)
    }

    /// Restore engine state from a snapshot: config content fields, per-slot
    /// caches, assembled result, and editor contents.
    pub fn load_cache(&self, cache: &Cache) {
        let mut config = (*self.config.load()).clone();
        cache.meta.apply_to(&mut config);
        for (slot, unit) in cache.editors() {
            *config.editor_mut(slot) = unit;
        }
        let effective = self.config.store(config);

        cache.restore_into(&mut self.store.lock(), &effective);

        for slot in EditorId::ALL {
            let entry = cache.slot(slot);
            self.editors
                .get(slot)
                .set_language(entry.language.clone(), Some(entry.content.clone()));
        }
    }

    // ------------------------------------------------------------------------
    // Update Protocol
    // ------------------------------------------------------------------------

    fn wire_editors(self: &Arc<Self>) {
        for slot in EditorId::ALL {
            let weak = Arc::downgrade(self);
            self.editors.get(slot).on_content_changed(Box::new(move || {
                if let Some(engine) = weak.upgrade() {
                    engine.schedule_update(slot);
                }
            }));
        }
    }

    /// Debounced update: every edit bumps the slot generation; the compile
    /// cycle fires only when no newer edit arrived within `Config.delay`.
    fn schedule_update(self: &Arc<Self>, slot: EditorId) {
        let generation = self.bump_generation(slot);
        let config = self.config.load();
        if !config.autoupdate {
            return;
        }
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(config.delay)).await;
            if engine.generation(slot) != generation {
                // Superseded within the quiet window
                return;
            }
            engine.compile_slot(slot, generation).await;
            engine.commit_assembly();
        });
    }

    async fn compile_slot(&self, slot: EditorId, generation: u64) {
        let config = self.config.load();
        let editor = self.editors.get(slot);
        let language = editor.get_language();
        let content = editor.get_value();
        let fingerprint = slot_fingerprint(slot, &language, &content, &config);

        if self.store.lock().get(slot, &fingerprint).is_some() {
            crate::debug!("compile"; "{slot} cache hit ({fingerprint})");
            return;
        }

        let compiled = match self
            .compile_content(registry(), &language, &content, &config)
            .await
        {
            Ok(out) => out,
            Err(err) if err.is_circular() => {
                // Configuration defect: pass raw content through so the
                // pipeline keeps moving
                crate::log!("error"; "{err}; using raw content for {slot}");
                self.emit(EngineEvent::CompileError {
                    slot,
                    error: err.to_string(),
                });
                content.clone()
            }
            Err(err) => {
                // Previous good output stays cached; the preview is never
                // blanked by a broken toolchain
                crate::log!("error"; "{err}");
                let event = match err {
                    EngineError::ModuleLoad { language, reason } => {
                        EngineEvent::ModuleLoadFailed {
                            language,
                            error: reason,
                        }
                    }
                    other => EngineEvent::CompileError {
                        slot,
                        error: other.to_string(),
                    },
                };
                self.emit(event);
                return;
            }
        };

        let compiled = if slot == EditorId::Style {
            let (out, failures) =
                processor::run_style_pipeline(compiled, &config, &self.loader, registry()).await;
            for failure in failures {
                self.emit(EngineEvent::ProcessorFailure {
                    error: failure.to_string(),
                });
            }
            out
        } else {
            compiled
        };

        let entry = EditorCache {
            language,
            content,
            content_url: None,
            compiled,
            modified: None,
        };
        self.store.lock().set(slot, generation, fingerprint, entry);
    }

    /// Run the resolved compile chain for `language` over `content`.
    async fn compile_content(
        &self,
        registry: &LanguageRegistry,
        language: &Language,
        content: &str,
        config: &Arc<Config>,
    ) -> Result<String, EngineError> {
        let chain = resolver::resolve(registry, language)?;
        let mut code = content.to_string();

        for step in &chain.steps {
            let mut ctx = CompileContext::new(Arc::clone(config), step.language.clone());

            // Dependencies compile first; their outputs are auxiliary input.
            // Aliases substitute the same way they do for chain steps.
            for dep in &step.dependencies {
                let dep = registry.canonical(dep)?;
                let module = resolver::resolve_alias(registry, &dep)?;
                let Some(dep_compiler) = registry.compiler(&module) else {
                    continue;
                };
                let dep_fn = self.loader.load(&module, dep_compiler).await?;
                let dep_ctx = CompileContext::new(Arc::clone(config), module.clone());
                let dep_out = dep_fn(code.clone(), dep_ctx).await?;
                ctx.dependencies.insert(dep, dep_out);
            }

            let compiler = registry
                .compiler(&step.language)
                .ok_or_else(|| EngineError::LanguageNotFound(step.language.clone()))?;
            let compile = self.loader.load(&step.language, compiler).await?;
            code = compile(code, ctx).await?;
        }

        Ok(code)
    }

    /// Join point: assemble from the settled (last good) state of all three
    /// slots and commit the result. A slot still in flight contributes its
    /// previous cached value.
    fn commit_assembly(&self) {
        let config = self.config.load();
        let mut store = self.store.lock();

        let settled = |slot: EditorId| {
            store.last_good(slot).cloned().unwrap_or_else(|| {
                let editor = self.editors.get(slot);
                EditorCache {
                    language: editor.get_language(),
                    content: editor.get_value(),
                    ..EditorCache::default()
                }
            })
        };
        let markup = settled(EditorId::Markup);
        let style = settled(EditorId::Style);
        let script = settled(EditorId::Script);

        let result = assemble::assemble(&markup, &style, &script, &config, registry());
        store.commit_assembly(result);
        let style_only = store.style_only_update();
        drop(store);

        crate::debug!("engine"; "assembly committed (style_only: {style_only})");
        self.emit(EngineEvent::ResultReady { style_only });
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn generation(&self, slot: EditorId) -> u64 {
        self.generations[slot.index()].load(Ordering::SeqCst)
    }

    fn bump_generation(&self, slot: EditorId) -> u64 {
        self.generations[slot.index()].fetch_add(1, Ordering::SeqCst) + 1
    }

    fn emit(&self, event: EngineEvent) {
        // No listeners is fine
        let _ = self.events.send(event);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::loader::{LoadFuture, ModuleSource};
    use crate::compiler::{CompileFn, Compiler};
    use crate::config::EditorConfig;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn engine_with(config: Config) -> Arc<Engine> {
        let editors = Editors::buffers(&config);
        Engine::with_loader(editors, config, Arc::new(ModuleLoader::new()))
    }

    /// Source accepting every language; counts compile invocations.
    struct CountingSource(Arc<AtomicUsize>);

    impl ModuleSource for CountingSource {
        fn fetch(&self, _language: &Language, _compiler: &Compiler) -> LoadFuture {
            let count = self.0.clone();
            Box::pin(async move {
                let compile: CompileFn = Arc::new(move |code, _ctx| {
                    count.fetch_add(1, Ordering::SeqCst);
                    Box::pin(async move { Ok(code) })
                });
                Ok(compile)
            })
        }
    }

    #[tokio::test]
    async fn markdown_markup_compiles_to_html() {
        let config = Config::build(json!({
            "autoupdate": false,
            "markup": { "language": "markdown", "content": "# Title" },
        }))
        .unwrap();
        let engine = engine_with(config);

        let result = engine.run().await;
        assert!(result.contains("<h1>Title</h1>"), "got: {result}");

        let code = engine.get_code();
        assert_eq!(code.markup.compiled, "<h1>Title</h1>");
        assert!(code.style.compiled.is_empty());
        assert!(code.script.compiled.is_empty());
    }

    #[tokio::test]
    async fn second_style_edit_is_style_only() {
        let config = Config::build(json!({
            "autoupdate": false,
            "markup": { "language": "html", "content": "<p>x</p>" },
            "style": { "language": "css", "content": "a { color: red }" },
        }))
        .unwrap();
        let engine = engine_with(config);

        engine.run().await;
        assert!(!engine.get_cache().style_only_update);

        engine.editors.style.set_value("a { color: blue }");
        engine.run().await;
        assert!(engine.get_cache().style_only_update);

        // A markup edit on the next cycle clears the flag
        engine.editors.markup.set_value("<p>y</p>");
        engine.run().await;
        assert!(!engine.get_cache().style_only_update);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_within_quiet_window_collapse_to_one_update() {
        let config = Config::build(json!({ "delay": 100 })).unwrap();
        let engine = engine_with(config);
        let mut events = engine.subscribe();

        engine.editors.markup.set_value("<p>1</p>");
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.editors.markup.set_value("<p>2</p>");
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.editors.markup.set_value("<p>3</p>");
        tokio::time::sleep(Duration::from_millis(300)).await;

        // One committed result, built from the final content
        assert!(matches!(
            events.try_recv().unwrap(),
            EngineEvent::ResultReady { .. }
        ));
        assert!(events.try_recv().is_err());
        assert!(engine.get_code().result.contains("<p>3</p>"));
    }

    #[tokio::test]
    async fn unchanged_content_is_not_recompiled() {
        let compiles = Arc::new(AtomicUsize::new(0));
        let config = Config::build(json!({
            "autoupdate": false,
            "markup": { "language": "markdown", "content": "# hi" },
        }))
        .unwrap();
        let loader = Arc::new(ModuleLoader::with_sources(vec![Arc::new(
            CountingSource(compiles.clone()),
        )]));
        let engine = Engine::with_loader(Editors::buffers(&config), config, loader);

        engine.run().await;
        engine.run().await;

        // Canonical css/javascript slots are served raw; markdown compiles
        // once on the first run and is a cache hit on the second
        assert_eq!(compiles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn aliased_dependency_loads_target_module() {
        use crate::language::LanguageSpec;
        use rustc_hash::FxHashMap;

        let mut compilers = FxHashMap::default();
        compilers.insert(
            Language::from("a"),
            Compiler {
                dependencies: vec![Language::from("b")],
                url: Some("compilers/a.js".into()),
                ..Compiler::default()
            },
        );
        compilers.insert(Language::from("b"), Compiler::alias_of("c"));
        compilers.insert(Language::from("c"), Compiler::with_url("compilers/c.js"));
        let reg = LanguageRegistry::new(
            vec![
                LanguageSpec::new("javascript", "JS", EditorId::Script),
                LanguageSpec::new("a", "a", EditorId::Script),
                LanguageSpec::new("b", "b", EditorId::Script),
                LanguageSpec::new("c", "c", EditorId::Script),
            ],
            compilers,
        );

        let compiles = Arc::new(AtomicUsize::new(0));
        let loader = Arc::new(ModuleLoader::with_sources(vec![Arc::new(
            CountingSource(compiles),
        )]));
        let config = Config::build(json!({ "autoupdate": false })).unwrap();
        let engine = Engine::with_loader(
            Editors::buffers(&config),
            config,
            Arc::clone(&loader),
        );

        engine
            .compile_content(&reg, &Language::from("a"), "x", &engine.get_config())
            .await
            .unwrap();

        // The dependency's alias target supplies the module, not the alias
        assert!(loader.is_loaded(&Language::from("c")));
        assert!(!loader.is_loaded(&Language::from("b")));
    }

    #[tokio::test]
    async fn unknown_language_keeps_previous_output() {
        let config = Config::build(json!({
            "autoupdate": false,
            "markup": { "language": "markdown", "content": "# a" },
        }))
        .unwrap();
        let engine = engine_with(config);
        let mut events = engine.subscribe();

        engine.run().await;
        while events.try_recv().is_ok() {}

        engine
            .editors
            .markup
            .set_language(Language::from("cobol"), Some("MOVE".into()));
        engine.run().await;

        assert_eq!(engine.get_code().markup.compiled, "<h1>a</h1>");

        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            if matches!(
                event,
                EngineEvent::CompileError {
                    slot: EditorId::Markup,
                    ..
                }
            ) {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn set_config_language_change_invalidates_slot() {
        let config = Config::build(json!({
            "autoupdate": false,
            "markup": { "language": "markdown", "content": "# a" },
        }))
        .unwrap();
        let engine = engine_with(config);

        engine.run().await;
        assert_eq!(engine.get_code().markup.compiled, "<h1>a</h1>");

        let mut next = (*engine.get_config()).clone();
        next.markup = EditorConfig::new("html", "<p>raw</p>");
        engine.set_config(next);

        assert_eq!(engine.get_code().markup.compiled, "");
        assert_eq!(
            engine.editors.markup.get_language(),
            Language::from("html")
        );

        let result = engine.run().await;
        assert!(result.contains("<p>raw</p>"));
    }

    #[tokio::test]
    async fn cache_snapshot_restores_engine_state() {
        let config = Config::build(json!({
            "autoupdate": false,
            "markup": { "language": "markdown", "content": "# hi" },
        }))
        .unwrap();
        let engine = engine_with(config);
        engine.run().await;
        let snapshot = engine.get_cache();

        let fresh = engine_with(Config::build(json!({ "autoupdate": false })).unwrap());
        fresh.load_cache(&snapshot);

        let code = fresh.get_code();
        assert_eq!(code.markup.content, "# hi");
        assert_eq!(code.markup.compiled, "<h1>hi</h1>");
        assert_eq!(code.result, snapshot.result);

        // Restored fingerprints still hit: a run changes nothing
        let result = fresh.run().await;
        assert_eq!(result, snapshot.result);
    }

    #[tokio::test]
    async fn style_slot_runs_enabled_processors() {
        let config = Config::build(json!({
            "autoupdate": false,
            "style": { "language": "css", "content": ".box { display: flex; }" },
            "processors": { "autoprefixer": true },
        }))
        .unwrap();
        let engine = engine_with(config);

        let result = engine.run().await;
        assert!(
            result.contains("-webkit-") || result.contains("-ms-"),
            "got: {result}"
        );
    }
}
