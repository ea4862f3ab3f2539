//! Language registry: catalog lookup and per-slot listing.
//!
//! Two-layer structure: a pure [`LanguageRegistry`] (constructible for tests
//! with synthetic catalogs) and a process-wide singleton holding the default
//! catalog.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

use super::catalog;
use super::spec::{EditorId, Language, LanguageSpec};
use crate::compiler::Compiler;
use crate::config::Config;
use crate::error::EngineError;

// ============================================================================
// Registry
// ============================================================================

/// Authoritative catalog of languages and their compilers.
///
/// # Invariants
/// - Every extension alias maps to exactly one canonical spec
/// - Specs and compilers are immutable after construction
#[derive(Debug)]
pub struct LanguageRegistry {
    specs: Vec<LanguageSpec>,
    /// Canonical id and every alias → index into `specs`.
    index: FxHashMap<Language, usize>,
    /// Canonical id → compiler contract. Entries without a spec are allowed
    /// (style processors resolve their modules through the same table).
    compilers: FxHashMap<Language, Compiler>,
}

impl LanguageRegistry {
    /// Build a registry from a catalog. Later specs never shadow earlier
    /// ones; the first binding of an id wins.
    pub fn new(specs: Vec<LanguageSpec>, compilers: FxHashMap<Language, Compiler>) -> Self {
        let mut index = FxHashMap::default();
        for (i, spec) in specs.iter().enumerate() {
            index.entry(spec.name.clone()).or_insert(i);
            for ext in &spec.extensions {
                index.entry(ext.clone()).or_insert(i);
            }
        }
        Self {
            specs,
            index,
            compilers,
        }
    }

    /// Look up a spec by canonical id or alias.
    pub fn lookup(&self, id: &Language) -> Result<&LanguageSpec, EngineError> {
        self.index
            .get(id)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| EngineError::LanguageNotFound(id.clone()))
    }

    /// Resolve any alias/extension id to the canonical language id.
    pub fn canonical(&self, id: &Language) -> Result<Language, EngineError> {
        self.lookup(id).map(|spec| spec.name.clone())
    }

    /// Languages selectable for a slot, in catalog order, filtered by
    /// `Config.languages` when set.
    pub fn list_for_editor(&self, editor: EditorId, config: &Config) -> Vec<&LanguageSpec> {
        self.specs
            .iter()
            .filter(|spec| spec.editor == editor)
            .filter(|spec| match &config.languages {
                None => true,
                Some(allowed) => allowed.iter().any(|lang| {
                    lang == &spec.name || spec.extensions.contains(lang)
                }),
            })
            .collect()
    }

    /// The compiler contract registered for a canonical id, if any.
    /// Languages without one (e.g. `css`) are served raw.
    pub fn compiler(&self, id: &Language) -> Option<&Compiler> {
        self.compilers.get(id)
    }

    /// Whether `id` names a terminal output language (HTML/CSS/JS).
    pub fn is_canonical_target(&self, id: &Language) -> bool {
        EditorId::ALL
            .iter()
            .any(|slot| slot.canonical_target() == id.as_str())
    }
}

// ============================================================================
// Global Registry
// ============================================================================

static REGISTRY: LazyLock<LanguageRegistry> =
    LazyLock::new(|| LanguageRegistry::new(catalog::specs(), catalog::compilers()));

/// The process-wide registry with the default catalog.
#[inline]
pub fn registry() -> &'static LanguageRegistry {
    &REGISTRY
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(s: &str) -> Language {
        Language::from(s)
    }

    #[test]
    fn lookup_canonical_id() {
        let spec = registry().lookup(&lang("markdown")).unwrap();
        assert_eq!(spec.name, lang("markdown"));
        assert_eq!(spec.editor, EditorId::Markup);
    }

    #[test]
    fn alias_resolves_to_canonical_spec() {
        let by_alias = registry().lookup(&lang("md")).unwrap();
        let by_name = registry().lookup(&lang("markdown")).unwrap();
        assert_eq!(by_alias.name, by_name.name);

        assert_eq!(registry().canonical(&lang("ts")).unwrap(), lang("typescript"));
        assert_eq!(registry().canonical(&lang("htm")).unwrap(), lang("html"));
    }

    #[test]
    fn unknown_language_fails() {
        let err = registry().lookup(&lang("brainfuck")).unwrap_err();
        assert!(matches!(err, EngineError::LanguageNotFound(_)));
    }

    #[test]
    fn list_for_editor_respects_slot() {
        let config = Config::default();
        let styles = registry().list_for_editor(EditorId::Style, &config);
        assert!(styles.iter().any(|s| s.name == lang("css")));
        assert!(styles.iter().all(|s| s.editor == EditorId::Style));
    }

    #[test]
    fn list_for_editor_filters_by_allowed_languages() {
        let config = Config {
            languages: Some(vec![lang("html"), lang("md"), lang("css"), lang("js")]),
            ..Config::default()
        };
        let markup = registry().list_for_editor(EditorId::Markup, &config);
        let names: Vec<_> = markup.iter().map(|s| s.name.as_str()).collect();
        // `md` is an alias: it still selects the canonical markdown spec
        assert_eq!(names, vec!["html", "markdown"]);
    }

    #[test]
    fn canonical_targets() {
        assert!(registry().is_canonical_target(&lang("html")));
        assert!(registry().is_canonical_target(&lang("css")));
        assert!(registry().is_canonical_target(&lang("javascript")));
        assert!(!registry().is_canonical_target(&lang("typescript")));
    }
}
