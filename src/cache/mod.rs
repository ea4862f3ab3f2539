//! Compiled-output caching and the serializable snapshot unit.
//!
//! The [`Cache`] snapshot is what persistence/sync collaborators exchange:
//! content-config fields, the three per-slot [`EditorCache`] entries, the
//! assembled result, and the style-only flag. It round-trips losslessly
//! through JSON.

mod fingerprint;
mod store;

pub use fingerprint::{ContentHash, slot_fingerprint};
pub use store::{CacheStore, EditorCache};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::{Config, EditorConfig, ProcessorsConfig, TypeValue};
use crate::error::EngineError;
use crate::language::{EditorId, Language};

// ============================================================================
// Content Metadata
// ============================================================================

/// The content-describing subset of [`Config`] carried inside a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentMeta {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub active_editor: Option<EditorId>,
    pub languages: Option<Vec<Language>>,
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
    pub css_preset: Option<String>,
    pub processors: ProcessorsConfig,
    pub custom_settings: BTreeMap<String, serde_json::Value>,
    pub imports: BTreeMap<String, String>,
    pub types: BTreeMap<String, TypeValue>,
    pub version: String,
}

impl From<&Config> for ContentMeta {
    fn from(config: &Config) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            tags: config.tags.clone(),
            active_editor: config.active_editor,
            languages: config.languages.clone(),
            stylesheets: config.stylesheets.clone(),
            scripts: config.scripts.clone(),
            css_preset: config.css_preset.clone(),
            processors: config.processors,
            custom_settings: config.custom_settings.clone(),
            imports: config.imports.clone(),
            types: config.types.clone(),
            version: config.version.clone(),
        }
    }
}

impl ContentMeta {
    /// Write these content fields back onto a config (restore path).
    pub fn apply_to(&self, config: &mut Config) {
        config.title = self.title.clone();
        config.description = self.description.clone();
        config.tags = self.tags.clone();
        config.active_editor = self.active_editor;
        config.languages = self.languages.clone();
        config.stylesheets = self.stylesheets.clone();
        config.scripts = self.scripts.clone();
        config.css_preset = self.css_preset.clone();
        config.processors = self.processors;
        config.custom_settings = self.custom_settings.clone();
        config.imports = self.imports.clone();
        config.types = self.types.clone();
    }
}

// ============================================================================
// Cache Snapshot
// ============================================================================

/// Assembled snapshot of the whole playground state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub markup: EditorCache,
    pub style: EditorCache,
    pub script: EditorCache,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub style_only_update: bool,
}

impl Cache {
    pub fn slot(&self, slot: EditorId) -> &EditorCache {
        match slot {
            EditorId::Markup => &self.markup,
            EditorId::Style => &self.style,
            EditorId::Script => &self.script,
        }
    }

    /// Build a snapshot from the store and the current config.
    pub fn from_store(store: &CacheStore, config: &Config) -> Self {
        let slot = |id: EditorId| {
            store.last_good(id).cloned().unwrap_or_else(|| {
                let editor = config.editor(id);
                EditorCache {
                    language: editor.language.clone(),
                    content: editor.content.clone().unwrap_or_default(),
                    content_url: editor.content_url.clone(),
                    ..EditorCache::default()
                }
            })
        };
        Self {
            meta: ContentMeta::from(config),
            markup: slot(EditorId::Markup),
            style: slot(EditorId::Style),
            script: slot(EditorId::Script),
            result: store.result().to_string(),
            style_only_update: store.style_only_update(),
        }
    }

    /// Restore a store from this snapshot. Fingerprints are recomputed from
    /// the restored content, so a later identical edit is still a cache hit.
    pub fn restore_into(&self, store: &mut CacheStore, config: &Config) {
        for slot in EditorId::ALL {
            let cache = self.slot(slot);
            let fingerprint = slot_fingerprint(slot, &cache.language, &cache.content, config);
            store.restore_slot(slot, cache.clone(), fingerprint);
        }
        store.restore_result(self.result.clone(), self.style_only_update);
    }

    /// Editor content units for each slot (for pushing into a config).
    pub fn editors(&self) -> [(EditorId, EditorConfig); 3] {
        EditorId::ALL.map(|slot| {
            let cache = self.slot(slot);
            (
                slot,
                EditorConfig {
                    language: cache.language.clone(),
                    content: Some(cache.content.clone()),
                    content_url: cache.content_url.clone(),
                },
            )
        })
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Serialize a snapshot to pretty JSON.
pub fn to_json(cache: &Cache) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(cache)?)
}

/// Deserialize a snapshot from JSON.
pub fn from_json(json: &str) -> Result<Cache, EngineError> {
    Ok(serde_json::from_str(json)?)
}

/// Persist a snapshot to disk.
pub fn persist_cache(cache: &Cache, path: &Path) -> Result<(), EngineError> {
    let json = to_json(cache)?;
    fs::write(path, json).map_err(|source| EngineError::CachePersist {
        path: path.to_path_buf(),
        source,
    })
}

/// Restore a snapshot from disk.
pub fn restore_cache(path: &Path) -> Result<Cache, EngineError> {
    let json = fs::read_to_string(path).map_err(|source| EngineError::CachePersist {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> Cache {
        let mut config = Config::default();
        config.title = "demo".into();
        config.stylesheets = vec!["https://x/a.css".into()];
        config
            .imports
            .insert("vue".into(), "https://esm.sh/vue".into());

        let mut store = CacheStore::new();
        store.set(
            EditorId::Markup,
            1,
            slot_fingerprint(EditorId::Markup, &Language::from("markdown"), "# hi", &config),
            EditorCache {
                language: Language::from("markdown"),
                content: "# hi".into(),
                compiled: "<h1>hi</h1>".into(),
                ..EditorCache::default()
            },
        );
        store.commit_assembly("<html>doc</html>".into());
        Cache::from_store(&store, &config)
    }

    #[test]
    fn snapshot_round_trips_losslessly() {
        let cache = sample_cache();
        let json = to_json(&cache).unwrap();
        let back = from_json(&json).unwrap();
        assert_eq!(cache, back);
    }

    #[test]
    fn restore_rebuilds_equivalent_store_state() {
        let cache = sample_cache();
        let mut config = Config::default();
        cache.meta.apply_to(&mut config);

        let mut store = CacheStore::new();
        cache.restore_into(&mut store, &config);

        let markup = store.last_good(EditorId::Markup).unwrap();
        assert_eq!(markup.compiled, "<h1>hi</h1>");
        assert_eq!(store.result(), "<html>doc</html>");

        // Recomputed fingerprint still hits for identical content
        let fp = slot_fingerprint(EditorId::Markup, &Language::from("markdown"), "# hi", &config);
        assert!(store.get(EditorId::Markup, &fp).is_some());
    }

    #[test]
    fn persistence_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("project.json");

        let cache = sample_cache();
        persist_cache(&cache, &path).unwrap();
        let back = restore_cache(&path).unwrap();
        assert_eq!(cache, back);
    }

    #[test]
    fn restore_missing_file_fails_cleanly() {
        let err = restore_cache(Path::new("/nonexistent/cache.json")).unwrap_err();
        assert!(matches!(err, EngineError::CachePersist { .. }));
    }
}
