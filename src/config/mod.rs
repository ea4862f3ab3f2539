//! Playground configuration.
//!
//! A [`Config`] is created once at initialization from defaults merged with
//! external parameters, then replaced atomically through the engine's
//! set-operation. `version` is immutable after creation.

mod handle;

pub use handle::ConfigHandle;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::language::{EditorId, Language};

// ============================================================================
// Content Units
// ============================================================================

/// One slot's content unit: a language plus raw content, inline or by
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_language")]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            content: None,
            content_url: None,
        }
    }
}

impl EditorConfig {
    pub fn new(language: &str, content: &str) -> Self {
        Self {
            language: Language::from(language),
            content: Some(content.to_string()),
            content_url: None,
        }
    }
}

fn default_language() -> Language {
    Language::from("html")
}

// ============================================================================
// Processors
// ============================================================================

/// Style post-processor toggles. Declared pipeline order: utility-class
/// generation, modern-CSS lowering, vendor prefixing, minification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorsConfig {
    pub tailwindcss: bool,
    pub preset_env: bool,
    pub autoprefixer: bool,
    pub minify: bool,
}

// ============================================================================
// Types Metadata
// ============================================================================

/// Type-declaration reference for the script editor: a bare URL or a
/// qualified form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeValue {
    Url(String),
    Qualified {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declare_as_module: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        autoload: Option<bool>,
    },
}

// ============================================================================
// Config
// ============================================================================

/// Editor backend choice. The engine never talks to a backend directly; this
/// only tells UI collaborators which widget to mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorBackend {
    Monaco,
    #[default]
    Codemirror,
    Prism,
}

/// Global playground settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,

    /// Recompile automatically after the debounce quiet window.
    pub autoupdate: bool,
    pub autosave: bool,
    /// Debounce quiet window in milliseconds.
    pub delay: u64,
    pub format_on_save: bool,

    pub active_editor: Option<EditorId>,
    /// When set, restricts the selectable languages (ids or aliases).
    pub languages: Option<Vec<Language>>,

    pub markup: EditorConfig,
    pub style: EditorConfig,
    pub script: EditorConfig,

    /// External stylesheet URLs, emitted in declared order.
    pub stylesheets: Vec<String>,
    /// External script URLs, emitted in declared order.
    pub scripts: Vec<String>,
    /// Base stylesheet preset (e.g. `normalize.css`).
    pub css_preset: Option<String>,

    pub processors: ProcessorsConfig,

    /// Freeform per-language settings passed through to compiler modules.
    pub custom_settings: BTreeMap<String, serde_json::Value>,
    /// Import map entries.
    pub imports: BTreeMap<String, String>,
    /// Type-declaration references.
    pub types: BTreeMap<String, TypeValue>,

    pub editor: EditorBackend,
    /// Config schema version. Immutable after creation.
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Untitled Project".to_string(),
            description: String::new(),
            tags: Vec::new(),
            autoupdate: true,
            autosave: false,
            delay: 1500,
            format_on_save: false,
            active_editor: None,
            languages: None,
            markup: EditorConfig::new("html", ""),
            style: EditorConfig::new("css", ""),
            script: EditorConfig::new("javascript", ""),
            stylesheets: Vec::new(),
            scripts: Vec::new(),
            css_preset: None,
            processors: ProcessorsConfig::default(),
            custom_settings: BTreeMap::new(),
            imports: BTreeMap::new(),
            types: BTreeMap::new(),
            editor: EditorBackend::default(),
            version: "3".to_string(),
        }
    }
}

impl Config {
    /// Defaults merged with external parameters (query params, templates,
    /// embed options). Unknown keys are ignored; `version` always comes from
    /// the defaults.
    pub fn build(params: serde_json::Value) -> Result<Self, EngineError> {
        let defaults = Self::default();
        let version = defaults.version.clone();
        let mut base = serde_json::to_value(&defaults)?;
        merge_json(&mut base, params);
        let mut config: Config = serde_json::from_value(base)?;
        config.version = version;
        Ok(config)
    }

    /// The content unit for a slot.
    pub fn editor(&self, slot: EditorId) -> &EditorConfig {
        match slot {
            EditorId::Markup => &self.markup,
            EditorId::Style => &self.style,
            EditorId::Script => &self.script,
        }
    }

    pub(crate) fn editor_mut(&mut self, slot: EditorId) -> &mut EditorConfig {
        match slot {
            EditorId::Markup => &mut self.markup,
            EditorId::Style => &mut self.style,
            EditorId::Script => &mut self.script,
        }
    }
}

/// Recursive merge of `overlay` into `base`. Objects merge key-wise,
/// everything else replaces.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ============================================================================
// CSS Presets
// ============================================================================

/// Stylesheet URL for a named CSS preset.
pub fn css_preset_url(id: &str) -> Option<&'static str> {
    match id {
        "normalize.css" => Some("https://cdn.jsdelivr.net/npm/normalize.css/normalize.min.css"),
        "reset-css" => Some("https://cdn.jsdelivr.net/npm/reset-css/reset.min.css"),
        "github-markdown-css" => {
            Some("https://cdn.jsdelivr.net/npm/github-markdown-css/github-markdown.min.css")
        }
        "asciidoctor.css" => {
            Some("https://cdn.jsdelivr.net/npm/@asciidoctor/core/dist/css/asciidoctor.css")
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_merges_params_over_defaults() {
        let config = Config::build(json!({
            "title": "demo",
            "delay": 200,
            "markup": { "language": "markdown", "content": "# hi" },
            "processors": { "autoprefixer": true },
        }))
        .unwrap();

        assert_eq!(config.title, "demo");
        assert_eq!(config.delay, 200);
        assert_eq!(config.markup.language, Language::from("markdown"));
        assert!(config.processors.autoprefixer);
        // untouched defaults survive the merge
        assert!(config.autoupdate);
        assert_eq!(config.style.language, Language::from("css"));
    }

    #[test]
    fn build_ignores_version_override() {
        let config = Config::build(json!({ "version": "99" })).unwrap();
        assert_eq!(config.version, Config::default().version);
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = Config::default();
        config.imports.insert(
            "react".into(),
            "https://esm.sh/react".into(),
        );
        config.types.insert(
            "lodash".into(),
            TypeValue::Qualified {
                url: "https://example.com/lodash.d.ts".into(),
                declare_as_module: Some(true),
                autoload: None,
            },
        );

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn type_value_accepts_bare_url() {
        let value: TypeValue = serde_json::from_str("\"https://x/y.d.ts\"").unwrap();
        assert_eq!(value, TypeValue::Url("https://x/y.d.ts".into()));
    }
}
