//! Content fingerprints using blake3.
//!
//! A slot's cache key is derived from its slot id, language, content, and
//! the slice of config that affects the compiled output.

use crate::config::Config;
use crate::language::{EditorId, Language};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// A hash representing "no content" (all zeros).
    #[inline]
    pub const fn empty() -> Self {
        Self([0; 32])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 16 hex chars for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Fingerprint of (slot, language, content, relevant config).
///
/// Only the style slot keys on processor toggles, so flipping a processor
/// invalidates style without touching markup/script.
pub fn slot_fingerprint(
    slot: EditorId,
    language: &Language,
    content: &str,
    config: &Config,
) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(slot.label().as_bytes());
    hasher.update(&[0]);
    hasher.update(language.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(content.as_bytes());
    hasher.update(&[0]);
    // Compiler modules read per-language settings from the config, so a
    // settings change must miss the cache. BTreeMap order keeps this
    // deterministic.
    if let Ok(settings) = serde_json::to_vec(&config.custom_settings) {
        hasher.update(&settings);
    }
    hasher.update(&[0]);
    if slot == EditorId::Style {
        let p = &config.processors;
        hasher.update(&[
            p.tailwindcss as u8,
            p.preset_env as u8,
            p.autoprefixer as u8,
            p.minify as u8,
        ]);
    }
    ContentHash::new(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(s: &str) -> Language {
        Language::from(s)
    }

    #[test]
    fn display_shows_short_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(format!("{hash}"), "abababababababab");
    }

    #[test]
    fn same_inputs_same_fingerprint() {
        let config = Config::default();
        let a = slot_fingerprint(EditorId::Markup, &lang("markdown"), "# hi", &config);
        let b = slot_fingerprint(EditorId::Markup, &lang("markdown"), "# hi", &config);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn content_language_and_slot_all_participate() {
        let config = Config::default();
        let base = slot_fingerprint(EditorId::Markup, &lang("markdown"), "# hi", &config);

        let content = slot_fingerprint(EditorId::Markup, &lang("markdown"), "# bye", &config);
        let language = slot_fingerprint(EditorId::Markup, &lang("html"), "# hi", &config);
        let slot = slot_fingerprint(EditorId::Script, &lang("markdown"), "# hi", &config);

        assert_ne!(base, content);
        assert_ne!(base, language);
        assert_ne!(base, slot);
    }

    #[test]
    fn custom_settings_participate_in_fingerprint() {
        let mut config = Config::default();
        let before = slot_fingerprint(EditorId::Script, &lang("typescript"), "let x = 1", &config);

        config.custom_settings.insert(
            "typescript".into(),
            serde_json::json!({ "target": "es2015" }),
        );
        let after = slot_fingerprint(EditorId::Script, &lang("typescript"), "let x = 1", &config);
        assert_ne!(before, after);
    }

    #[test]
    fn processor_toggle_invalidates_style_only() {
        let mut config = Config::default();
        let style = slot_fingerprint(EditorId::Style, &lang("css"), "a{}", &config);
        let markup = slot_fingerprint(EditorId::Markup, &lang("html"), "<p>", &config);

        config.processors.autoprefixer = true;
        assert_ne!(
            style,
            slot_fingerprint(EditorId::Style, &lang("css"), "a{}", &config)
        );
        assert_eq!(
            markup,
            slot_fingerprint(EditorId::Markup, &lang("html"), "<p>", &config)
        );
    }
}
