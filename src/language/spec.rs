//! Language ids, editor slots, and per-language specs.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Language
// ============================================================================

/// A language identifier: a canonical id (`markdown`) or an alias/extension
/// id (`md`). Cheap to clone, compared by string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(Box<str>);

impl Language {
    pub fn new(id: impl Into<Box<str>>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Language {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// EditorId
// ============================================================================

/// One of the three fixed content slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorId {
    Markup,
    Style,
    Script,
}

impl EditorId {
    pub const ALL: [EditorId; 3] = [EditorId::Markup, EditorId::Style, EditorId::Script];

    pub fn label(self) -> &'static str {
        match self {
            EditorId::Markup => "markup",
            EditorId::Style => "style",
            EditorId::Script => "script",
        }
    }

    /// The terminal output language of any compile chain for this slot.
    pub fn canonical_target(self) -> &'static str {
        match self {
            EditorId::Markup => "html",
            EditorId::Style => "css",
            EditorId::Script => "javascript",
        }
    }

    /// Stable index for per-slot arrays.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// LanguageSpec
// ============================================================================

/// Static description of one registered language.
///
/// Immutable after registry initialization. The executable compiler is kept
/// separately in the registry's compiler table; specs only carry metadata.
#[derive(Debug, Clone)]
pub struct LanguageSpec {
    /// Canonical id.
    pub name: Language,
    /// Short display title (e.g. `TS`).
    pub title: String,
    /// Long display title (e.g. `TypeScript`). Falls back to `title`.
    pub long_title: Option<String>,
    /// The slot this language may occupy.
    pub editor: EditorId,
    /// Alias/extension ids that resolve to this spec (e.g. `md`, `mdown`).
    pub extensions: Vec<Language>,
    /// Formatter parser name, when a formatter is available.
    pub parser: Option<String>,
    /// Syntax-highlighting language when it differs from `name`.
    pub editor_language: Option<Language>,
}

impl LanguageSpec {
    pub fn new(name: &str, title: &str, editor: EditorId) -> Self {
        Self {
            name: Language::from(name),
            title: title.to_string(),
            long_title: None,
            editor,
            extensions: Vec::new(),
            parser: None,
            editor_language: None,
        }
    }

    pub fn long_title(mut self, long_title: &str) -> Self {
        self.long_title = Some(long_title.to_string());
        self
    }

    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| Language::from(*e)).collect();
        self
    }

    pub fn parser(mut self, parser: &str) -> Self {
        self.parser = Some(parser.to_string());
        self
    }

    pub fn editor_language(mut self, language: &str) -> Self {
        self.editor_language = Some(Language::from(language));
        self
    }
}
