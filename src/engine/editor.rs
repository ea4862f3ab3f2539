//! Editor abstraction: the uniform content-change source per slot.
//!
//! The engine never talks to a concrete editor widget; UI collaborators
//! implement [`CodeEditor`] over Monaco/CodeMirror/Prism. [`BufferEditor`]
//! is the in-memory backend used by tests and headless hosts.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::language::Language;

/// In-place formatting function registered per language.
pub type FormatFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Content-change notification callback.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// One slot's text-editing backend.
pub trait CodeEditor: Send + Sync {
    fn get_value(&self) -> String;
    /// Replace the content. Implementations fire content-changed callbacks.
    fn set_value(&self, value: &str);
    fn get_language(&self) -> Language;
    /// Switch language, optionally replacing the content in the same step.
    fn set_language(&self, language: Language, value: Option<String>);
    /// Register a content-change listener (additive). Listeners run on the
    /// mutating call and must not re-enter the editor synchronously.
    fn on_content_changed(&self, callback: ChangeCallback);
    /// Register or clear the formatter used by [`format`](Self::format).
    fn register_formatter(&self, format: Option<FormatFn>);
    /// Apply the registered formatter in place. No-op without one.
    fn format(&self);
    fn focus(&self);
    /// Release resources and drop all listeners.
    fn destroy(&self);
}

// ============================================================================
// BufferEditor
// ============================================================================

/// Plain in-memory editor backend.
pub struct BufferEditor {
    language: Mutex<Language>,
    content: Mutex<String>,
    listeners: Mutex<Vec<ChangeCallback>>,
    formatter: Mutex<Option<FormatFn>>,
}

impl BufferEditor {
    pub fn new(language: &str, content: &str) -> Arc<Self> {
        Arc::new(Self {
            language: Mutex::new(Language::from(language)),
            content: Mutex::new(content.to_string()),
            listeners: Mutex::new(Vec::new()),
            formatter: Mutex::new(None),
        })
    }

    fn notify(&self) {
        // Called with the listener list locked: callbacks must not
        // re-enter the editor synchronously
        let listeners = self.listeners.lock();
        for listener in listeners.iter() {
            listener();
        }
    }
}

impl CodeEditor for BufferEditor {
    fn get_value(&self) -> String {
        self.content.lock().clone()
    }

    fn set_value(&self, value: &str) {
        *self.content.lock() = value.to_string();
        self.notify();
    }

    fn get_language(&self) -> Language {
        self.language.lock().clone()
    }

    fn set_language(&self, language: Language, value: Option<String>) {
        *self.language.lock() = language;
        if let Some(value) = value {
            *self.content.lock() = value;
        }
        self.notify();
    }

    fn on_content_changed(&self, callback: ChangeCallback) {
        self.listeners.lock().push(callback);
    }

    fn register_formatter(&self, format: Option<FormatFn>) {
        *self.formatter.lock() = format;
    }

    fn format(&self) {
        let formatter = self.formatter.lock().clone();
        if let Some(format) = formatter {
            let formatted = format(&self.get_value());
            self.set_value(&formatted);
        }
    }

    fn focus(&self) {}

    fn destroy(&self) {
        self.listeners.lock().clear();
        *self.formatter.lock() = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
