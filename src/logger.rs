//! Logging utilities with colored module prefixes.
//!
//! Provides the `log!` and `debug!` macros used across the engine. Output
//! goes to stderr so it never mixes with a host's stdout protocol.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global verbose flag (set by the embedding host)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when verbose mode is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    eprintln!("{} {}", colorize_prefix(module), message);
}

/// Color the `[module]` prefix by module name.
fn colorize_prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module {
        "error" => tag.red().bold().to_string(),
        "compile" => tag.cyan().to_string(),
        "loader" => tag.magenta().to_string(),
        "processor" => tag.yellow().to_string(),
        "engine" => tag.blue().to_string(),
        _ => tag.green().to_string(),
    }
}
