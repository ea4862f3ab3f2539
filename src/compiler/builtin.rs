//! Built-in compiler modules.
//!
//! Canonical targets pass through unchanged; markdown compiles in-crate via
//! pulldown-cmark. Everything else must come from a host-registered
//! [`ModuleSource`](super::loader::ModuleSource).

use pulldown_cmark::{Options, Parser, html};
use std::sync::Arc;

use super::loader::{LoadFuture, ModuleSource};
use super::{CompileFn, Compiler};
use crate::error::EngineError;
use crate::language::Language;

/// Source for the compilers this crate ships with.
pub(crate) struct BuiltinSource;

impl ModuleSource for BuiltinSource {
    fn fetch(&self, language: &Language, _compiler: &Compiler) -> LoadFuture {
        let language = language.clone();
        Box::pin(async move {
            match language.as_str() {
                // Canonical targets and JSON are served as-is; JSON's
                // script-type directive lives on its compiler contract.
                "html" | "css" | "javascript" | "json" => Ok(passthrough()),
                "markdown" => Ok(markdown()),
                _ => Err(EngineError::ModuleLoad {
                    language,
                    reason: "no module source registered".into(),
                }),
            }
        })
    }
}

/// Identity compile function.
pub fn passthrough() -> CompileFn {
    Arc::new(|code, _ctx| Box::pin(async move { Ok(code) }))
}

/// Markdown → HTML via pulldown-cmark, CommonMark plus the extensions the
/// playground enables everywhere.
pub fn markdown() -> CompileFn {
    Arc::new(|code, _ctx| {
        Box::pin(async move {
            let options = Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS;
            let parser = Parser::new_ext(&code, options);
            let mut out = String::with_capacity(code.len() * 2);
            html::push_html(&mut out, parser);
            Ok(out.trim_end().to_string())
        })
    })
}
