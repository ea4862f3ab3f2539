//! Style post-processor pipeline.
//!
//! Fixed declared order, each stage independently toggled by
//! `Config.processors`, applied strictly after the style compiler and
//! before caching:
//!
//! 1. `tailwindcss` — utility-class generation (host-provided module)
//! 2. `preset-env`  — modern-CSS lowering to broadly supported syntax
//! 3. `autoprefixer` — vendor prefixes for legacy browser targets
//! 4. `minify`
//!
//! A stage failure is non-fatal: it is logged and reported out-of-band, and
//! the pipeline continues with the output as it stood before that stage.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::compiler::CompileContext;
use crate::compiler::loader::ModuleLoader;
use crate::config::Config;
use crate::error::EngineError;
use crate::language::{Language, LanguageRegistry};
use std::sync::Arc;

/// Browser version encoding used by lightningcss (`major << 16 | minor << 8`).
const fn browser(major: u32, minor: u32) -> Option<u32> {
    Some(major << 16 | minor << 8)
}

/// Legacy targets for vendor prefixing.
fn prefix_targets() -> Targets {
    Targets {
        browsers: Some(Browsers {
            chrome: browser(30, 0),
            firefox: browser(20, 0),
            safari: browser(7, 0),
            ios_saf: browser(7, 0),
            ie: browser(10, 0),
            ..Browsers::default()
        }),
        ..Targets::default()
    }
}

/// Broadly supported targets for modern-CSS lowering (nesting, color
/// functions, media-query ranges).
fn lowering_targets() -> Targets {
    Targets {
        browsers: Some(Browsers {
            chrome: browser(80, 0),
            firefox: browser(72, 0),
            safari: browser(13, 0),
            edge: browser(80, 0),
            ..Browsers::default()
        }),
        ..Targets::default()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run all enabled processors over compiled style output.
///
/// Returns the processed output plus the (non-fatal) failures encountered,
/// for out-of-band delivery to tool panes.
pub async fn run_style_pipeline(
    compiled: String,
    config: &Config,
    loader: &ModuleLoader,
    registry: &LanguageRegistry,
) -> (String, Vec<EngineError>) {
    let mut out = compiled;
    let mut failures = Vec::new();

    let mut apply = |name: &'static str, result: Result<String, EngineError>, out: &mut String| {
        match result {
            Ok(next) => *out = next,
            Err(err) => {
                crate::log!("processor"; "`{name}` failed, passing output through: {err}");
                failures.push(err);
            }
        }
    };

    if config.processors.tailwindcss {
        let result = module_processor("tailwindcss", &out, config, loader, registry).await;
        apply("tailwindcss", result, &mut out);
    }
    if config.processors.preset_env {
        apply("preset-env", preset_env(&out), &mut out);
    }
    if config.processors.autoprefixer {
        apply("autoprefixer", autoprefix(&out), &mut out);
    }
    if config.processors.minify {
        apply("minify", minify(&out), &mut out);
    }

    (out, failures)
}

// ============================================================================
// Built-in Stages
// ============================================================================

/// Add vendor prefixes for legacy browsers.
fn autoprefix(source: &str) -> Result<String, EngineError> {
    transform("autoprefixer", source, prefix_targets(), false)
}

/// Lower modern CSS syntax to broadly supported equivalents.
fn preset_env(source: &str) -> Result<String, EngineError> {
    transform("preset-env", source, lowering_targets(), false)
}

/// Minify, preserving whatever prefixes earlier stages added.
fn minify(source: &str) -> Result<String, EngineError> {
    transform("minify", source, Targets::default(), true)
}

fn transform(
    name: &'static str,
    source: &str,
    targets: Targets,
    minify: bool,
) -> Result<String, EngineError> {
    let fail = |reason: String| EngineError::Processor { name, reason };

    let mut sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| fail(e.to_string()))?;
    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;
    let result = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;
    Ok(result.code)
}

// ============================================================================
// Module-Loaded Stages
// ============================================================================

/// Run a processor that resolves through the module loader (utility-class
/// generators are shipped as modules, like compilers).
async fn module_processor(
    name: &'static str,
    source: &str,
    config: &Config,
    loader: &ModuleLoader,
    registry: &LanguageRegistry,
) -> Result<String, EngineError> {
    let language = Language::from(name);
    let Some(compiler) = registry.compiler(&language) else {
        return Err(EngineError::Processor {
            name,
            reason: "no compiler contract registered".into(),
        });
    };
    let process = loader.load(&language, compiler).await?;
    let ctx = CompileContext::new(Arc::new(config.clone()), language);
    process(source.to_string(), ctx).await
}

// ============================================================================
// Tests
// ============================================================================
