//! Result assembly: three compiled slots + config → one executable document.
//!
//! Pure and deterministic: identical inputs always produce byte-identical
//! output. Section order is fixed:
//!
//! 1. type/import metadata (non-executing)
//! 2. CSS preset, then external stylesheets in declared order
//! 3. compiled style (inline)
//! 4. compiled markup (body)
//! 5. external scripts in declared order
//! 6. compiled script (honoring script type, defer, inline wrapping)
//! 7. styles/scripts the compiler contributes from its own compiled output

use std::fmt::Write;

use crate::cache::EditorCache;
use crate::compiler::{Compiler, ScriptType, resolver};
use crate::config::{Config, css_preset_url};
use crate::language::LanguageRegistry;

/// Assemble the final document.
///
/// Unresolvable script languages degrade to a plain script tag; assembly
/// itself never fails.
pub fn assemble(
    markup: &EditorCache,
    style: &EditorCache,
    script: &EditorCache,
    config: &Config,
    registry: &LanguageRegistry,
) -> String {
    let script_compiler = primary_compiler(registry, script);
    let markup_compiler = primary_compiler(registry, markup);

    let mut doc = String::with_capacity(1024);
    doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    doc.push_str("<meta charset=\"UTF-8\" />\n");
    doc.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n");
    let _ = writeln!(doc, "<title>{}</title>", escape_text(&config.title));

    write_metadata(&mut doc, config);

    if let Some(preset) = config.css_preset.as_deref().and_then(css_preset_url) {
        write_stylesheet_link(&mut doc, preset);
    }
    for url in &config.stylesheets {
        write_stylesheet_link(&mut doc, url);
    }

    if !style.compiled.is_empty() {
        let _ = writeln!(doc, "<style>\n{}\n</style>", style.compiled);
    }

    doc.push_str("</head>\n<body>\n");

    if !markup.compiled.is_empty() {
        doc.push_str(&markup.compiled);
        doc.push('\n');
    }

    for url in &config.scripts {
        write_script_src(&mut doc, url, None, false);
    }

    write_compiled_script(&mut doc, script, script_compiler);

    // Compiler contributions come last: they are a function of the compiled
    // output (e.g. a runtime included only when the output needs it)
    let contributions = [
        (markup_compiler, markup.compiled.as_str()),
        (script_compiler, script.compiled.as_str()),
    ];
    for (compiler, compiled) in contributions {
        let Some(compiler) = compiler else { continue };
        for url in compiler.styles.resolve(compiled, config) {
            write_stylesheet_link(&mut doc, &url);
        }
        for url in compiler.scripts.resolve(compiled, config) {
            write_script_src(&mut doc, &url, None, compiler.defer_scripts);
        }
    }

    doc.push_str("</body>\n</html>\n");
    doc
}

/// The compiler whose assembly directives apply to a slot: the first step of
/// the slot language's resolved chain.
fn primary_compiler<'r>(
    registry: &'r LanguageRegistry,
    cache: &EditorCache,
) -> Option<&'r Compiler> {
    let chain = resolver::resolve(registry, &cache.language).ok()?;
    registry.compiler(chain.primary()?)
}

// ============================================================================
// Sections
// ============================================================================

/// Import map and type declarations: metadata only, never executed.
fn write_metadata(doc: &mut String, config: &Config) {
    if !config.imports.is_empty() {
        // BTreeMap iteration keeps the JSON deterministic
        let map = serde_json::json!({ "imports": config.imports });
        let _ = writeln!(doc, "<script type=\"importmap\">\n{map}\n</script>");
    }
    if !config.types.is_empty() {
        let types = serde_json::json!(config.types);
        let _ = writeln!(
            doc,
            "<script type=\"application/json\" data-meta=\"types\">\n{types}\n</script>"
        );
    }
}

fn write_stylesheet_link(doc: &mut String, url: &str) {
    let _ = writeln!(
        doc,
        "<link rel=\"stylesheet\" href=\"{}\" />",
        escape_attr(url)
    );
}

fn write_script_src(doc: &mut String, url: &str, script_type: Option<&ScriptType>, defer: bool) {
    doc.push_str("<script src=\"");
    doc.push_str(&escape_attr(url));
    doc.push('"');
    if let Some(script_type) = script_type {
        let _ = write!(doc, " type=\"{}\"", script_type.as_attr());
    }
    if defer {
        doc.push_str(" defer");
    }
    doc.push_str("></script>\n");
}

fn write_compiled_script(doc: &mut String, script: &EditorCache, compiler: Option<&Compiler>) {
    if script.compiled.is_empty() {
        return;
    }

    let script_type = compiler.and_then(|c| c.script_type.as_ref());
    let defer = compiler.is_some_and(|c| c.defer_scripts);
    let body = escape_script(&script.compiled);

    doc.push_str("<script");
    if let Some(script_type) = script_type {
        let _ = write!(doc, " type=\"{}\"", script_type.as_attr());
    }
    doc.push_str(">\n");
    // Custom-MIME scripts are inert text for the runtime to pick up; only
    // plain and module scripts need load-deferral wrapping
    let executable = matches!(script_type, None | Some(ScriptType::Module));
    if defer && executable {
        let _ = write!(
            doc,
            "window.addEventListener(\"load\", () => {{\n{body}\n}});"
        );
        doc.push('\n');
    } else {
        doc.push_str(&body);
        doc.push('\n');
    }
    doc.push_str("</script>\n");

    if let Some(inline) = compiler.and_then(|c| c.inline_script.as_deref()) {
        let inline = escape_script(inline);
        if defer {
            // The contributed runtime is emitted later with `defer`;
            // deferred scripts finish before `load`, so the kick-off must
            // wait for it
            let _ = writeln!(
                doc,
                "<script>\nwindow.addEventListener(\"load\", () => {{\n{inline}\n}});\n</script>"
            );
        } else {
            let _ = writeln!(doc, "<script>\n{inline}\n</script>");
        }
    }
}

// ============================================================================
// Escaping
// ============================================================================

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

/// Keep inline code from terminating its own script tag.
fn escape_script(code: &str) -> String {
    code.replace("</script", "<\\/script")
}

// ============================================================================
// Tests
// ============================================================================
