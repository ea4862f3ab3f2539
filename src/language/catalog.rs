//! Default language catalog.
//!
//! Catalog order is presentation order in language menus. Compiler module
//! URLs are resolved relative to the host's module base; built-in compilers
//! (markdown, canonical passthroughs) carry no URL.

use rustc_hash::FxHashMap;

use super::spec::{EditorId, LanguageSpec};
use crate::compiler::{Compiler, Contribution, ScriptType};
use crate::language::Language;

/// Default specs, in menu order.
pub(super) fn specs() -> Vec<LanguageSpec> {
    vec![
        // -- markup --------------------------------------------------------
        LanguageSpec::new("html", "HTML", EditorId::Markup).extensions(&["htm", "xhtml"]),
        LanguageSpec::new("markdown", "MD", EditorId::Markup)
            .long_title("Markdown")
            .extensions(&["md", "mdown", "mkdn"])
            .parser("markdown"),
        LanguageSpec::new("mdx", "MDX", EditorId::Markup)
            .long_title("MDX (Markdown for JSX)")
            .parser("markdown"),
        LanguageSpec::new("pug", "Pug", EditorId::Markup)
            .extensions(&["jade"])
            .parser("pug"),
        LanguageSpec::new("asciidoc", "ADoc", EditorId::Markup)
            .long_title("AsciiDoc")
            .extensions(&["adoc", "asc"]),
        LanguageSpec::new("handlebars", "HBS", EditorId::Markup)
            .long_title("Handlebars")
            .extensions(&["hbs"])
            .editor_language("html"),
        LanguageSpec::new("ejs", "EJS", EditorId::Markup).editor_language("html"),
        LanguageSpec::new("liquid", "Liquid", EditorId::Markup)
            .extensions(&["liquidjs"])
            .editor_language("html"),
        LanguageSpec::new("nunjucks", "NJK", EditorId::Markup)
            .long_title("Nunjucks")
            .extensions(&["njk"])
            .editor_language("html"),
        // -- style ---------------------------------------------------------
        LanguageSpec::new("css", "CSS", EditorId::Style).parser("css"),
        LanguageSpec::new("scss", "SCSS", EditorId::Style).parser("scss"),
        LanguageSpec::new("sass", "Sass", EditorId::Style).editor_language("scss"),
        LanguageSpec::new("less", "Less", EditorId::Style).parser("less"),
        LanguageSpec::new("stylus", "Stylus", EditorId::Style).extensions(&["styl"]),
        // -- script --------------------------------------------------------
        LanguageSpec::new("javascript", "JS", EditorId::Script)
            .long_title("JavaScript")
            .extensions(&["js", "mjs"])
            .parser("babel"),
        LanguageSpec::new("typescript", "TS", EditorId::Script)
            .long_title("TypeScript")
            .extensions(&["ts"])
            .parser("babel-ts"),
        LanguageSpec::new("jsx", "JSX", EditorId::Script)
            .parser("babel")
            .editor_language("javascript"),
        LanguageSpec::new("tsx", "TSX", EditorId::Script)
            .parser("babel-ts")
            .editor_language("typescript"),
        LanguageSpec::new("coffeescript", "Coffee", EditorId::Script)
            .long_title("CoffeeScript")
            .extensions(&["coffee"]),
        LanguageSpec::new("livescript", "LS", EditorId::Script)
            .long_title("LiveScript")
            .extensions(&["ls"]),
        LanguageSpec::new("json", "JSON", EditorId::Script),
        LanguageSpec::new("vue", "Vue", EditorId::Script)
            .long_title("Vue 3 SFC")
            .extensions(&["vue3"])
            .editor_language("html"),
        LanguageSpec::new("svelte", "Svelte", EditorId::Script).editor_language("html"),
        LanguageSpec::new("python", "Py", EditorId::Script)
            .long_title("Python")
            .extensions(&["py"]),
        LanguageSpec::new("ruby", "Ruby", EditorId::Script).extensions(&["rb"]),
        LanguageSpec::new("php", "PHP", EditorId::Script),
    ]
}

/// Default compiler contracts, keyed by canonical id.
///
/// Languages absent from this table (html, css) are served raw.
pub(super) fn compilers() -> FxHashMap<Language, Compiler> {
    let mut map = FxHashMap::default();
    let mut add = |id: &str, compiler: Compiler| {
        map.insert(Language::from(id), compiler);
    };

    // -- markup ------------------------------------------------------------
    add("markdown", Compiler::default());
    add(
        "mdx",
        Compiler {
            compiled_code_language: Some(Language::from("jsx")),
            url: Some("compilers/mdx.js".into()),
            ..Compiler::default()
        },
    );
    add("pug", Compiler::with_url("compilers/pug.js"));
    add("asciidoc", Compiler::with_url("compilers/asciidoctor.js"));
    add(
        "handlebars",
        Compiler {
            url: Some("compilers/handlebars.js".into()),
            scripts: Contribution::urls(&["vendor/handlebars/handlebars.runtime.min.js"]),
            ..Compiler::default()
        },
    );
    add("ejs", Compiler::with_url("compilers/ejs.js"));
    add(
        "liquid",
        Compiler {
            url: Some("compilers/liquid.js".into()),
            script_type: Some(ScriptType::Mime("text/liquid".into())),
            scripts: Contribution::urls(&["vendor/liquidjs/liquid.browser.umd.js"]),
            defer_scripts: true,
            ..Compiler::default()
        },
    );
    add("nunjucks", Compiler::with_url("compilers/nunjucks.js"));

    // -- style -------------------------------------------------------------
    add("scss", Compiler::with_url("compilers/sass.js"));
    // Indented syntax compiles through the same module as SCSS
    add("sass", Compiler::alias_of("scss"));
    add("less", Compiler::with_url("compilers/less.js"));
    add("stylus", Compiler::with_url("compilers/stylus.js"));

    // -- script ------------------------------------------------------------
    add("typescript", Compiler::with_url("compilers/typescript.js"));
    add("jsx", Compiler::with_url("compilers/babel.js"));
    add("tsx", Compiler::alias_of("typescript"));
    add("coffeescript", Compiler::with_url("compilers/coffeescript.js"));
    add("livescript", Compiler::with_url("compilers/livescript.js"));
    add(
        "json",
        Compiler {
            script_type: Some(ScriptType::Mime("application/json".into())),
            ..Compiler::default()
        },
    );
    add(
        "vue",
        Compiler {
            dependencies: vec![Language::from("typescript")],
            url: Some("compilers/vue-sfc.js".into()),
            script_type: Some(ScriptType::Module),
            ..Compiler::default()
        },
    );
    add(
        "svelte",
        Compiler {
            url: Some("compilers/svelte.js".into()),
            script_type: Some(ScriptType::Module),
            ..Compiler::default()
        },
    );
    add(
        "python",
        Compiler {
            url: Some("compilers/python.js".into()),
            script_type: Some(ScriptType::Mime("text/python".into())),
            scripts: Contribution::urls(&["vendor/brython/brython.min.js"]),
            defer_scripts: true,
            inline_script: Some("brython({ debug: 0 });".into()),
            ..Compiler::default()
        },
    );
    add(
        "ruby",
        Compiler {
            url: Some("compilers/ruby.js".into()),
            script_type: Some(ScriptType::Mime("text/ruby".into())),
            scripts: Contribution::urls(&["vendor/opal/opal.min.js"]),
            defer_scripts: true,
            ..Compiler::default()
        },
    );
    add(
        "php",
        Compiler {
            url: Some("compilers/php.js".into()),
            script_type: Some(ScriptType::Mime("text/x-uniter-php".into())),
            scripts: Contribution::urls(&["vendor/uniter/uniter.js"]),
            defer_scripts: true,
            ..Compiler::default()
        },
    );

    // -- style processors (module-loaded, not selectable languages) --------
    add(
        "tailwindcss",
        Compiler::with_url("processors/tailwindcss.js"),
    );

    map
}
