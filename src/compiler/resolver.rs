//! Compile chain resolution: aliases, dependencies, and output chaining.
//!
//! Resolution is a pure function over a registry; it never touches caches
//! or loads modules. Cyclic configurations are rejected up front so the
//! pipeline can degrade to raw-content passthrough instead of looping.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::EngineError;
use crate::language::{Language, LanguageRegistry};

/// Hop bound for `compiled_code_language` chains. Real chains are 1-2 hops
/// (e.g. mdx → jsx); anything deeper is a configuration defect.
const MAX_CHAIN_HOPS: usize = 8;

// ============================================================================
// Chain Types
// ============================================================================

/// One executable step of a resolved chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStep {
    /// Canonical id of the language whose compiler runs (aliases already
    /// substituted).
    pub language: Language,
    /// Dependency languages compiled first; their outputs become auxiliary
    /// input to this step.
    pub dependencies: Vec<Language>,
}

/// Ordered chain of compile steps for a slot's language.
///
/// An empty chain means the language is served raw (html, css).
#[derive(Debug, Clone)]
pub struct CompileChain {
    /// Canonical id the resolution started from.
    pub source: Language,
    pub steps: SmallVec<[CompileStep; 2]>,
}

impl CompileChain {
    /// The language whose compiler contract supplies assembly directives
    /// (script type, defer, contributions) for this chain.
    pub fn primary(&self) -> Option<&Language> {
        self.steps.first().map(|step| &step.language)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the ordered compile chain for `language`.
///
/// 1. `alias_to` substitutes recursively, guarded by a visited set
///    (`CircularAlias`).
/// 2. Declared dependencies are recorded per step and validated for cycles
///    (`CircularDependency`).
/// 3. `compiled_code_language` continues the chain until a canonical target
///    or a compiler-less language is reached, bounded by [`MAX_CHAIN_HOPS`].
pub fn resolve(
    registry: &LanguageRegistry,
    language: &Language,
) -> Result<CompileChain, EngineError> {
    let source = registry.canonical(language)?;
    let mut steps = SmallVec::new();
    let mut current = source.clone();

    for _hop in 0..=MAX_CHAIN_HOPS {
        let resolved = resolve_alias(registry, &current)?;
        let Some(compiler) = registry.compiler(&resolved) else {
            // No compiler: content passes through as-is
            return Ok(CompileChain { source, steps });
        };

        validate_dependencies(registry, &resolved)?;
        steps.push(CompileStep {
            language: resolved.clone(),
            dependencies: compiler.dependencies.clone(),
        });

        match &compiler.compiled_code_language {
            // Output is the slot's canonical target
            None => return Ok(CompileChain { source, steps }),
            Some(next) => {
                let next = registry.canonical(next)?;
                if registry.is_canonical_target(&next) {
                    return Ok(CompileChain { source, steps });
                }
                if steps.iter().any(|step| step.language == next) {
                    return Err(EngineError::CircularDependency(next));
                }
                current = next;
            }
        }
    }

    Err(EngineError::CircularDependency(source))
}

/// Follow `alias_to` links to the compiler that actually runs.
pub(crate) fn resolve_alias(
    registry: &LanguageRegistry,
    language: &Language,
) -> Result<Language, EngineError> {
    let mut visited = FxHashSet::default();
    let mut current = language.clone();

    while let Some(compiler) = registry.compiler(&current) {
        let Some(alias) = &compiler.alias_to else {
            break;
        };
        if !visited.insert(current.clone()) {
            return Err(EngineError::CircularAlias(current));
        }
        current = registry.canonical(alias)?;
    }

    Ok(current)
}

/// Depth-first cycle check over the dependency graph rooted at `language`.
fn validate_dependencies(
    registry: &LanguageRegistry,
    language: &Language,
) -> Result<(), EngineError> {
    fn visit(
        registry: &LanguageRegistry,
        language: &Language,
        path: &mut FxHashSet<Language>,
    ) -> Result<(), EngineError> {
        if !path.insert(language.clone()) {
            return Err(EngineError::CircularDependency(language.clone()));
        }
        if let Some(compiler) = registry.compiler(language) {
            for dep in &compiler.dependencies {
                let dep = registry.canonical(dep)?;
                visit(registry, &dep, path)?;
            }
        }
        path.remove(language);
        Ok(())
    }

    let mut path = FxHashSet::default();
    visit(registry, language, &mut path)
}

// ============================================================================
// Tests
// ============================================================================
