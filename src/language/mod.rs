//! Language identifiers, specs, and the authoritative registry.
//!
//! The closed set of playground languages is modeled as one catalog keyed by
//! canonical id; alias/extension ids resolve through explicit lookup, never
//! ad hoc string branching.

mod catalog;
mod registry;
mod spec;

pub use registry::{LanguageRegistry, registry};
pub use spec::{EditorId, Language, LanguageSpec};
