//! Class-hierarchy resolution for Lumen.
//!
//! Given a parsed program (`lumen-hir`), this crate computes for every
//! class-like declaration its supertype, direct interfaces, linearized set of
//! all transitive supertypes, the synthetic chain of intermediate classes
//! introduced by mixin clauses, type-parameter bounds, and — where absent in
//! source — a synthesized default or forwarding constructor. Results are
//! written into the mutable class records of `lumen_types::ClassStore`.
//!
//! Resolution never aborts on user errors: every decision point either
//! succeeds or falls back to a documented placeholder (a malformed-type
//! sentinel, the root class, an erroneous constructor) and keeps going, so a
//! single pass can accumulate many diagnostics.

pub mod diagnostics;
pub mod scopes;
pub mod type_ref;

mod driver;
mod linearize;
mod loader;
mod mixin;
mod registry;
mod resolver;
mod store_build;

pub use driver::{
    resolve, resolve_program, Backend, DefaultBackend, HierarchyError, HierarchyResolution,
    ResolveConfig,
};
pub use registry::{CollectingRegistry, Feature, NullRegistry, Registry};
pub use scopes::{ClassScope, TypeLookup};
