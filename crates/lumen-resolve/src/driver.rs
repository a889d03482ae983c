//! The resolution driver: orchestrates supertype loading, per-class
//! resolution, and the deferred-check queue.

use std::collections::HashSet;

use lumen_core::{ClassId, LibraryId, Name};
use lumen_hir::Program;
use lumen_types::{ClassStore, Diagnostic, LibraryDef, Phase, Type, TypeParameterId};
use thiserror::Error;

use crate::diagnostics::cyclic_type_variable_diagnostic;
use crate::registry::{NullRegistry, Registry};
use crate::{loader, resolver, store_build};

/// Host hooks a compilation target can override.
pub trait Backend {
    /// The superclass used when a class names none. A backend may substitute
    /// a different root for special classes; the default superclass itself
    /// gets no supertype.
    fn default_superclass(&self, store: &ClassStore, class: ClassId) -> ClassId {
        let _ = class;
        store.core().object
    }

    /// Target-internal libraries are exempt from the platform deny list, like
    /// the core library itself.
    fn is_target_specific_library(&self, library: &LibraryDef) -> bool {
        let _ = library;
        false
    }
}

/// The hook defaults: root superclass everywhere, no exempt libraries.
#[derive(Debug, Default)]
pub struct DefaultBackend;

impl Backend for DefaultBackend {}

/// Per-compilation resolver configuration, passed explicitly.
#[derive(Debug, Clone, Default)]
pub struct ResolveConfig {
    /// Intern structurally equal synthetic mixin applications per library.
    /// An optimization only: both settings produce observably identical
    /// hierarchies.
    pub share_mixin_applications: bool,
}

/// Misuse of the driver API. User-code problems are never errors here; they
/// surface as [`Diagnostic`]s.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("program declares no core library")]
    MissingCoreLibrary,
    #[error("core library declares no `{0}` class")]
    MissingCoreType(&'static str),
}

/// The populated class records plus everything reported while filling them.
#[derive(Debug)]
pub struct HierarchyResolution {
    pub store: ClassStore,
    pub diagnostics: Vec<Diagnostic>,
}

/// A check whose inputs may not be resolved at the point it is discovered.
/// Queued against the subject class and flushed by the driver after that
/// class transitions to done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeferredCheck {
    TypeVariableBoundCycle { class: ClassId, index: u32 },
}

/// Everything one resolution pass threads through its components. The store
/// has a single writer: this context.
pub(crate) struct ResolveContext<'a> {
    pub store: &'a mut ClassStore,
    pub program: &'a Program,
    pub backend: &'a dyn Backend,
    pub config: &'a ResolveConfig,
    pub registry: &'a mut dyn Registry,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    pub deferred: &'a mut Vec<DeferredCheck>,
}

/// Resolve every class of `program` with default hooks and configuration.
pub fn resolve(program: &Program) -> Result<HierarchyResolution, HierarchyError> {
    resolve_program(
        program,
        &DefaultBackend,
        &ResolveConfig::default(),
        &mut NullRegistry,
    )
}

/// Resolve every class of `program`.
///
/// Classes are loaded first (binding the names of direct supertypes, mixins,
/// and interfaces, and breaking supertype-graph cycles), then resolved; a
/// class's direct dependencies are always resolved before the class itself
/// except on cycles, which the loader has already cut at the root.
pub fn resolve_program(
    program: &Program,
    backend: &dyn Backend,
    config: &ResolveConfig,
    registry: &mut dyn Registry,
) -> Result<HierarchyResolution, HierarchyError> {
    let mut store = store_build::build_store(program)?;
    let mut diagnostics = Vec::new();
    let mut deferred = Vec::new();

    {
        let mut cx = ResolveContext {
            store: &mut store,
            program,
            backend,
            config,
            registry,
            diagnostics: &mut diagnostics,
            deferred: &mut deferred,
        };

        let declared: Vec<ClassId> = cx.store.class_ids().collect();
        tracing::debug!(classes = declared.len(), "loading supertypes");
        for &class in &declared {
            loader::ensure_supertypes_loaded(&mut cx, class);
        }

        tracing::debug!("resolving classes");
        for &class in &declared {
            resolver::ensure_resolved(&mut cx, class);
            flush_deferred(&mut cx);
        }
    }

    Ok(HierarchyResolution { store, diagnostics })
}

fn flush_deferred(cx: &mut ResolveContext<'_>) {
    let checks: Vec<DeferredCheck> = cx.deferred.drain(..).collect();
    for check in checks {
        match check {
            DeferredCheck::TypeVariableBoundCycle { class, index } => {
                debug_assert_eq!(
                    cx.store.class(class).resolution_state,
                    Phase::Done,
                    "deferred checks run after their class is done",
                );
                check_type_variable_bound_cycle(cx.store, cx.diagnostics, class, index);
            }
        }
    }
}

/// Walk `tv -> bound-if-type-variable -> ...` from the given variable. A
/// revisit of the starting variable is a cycle, reported on that variable; a
/// revisit of any other variable terminates silently so each cycle is
/// reported exactly once per member it starts from.
fn check_type_variable_bound_cycle(
    store: &mut ClassStore,
    diagnostics: &mut Vec<Diagnostic>,
    class: ClassId,
    index: u32,
) {
    let start = TypeParameterId::new(class, index);
    let mut seen: HashSet<TypeParameterId> = HashSet::new();
    let mut current = start;
    loop {
        let def = store.class(current.class);
        let Some(param) = def.type_params.get(current.index as usize) else {
            break;
        };
        let Type::TypeVariable(next) = &param.bound else {
            break;
        };
        let next = *next;
        if next == start {
            let (range, name) = {
                let param = &store.class(class).type_params[index as usize];
                (param.name_range, param.name.clone())
            };
            diagnostics.push(cyclic_type_variable_diagnostic(range, &name));
            store.class_mut(class).has_incomplete_hierarchy = true;
            break;
        }
        if !seen.insert(next) {
            break;
        }
        current = next;
    }
}

/// Constructor-name privacy: private constructors are invisible across
/// library boundaries.
pub(crate) fn constructor_accessible(
    ctor_name: &Name,
    owner_library: LibraryId,
    from_library: LibraryId,
) -> bool {
    !(ctor_name.is_private() && owner_library != from_library)
}
