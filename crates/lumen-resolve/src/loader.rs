//! First pass: bind the names a class's clauses mention and break cycles in
//! the supertype-naming graph.
//!
//! Every class is marked load-started before its references are walked;
//! revisiting a load-started class means the extends/with/implements graph is
//! cyclic. The revisited class is reported, cut at the root, and flagged, so
//! the resolver afterwards runs on a graph where recursion terminates.

use lumen_core::ClassId;
use lumen_types::{InterfaceType, Phase, Span};

use crate::diagnostics::cyclic_class_hierarchy_diagnostic;
use crate::driver::ResolveContext;
use crate::scopes::{ClassScope, TypeLookup};

pub(crate) fn ensure_supertypes_loaded(cx: &mut ResolveContext<'_>, class: ClassId) {
    match cx.store.class(class).load_state {
        Phase::Done => return,
        Phase::Started => {
            break_hierarchy_cycle(cx, class);
            return;
        }
        Phase::Unstarted => {}
    }
    cx.store.class_mut(class).load_state = Phase::Started;

    if let Some((library, index)) = cx.store.class(class).origin {
        let program = cx.program;
        let decl = program.class_decl(library, index);
        let clauses = decl
            .extends
            .iter()
            .chain(decl.mixins.iter())
            .chain(decl.implements.iter());
        for node in clauses {
            let target = {
                let scope = ClassScope::new(cx.store, library, Some(class));
                match scope.resolve_ref(node) {
                    TypeLookup::Class(target) => Some(target),
                    // Unresolved names and type variables are diagnosed by the
                    // resolver; the loader only needs bound identities.
                    _ => None,
                }
            };
            if let Some(target) = target {
                ensure_supertypes_loaded(cx, target);
            }
        }
    }

    cx.store.class_mut(class).load_state = Phase::Done;
}

fn break_hierarchy_cycle(cx: &mut ResolveContext<'_>, class: ClassId) {
    if cx.store.class(class).has_incomplete_hierarchy {
        // Already cut; further paths into the same cycle stay silent.
        return;
    }

    let (range, name) = match cx.store.class(class).origin {
        Some((library, index)) => {
            let decl = cx.program.class_decl(library, index);
            (decl.name_range, decl.name.clone())
        }
        None => (Span::new(0, 0), cx.store.class(class).name.clone()),
    };
    tracing::trace!(class = %name, "supertype cycle detected");
    cx.diagnostics
        .push(cyclic_class_hierarchy_diagnostic(range, &name));

    let object = cx.store.core().object;
    let this_type = cx.store.this_type(class);
    let def = cx.store.class_mut(class);
    def.has_incomplete_hierarchy = true;
    if class != object && def.supertype.is_none() {
        def.supertype = Some(InterfaceType::new(object, Vec::new()));
    }
    if def.all_supertypes.is_none() {
        def.all_supertypes = Some(vec![this_type, InterfaceType::new(object, Vec::new())]);
    }
}
