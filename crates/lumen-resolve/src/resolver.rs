//! The per-class resolution pipeline: type-parameter bounds, supertype and
//! interface clauses, constructor synthesis, linearization.

use lumen_core::{ClassId, LibraryId, Name};
use lumen_hir::{ClassDecl, TypeRef};
use lumen_types::{
    ClassStore, ConstructorDef, ConstructorOrigin, InterfaceType, Phase, Span, Type,
};

use crate::diagnostics::{
    cannot_extend_diagnostic, cannot_extend_enum_diagnostic, cannot_extend_malformed_diagnostic,
    cannot_find_unnamed_constructor_diagnostic, cannot_implement_diagnostic,
    cannot_implement_enum_diagnostic, cannot_implement_malformed_diagnostic,
    cannot_mixin_diagnostic, cannot_mixin_enum_diagnostic, cannot_mixin_malformed_diagnostic,
    class_name_expected_diagnostic, duplicate_extends_implements_diagnostic,
    duplicate_implements_diagnostic, duplicate_type_variable_name_diagnostic,
    empty_enum_declaration_diagnostic, no_matching_constructor_for_implicit_diagnostic,
    super_call_to_factory_diagnostic,
};
use crate::driver::{constructor_accessible, DeferredCheck, ResolveContext};
use crate::registry::Feature;
use crate::scopes::ClassScope;
use crate::{linearize, mixin, type_ref};

/// Resolve `class` unless resolution already started or finished. Re-entrant
/// visits (possible only inside hierarchies the loader cut) return
/// immediately.
pub(crate) fn ensure_resolved(cx: &mut ResolveContext<'_>, class: ClassId) {
    if cx.store.class(class).resolution_state != Phase::Unstarted {
        return;
    }
    cx.store.class_mut(class).resolution_state = Phase::Started;
    tracing::trace!(class = %cx.store.class(class).name, "resolving");
    resolve_class(cx, class);
    cx.store.class_mut(class).resolution_state = Phase::Done;
}

fn resolve_class(cx: &mut ResolveContext<'_>, class: ClassId) {
    let Some((library, index)) = cx.store.class(class).origin else {
        // Synthetic mixin applications are fully resolved when they are
        // created and never reach this path.
        debug_assert!(false, "synthetic class in the resolver pipeline");
        return;
    };
    let program = cx.program;
    let decl = program.class_decl(library, index);

    resolve_type_parameters(cx, class, decl);

    if cx.store.class(class).is_enum() {
        resolve_enum(cx, class, decl);
        return;
    }

    // The loader installs the supertype itself when it has to cut a cycle; a
    // plain extends clause is then not revisited. A mixin clause is still
    // expanded so its own chain is checked, but the loader's root wins.
    if decl.mixins.is_empty() {
        if cx.store.class(class).supertype.is_none() {
            resolve_plain_supertype(cx, class, decl);
        }
    } else {
        mixin::apply_mixin_clause(cx, class, decl);
    }

    resolve_interfaces(cx, class, decl);

    if cx.store.class(class).constructors.is_empty() {
        synthesize_default_constructor(cx, class, decl.name_range);
    }

    propagate_incomplete_hierarchy(cx, class);

    if cx.store.class(class).all_supertypes.is_none() {
        let all = linearize::linearize(cx.store, class);
        cx.store.class_mut(class).set_all_supertypes(all);
    }
}

fn resolve_type_parameters(cx: &mut ResolveContext<'_>, class: ClassId, decl: &ClassDecl) {
    for (index, param) in decl.type_params.iter().enumerate() {
        // The first declaration of a name wins; every later one is reported.
        if decl.type_params[..index]
            .iter()
            .any(|earlier| earlier.name == param.name)
        {
            cx.diagnostics.push(duplicate_type_variable_name_diagnostic(
                param.name_range,
                &param.name,
            ));
        }
    }

    let library = cx.store.class(class).library;
    for (index, param) in decl.type_params.iter().enumerate() {
        let Some(bound_node) = &param.bound else {
            // Absent bounds keep the top type installed at store build.
            continue;
        };
        let bound = {
            let scope = ClassScope::new(cx.store, library, Some(class));
            type_ref::resolve_type_annotation(cx.store, &scope, bound_node, cx.diagnostics)
        };
        if matches!(bound, Type::TypeVariable(_)) {
            cx.deferred.push(DeferredCheck::TypeVariableBoundCycle {
                class,
                index: index as u32,
            });
        }
        cx.store.class_mut(class).type_params[index].bound = bound;
    }
}

fn resolve_enum(cx: &mut ResolveContext<'_>, class: ClassId, decl: &ClassDecl) {
    let object = cx.store.core().object;
    ensure_resolved(cx, object);

    if class != object && cx.store.class(class).supertype.is_none() {
        cx.store
            .class_mut(class)
            .set_supertype(InterfaceType::new(object, Vec::new()));
    }

    if !decl.has_enum_constants() {
        cx.diagnostics
            .push(empty_enum_declaration_diagnostic(decl.name_range, &decl.name));
    }

    // Value members are materialized by the enum-expansion collaborator; the
    // hierarchy side only needs a constructor and the linearization.
    if cx.store.class(class).constructors.is_empty() {
        synthesize_default_constructor(cx, class, decl.name_range);
    }
    if cx.store.class(class).all_supertypes.is_none() {
        let all = linearize::linearize(cx.store, class);
        cx.store.class_mut(class).set_all_supertypes(all);
    }
}

fn resolve_plain_supertype(cx: &mut ResolveContext<'_>, class: ClassId, decl: &ClassDecl) {
    if let Some(node) = &decl.extends {
        let supertype = match resolve_and_validate(cx, class, node, UseSite::Extends) {
            Some(ty) => ty,
            None => {
                let object = cx.store.core().object;
                ensure_resolved(cx, object);
                cx.store.object_type()
            }
        };
        cx.store.class_mut(class).set_supertype(supertype);
    } else {
        let default = cx.backend.default_superclass(cx.store, class);
        if default != class {
            ensure_resolved(cx, default);
            let supertype = raw_instantiation(cx.store, default);
            cx.store.class_mut(class).set_supertype(supertype);
        }
    }
}

fn resolve_interfaces(cx: &mut ResolveContext<'_>, class: ClassId, decl: &ClassDecl) {
    for node in &decl.implements {
        let Some(ty) = resolve_and_validate(cx, class, node, UseSite::Implements) else {
            continue;
        };

        let def = cx.store.class(class);
        if def
            .supertype
            .as_ref()
            .is_some_and(|supertype| supertype.class == ty.class)
        {
            cx.diagnostics.push(duplicate_extends_implements_diagnostic(
                node.range, &node.name,
            ));
        }
        if def.interfaces.iter().any(|prior| prior.class == ty.class) {
            cx.diagnostics
                .push(duplicate_implements_diagnostic(node.range, &node.name));
        } else {
            cx.store.class_mut(class).interfaces.push(ty);
        }
    }
}

/// Which clause a nominal reference came from; selects the diagnostic family
/// and the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UseSite {
    Extends,
    Implements,
    Mixin,
}

/// Resolve a clause reference and check it is usable as a supertype,
/// interface, or mixin. `None` means a diagnostic was issued and the caller
/// applies its documented fallback.
pub(crate) fn resolve_and_validate(
    cx: &mut ResolveContext<'_>,
    class: ClassId,
    node: &TypeRef,
    site: UseSite,
) -> Option<InterfaceType> {
    let library = cx.store.class(class).library;
    let ty = {
        let scope = ClassScope::new(cx.store, library, Some(class));
        type_ref::resolve_type_annotation(cx.store, &scope, node, cx.diagnostics)
    };

    match ty {
        Type::Malformed(_) => {
            cx.diagnostics.push(match site {
                UseSite::Extends => cannot_extend_malformed_diagnostic(node.range, &node.name),
                UseSite::Implements => {
                    cannot_implement_malformed_diagnostic(node.range, &node.name)
                }
                UseSite::Mixin => cannot_mixin_malformed_diagnostic(node.range, &node.name),
            });
            None
        }
        Type::Dynamic => {
            // `dynamic` is on the deny list; in exempt libraries it degrades
            // to the plain not-a-class error.
            if deny_list_exempt(cx, library) {
                report_not_a_class(cx, node, site);
            } else {
                report_denied(cx, node, site);
            }
            None
        }
        Type::TypeVariable(_) => {
            report_not_a_class(cx, node, site);
            None
        }
        Type::Interface(ty) => {
            if cx.store.class(ty.class).is_enum() {
                cx.diagnostics.push(match site {
                    UseSite::Extends => cannot_extend_enum_diagnostic(node.range, &node.name),
                    UseSite::Implements => {
                        cannot_implement_enum_diagnostic(node.range, &node.name)
                    }
                    UseSite::Mixin => cannot_mixin_enum_diagnostic(node.range, &node.name),
                });
                return None;
            }
            if cx.store.core().is_denied(ty.class) && !deny_list_exempt(cx, library) {
                report_denied(cx, node, site);
                return None;
            }
            ensure_resolved(cx, ty.class);
            Some(ty)
        }
    }
}

fn report_not_a_class(cx: &mut ResolveContext<'_>, node: &TypeRef, site: UseSite) {
    cx.diagnostics.push(match site {
        UseSite::Extends | UseSite::Implements => class_name_expected_diagnostic(node.range),
        UseSite::Mixin => cannot_mixin_diagnostic(node.range, &node.name),
    });
}

fn report_denied(cx: &mut ResolveContext<'_>, node: &TypeRef, site: UseSite) {
    cx.diagnostics.push(match site {
        UseSite::Extends => cannot_extend_diagnostic(node.range, &node.name),
        UseSite::Implements => cannot_implement_diagnostic(node.range, &node.name),
        UseSite::Mixin => cannot_mixin_diagnostic(node.range, &node.name),
    });
}

fn deny_list_exempt(cx: &ResolveContext<'_>, library: LibraryId) -> bool {
    let lib = cx.store.library(library);
    lib.is_core() || cx.backend.is_target_specific_library(lib)
}

/// Install the implicit constructor of a class that declares none: a default
/// forwarding to the superclass's unnamed constructor, or an erroneous
/// placeholder when no usable target exists.
fn synthesize_default_constructor(cx: &mut ResolveContext<'_>, class: ClassId, range: Span) {
    let Some(super_class) = cx.store.class(class).supertype.as_ref().map(|s| s.class) else {
        // The root forwards to nothing.
        cx.store
            .class_mut(class)
            .constructors
            .push(default_constructor(false, None));
        return;
    };
    ensure_resolved(cx, super_class);

    let class_library = cx.store.class(class).library;
    let verdict = {
        let super_def = cx.store.class(super_class);
        if super_def.resolution_state != Phase::Done {
            // The superclass is mid-resolution, which only happens inside a
            // hierarchy the loader already diagnosed. Stay quiet.
            Ok(false)
        } else {
            match super_def.unnamed_constructor() {
                None => Err(cannot_find_unnamed_constructor_diagnostic(
                    range,
                    &super_def.name,
                )),
                Some(ctor)
                    if !constructor_accessible(&ctor.name, super_def.library, class_library) =>
                {
                    Err(cannot_find_unnamed_constructor_diagnostic(
                        range,
                        &super_def.name,
                    ))
                }
                Some(ctor) if ctor.is_factory => {
                    Err(super_call_to_factory_diagnostic(range, &super_def.name))
                }
                Some(ctor) if ctor.requires_arguments() => Err(
                    no_matching_constructor_for_implicit_diagnostic(range, &super_def.name),
                ),
                Some(ctor) => Ok(ctor.is_const),
            }
        }
    };

    match verdict {
        Ok(is_const) => {
            cx.store
                .class_mut(class)
                .constructors
                .push(default_constructor(is_const, Some(super_class)));
        }
        Err(diagnostic) => {
            cx.diagnostics.push(diagnostic.clone());
            cx.registry.register_constructor_error(class, diagnostic);
            cx.registry.register_feature(Feature::ThrowNoSuchMethod);
            cx.store.class_mut(class).constructors.push(ConstructorDef {
                name: Name::empty(),
                is_factory: false,
                is_const: false,
                origin: ConstructorOrigin::Erroneous,
                params: Vec::new(),
                super_target: Some(super_class),
            });
        }
    }
}

fn default_constructor(is_const: bool, super_target: Option<ClassId>) -> ConstructorDef {
    ConstructorDef {
        name: Name::empty(),
        is_factory: false,
        is_const,
        origin: ConstructorOrigin::Default,
        params: Vec::new(),
        super_target,
    }
}

/// A hierarchy cut anywhere below a class leaves the class itself truncated.
pub(crate) fn propagate_incomplete_hierarchy(cx: &mut ResolveContext<'_>, class: ClassId) {
    let def = cx.store.class(class);
    if def.has_incomplete_hierarchy {
        return;
    }
    let from_super = def
        .supertype
        .as_ref()
        .is_some_and(|s| cx.store.class(s.class).has_incomplete_hierarchy);
    let from_mixin = def
        .mixin
        .as_ref()
        .is_some_and(|m| cx.store.class(m.class).has_incomplete_hierarchy);
    if from_super || from_mixin {
        cx.store.class_mut(class).has_incomplete_hierarchy = true;
    }
}

/// Instantiate a class with every argument `dynamic`.
pub(crate) fn raw_instantiation(store: &ClassStore, class: ClassId) -> InterfaceType {
    InterfaceType::new(
        class,
        vec![Type::Dynamic; store.class(class).type_params.len()],
    )
}
