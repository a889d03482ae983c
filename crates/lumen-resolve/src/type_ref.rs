//! Resolution of syntactic nominal type annotations.
//!
//! Turns a `lumen_hir::TypeRef` into a `lumen_types::Type` against an
//! enclosing [`ClassScope`]. Diagnostics are best-effort and never stop
//! resolution: every failure yields a malformed-type sentinel carrying the
//! diagnostic that produced it.

use lumen_core::ClassId;
use lumen_hir::TypeRef;
use lumen_types::{ClassStore, Diagnostic, Type};

use crate::diagnostics::{
    cannot_resolve_type_diagnostic, not_a_prefix_diagnostic,
    type_argument_count_mismatch_diagnostic,
};
use crate::scopes::{ClassScope, TypeLookup};

/// Resolve one type annotation.
///
/// Contract:
/// - `dynamic` resolves to the top type.
/// - A raw (argument-free) reference to a generic class yields an
///   instantiation whose arguments are each `dynamic`.
/// - An argument-count mismatch yields a malformed sentinel.
/// - An out-of-scope name yields a malformed sentinel.
pub fn resolve_type_annotation(
    store: &ClassStore,
    scope: &ClassScope<'_>,
    node: &TypeRef,
    diagnostics: &mut Vec<Diagnostic>,
) -> Type {
    if node.prefix.is_none() && node.name.as_str() == "dynamic" {
        if !node.args.is_empty() {
            diagnostics.push(type_argument_count_mismatch_diagnostic(
                node.range,
                &node.name,
                0,
                node.args.len(),
            ));
        }
        return Type::Dynamic;
    }

    match scope.resolve_ref(node) {
        TypeLookup::TypeParameter(tv) => {
            if !node.args.is_empty() {
                // Reported, then discarded: the variable reference itself is
                // still usable.
                diagnostics.push(type_argument_count_mismatch_diagnostic(
                    node.range,
                    &node.name,
                    0,
                    node.args.len(),
                ));
            }
            Type::TypeVariable(tv)
        }
        TypeLookup::Class(class) => instantiate(store, scope, class, node, diagnostics),
        TypeLookup::NotFound => {
            let diagnostic = cannot_resolve_type_diagnostic(node.range, &display_name(node));
            diagnostics.push(diagnostic.clone());
            Type::malformed(diagnostic)
        }
        TypeLookup::NotAPrefix => {
            let prefix = node.prefix.as_ref().expect("dotted reference has a prefix");
            let diagnostic = not_a_prefix_diagnostic(node.range, prefix);
            diagnostics.push(diagnostic.clone());
            Type::malformed(diagnostic)
        }
    }
}

fn instantiate(
    store: &ClassStore,
    scope: &ClassScope<'_>,
    class: ClassId,
    node: &TypeRef,
    diagnostics: &mut Vec<Diagnostic>,
) -> Type {
    let param_count = store.class(class).type_params.len();

    if node.args.is_empty() {
        // Raw instantiation: every argument defaults to dynamic.
        return Type::interface(class, vec![Type::Dynamic; param_count]);
    }

    if node.args.len() != param_count {
        let diagnostic = type_argument_count_mismatch_diagnostic(
            node.range,
            &node.name,
            param_count,
            node.args.len(),
        );
        diagnostics.push(diagnostic.clone());
        return Type::malformed(diagnostic);
    }

    let args = node
        .args
        .iter()
        .map(|arg| resolve_type_annotation(store, scope, arg, diagnostics))
        .collect();
    Type::interface(class, args)
}

fn display_name(node: &TypeRef) -> String {
    match &node.prefix {
        Some(prefix) => format!("{prefix}.{}", node.name),
        None => node.name.to_string(),
    }
}
