//! Constructors for the closed set of hierarchy-resolution diagnostics.

use lumen_core::Name;
use lumen_types::{Diagnostic, Span};

#[must_use]
pub fn not_a_prefix_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "not-a-prefix",
        format!("`{name}` is not an import prefix"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_resolve_type_diagnostic(range: Span, name: &str) -> Diagnostic {
    Diagnostic::error(
        "cannot-resolve-type",
        format!("cannot resolve type `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn type_argument_count_mismatch_diagnostic(
    range: Span,
    name: &Name,
    expected: usize,
    actual: usize,
) -> Diagnostic {
    Diagnostic::error(
        "type-argument-count-mismatch",
        format!("`{name}` expects {expected} type argument(s), got {actual}"),
        Some(range),
    )
}

#[must_use]
pub fn duplicate_type_variable_name_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "duplicate-type-variable-name",
        format!("duplicate type variable `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cyclic_type_variable_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cyclic-type-variable",
        format!("type variable `{name}` is a bound of itself"),
        Some(range),
    )
}

#[must_use]
pub fn cyclic_class_hierarchy_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cyclic-class-hierarchy",
        format!("`{name}` creates a cycle in the class hierarchy"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_extend_malformed_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-extend-malformed",
        format!("cannot extend malformed type `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_extend_enum_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-extend-enum",
        format!("cannot extend enum `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_extend_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-extend",
        format!("`{name}` cannot be extended"),
        Some(range),
    )
}

#[must_use]
pub fn class_name_expected_diagnostic(range: Span) -> Diagnostic {
    Diagnostic::error("class-name-expected", "class name expected", Some(range))
}

#[must_use]
pub fn cannot_implement_malformed_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-implement-malformed",
        format!("cannot implement malformed type `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_implement_enum_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-implement-enum",
        format!("cannot implement enum `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_implement_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-implement",
        format!("`{name}` cannot be implemented"),
        Some(range),
    )
}

#[must_use]
pub fn duplicate_extends_implements_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "duplicate-extends-implements",
        format!("`{name}` can not be both extended and implemented"),
        Some(range),
    )
}

#[must_use]
pub fn duplicate_implements_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "duplicate-implements",
        format!("`{name}` must not occur more than once in the implements clause"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_mixin_malformed_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-mixin-malformed",
        format!("cannot mix in malformed type `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_mixin_enum_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-mixin-enum",
        format!("cannot mix in enum `{name}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_mixin_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-mixin",
        format!("`{name}` cannot be mixed in"),
        Some(range),
    )
}

#[must_use]
pub fn illegal_mixin_cycle_diagnostic(range: Span, mixin: &Name, application: &Name) -> Diagnostic {
    Diagnostic::error(
        "illegal-mixin-cycle",
        format!("mixin `{mixin}` is a cyclic mixin of `{application}`"),
        Some(range),
    )
}

#[must_use]
pub fn cannot_find_unnamed_constructor_diagnostic(range: Span, super_name: &Name) -> Diagnostic {
    Diagnostic::error(
        "cannot-find-unnamed-constructor",
        format!("superclass `{super_name}` has no accessible unnamed constructor"),
        Some(range),
    )
}

#[must_use]
pub fn super_call_to_factory_diagnostic(range: Span, super_name: &Name) -> Diagnostic {
    Diagnostic::error(
        "super-call-to-factory",
        format!("the unnamed constructor of `{super_name}` is a factory"),
        Some(range),
    )
}

#[must_use]
pub fn no_matching_constructor_for_implicit_diagnostic(
    range: Span,
    super_name: &Name,
) -> Diagnostic {
    Diagnostic::error(
        "no-matching-constructor-for-implicit",
        format!("the unnamed constructor of `{super_name}` requires arguments"),
        Some(range),
    )
}

#[must_use]
pub fn empty_enum_declaration_diagnostic(range: Span, name: &Name) -> Diagnostic {
    Diagnostic::error(
        "empty-enum-declaration",
        format!("enum `{name}` declares no constants"),
        Some(range),
    )
}
