use lumen_core::ClassId;
use lumen_hir::{ClassDecl, ConstructorDecl, LibraryTree, Program, TypeRef};
use lumen_resolve::{
    resolve_program, CollectingRegistry, DefaultBackend, Feature, HierarchyResolution,
    ResolveConfig,
};
use lumen_types::{ConstructorOrigin, ParamKind};
use pretty_assertions::assert_eq;

fn resolve_app(classes: Vec<ClassDecl>) -> (HierarchyResolution, CollectingRegistry) {
    let mut app = LibraryTree::new("app");
    app.classes = classes;
    let mut registry = CollectingRegistry::default();
    let res = resolve_program(
        &Program::with_core(app),
        &DefaultBackend,
        &ResolveConfig::default(),
        &mut registry,
    )
    .expect("program has a core library");
    (res, registry)
}

fn class_id(res: &HierarchyResolution, name: &str) -> ClassId {
    res.store
        .class_ids()
        .find(|&id| res.store.class(id).name.as_str() == name)
        .unwrap_or_else(|| panic!("no class named `{name}`"))
}

fn diagnostic_codes(res: &HierarchyResolution) -> Vec<&str> {
    res.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn declared_constructors_suppress_synthesis() {
    let (res, registry) = resolve_app(vec![
        ClassDecl::new("C").with_constructor(ConstructorDecl::named("create"))
    ]);
    assert_eq!(res.diagnostics, Vec::new());
    assert_eq!(registry.features, Vec::new());

    let c = class_id(&res, "C");
    let constructors = &res.store.class(c).constructors;
    assert_eq!(constructors.len(), 1);
    assert_eq!(constructors[0].origin, ConstructorOrigin::Declared);
    assert_eq!(constructors[0].name.as_str(), "create");
}

#[test]
fn the_default_constructor_forwards_to_a_zero_arg_super() {
    let (res, _) = resolve_app(vec![
        ClassDecl::new("S").with_constructor(ConstructorDecl::unnamed()),
        ClassDecl::new("C").with_extends(TypeRef::named("S")),
    ]);
    assert_eq!(res.diagnostics, Vec::new());

    let c = class_id(&res, "C");
    let s = class_id(&res, "S");
    let constructors = &res.store.class(c).constructors;
    assert_eq!(constructors.len(), 1);
    assert_eq!(constructors[0].origin, ConstructorOrigin::Default);
    assert_eq!(constructors[0].super_target, Some(s));
    assert!(!constructors[0].requires_arguments());
}

#[test]
fn optional_parameters_do_not_block_the_default_constructor() {
    let (res, _) = resolve_app(vec![
        ClassDecl::new("S").with_constructor(
            ConstructorDecl::unnamed()
                .with_param("x", ParamKind::OptionalPositional)
                .with_param("y", ParamKind::Named),
        ),
        ClassDecl::new("C").with_extends(TypeRef::named("S")),
    ]);
    assert_eq!(res.diagnostics, Vec::new());

    let c = class_id(&res, "C");
    assert_eq!(
        res.store.class(c).constructors[0].origin,
        ConstructorOrigin::Default
    );
}

#[test]
fn const_ness_is_forwarded_from_the_superclass() {
    let (res, _) = resolve_app(vec![ClassDecl::new("A")]);
    // The core root declares a const unnamed constructor.
    let a = class_id(&res, "A");
    assert!(res.store.class(a).constructors[0].is_const);
}

#[test]
fn a_superclass_without_an_unnamed_constructor_installs_a_placeholder() {
    let (res, registry) = resolve_app(vec![
        ClassDecl::new("S").with_constructor(ConstructorDecl::named("create")),
        ClassDecl::new("C").with_extends(TypeRef::named("S")),
    ]);
    assert_eq!(diagnostic_codes(&res), vec!["cannot-find-unnamed-constructor"]);

    let c = class_id(&res, "C");
    let constructors = &res.store.class(c).constructors;
    assert_eq!(constructors.len(), 1);
    assert_eq!(constructors[0].origin, ConstructorOrigin::Erroneous);

    assert_eq!(registry.features, vec![Feature::ThrowNoSuchMethod]);
    assert_eq!(registry.constructor_errors.len(), 1);
    assert_eq!(registry.constructor_errors[0].0, c);
    assert_eq!(
        registry.constructor_errors[0].1.code,
        "cannot-find-unnamed-constructor"
    );
}

#[test]
fn a_factory_super_constructor_is_rejected() {
    let (res, registry) = resolve_app(vec![
        ClassDecl::new("S").with_constructor(ConstructorDecl::unnamed().factory()),
        ClassDecl::new("C").with_extends(TypeRef::named("S")),
    ]);
    assert_eq!(diagnostic_codes(&res), vec!["super-call-to-factory"]);

    let c = class_id(&res, "C");
    assert_eq!(
        res.store.class(c).constructors[0].origin,
        ConstructorOrigin::Erroneous
    );
    assert_eq!(registry.features, vec![Feature::ThrowNoSuchMethod]);
}

#[test]
fn a_super_constructor_requiring_arguments_is_rejected() {
    let (res, registry) = resolve_app(vec![
        ClassDecl::new("S")
            .with_constructor(ConstructorDecl::unnamed().with_param("x", ParamKind::Required)),
        ClassDecl::new("C").with_extends(TypeRef::named("S")),
    ]);
    assert_eq!(
        diagnostic_codes(&res),
        vec!["no-matching-constructor-for-implicit"]
    );

    let c = class_id(&res, "C");
    assert_eq!(
        res.store.class(c).constructors[0].origin,
        ConstructorOrigin::Erroneous
    );
    assert_eq!(registry.features, vec![Feature::ThrowNoSuchMethod]);
}

#[test]
fn placeholders_chain_without_further_diagnostics() {
    // C's placeholder is generative and zero-arg, so D below it synthesizes a
    // plain default against it.
    let (res, _) = resolve_app(vec![
        ClassDecl::new("S").with_constructor(ConstructorDecl::named("create")),
        ClassDecl::new("C").with_extends(TypeRef::named("S")),
        ClassDecl::new("D").with_extends(TypeRef::named("C")),
    ]);
    assert_eq!(diagnostic_codes(&res), vec!["cannot-find-unnamed-constructor"]);

    let d = class_id(&res, "D");
    assert_eq!(
        res.store.class(d).constructors[0].origin,
        ConstructorOrigin::Default
    );
}
