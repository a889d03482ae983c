use lumen_core::ClassId;
use lumen_hir::{ClassDecl, ConstructorDecl, LibraryTree, Program, TypeRef};
use lumen_resolve::{
    resolve, resolve_program, DefaultBackend, HierarchyResolution, NullRegistry, ResolveConfig,
};
use lumen_types::{ClassKind, ConstructorOrigin, ParamKind, Type};
use pretty_assertions::assert_eq;

fn resolve_app(classes: Vec<ClassDecl>) -> HierarchyResolution {
    let mut app = LibraryTree::new("app");
    app.classes = classes;
    resolve(&Program::with_core(app)).expect("program has a core library")
}

fn resolve_shared(program: &Program) -> HierarchyResolution {
    let config = ResolveConfig {
        share_mixin_applications: true,
    };
    resolve_program(program, &DefaultBackend, &config, &mut NullRegistry)
        .expect("program has a core library")
}

fn class_id(res: &HierarchyResolution, name: &str) -> ClassId {
    res.store
        .class_ids()
        .find(|&id| res.store.class(id).name.as_str() == name)
        .unwrap_or_else(|| panic!("no class named `{name}`"))
}

fn supertype_chain(res: &HierarchyResolution, name: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(class_id(res, name));
    while let Some(id) = current {
        names.push(res.store.class(id).name.to_string());
        current = res.store.class(id).supertype.as_ref().map(|s| s.class);
    }
    names
}

fn linearized_names(res: &HierarchyResolution, name: &str) -> Vec<String> {
    res.store
        .class(class_id(res, name))
        .all_supertypes
        .as_ref()
        .expect("class is linearized")
        .iter()
        .map(|ty| res.store.class(ty.class).name.to_string())
        .collect()
}

fn diagnostic_codes(res: &HierarchyResolution) -> Vec<&str> {
    res.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn a_named_application_occupies_the_last_chain_slot() {
    let res = resolve_app(vec![
        ClassDecl::new("A"),
        ClassDecl::new("M1"),
        ClassDecl::new("M2"),
        ClassDecl::named_mixin_application(
            "D",
            TypeRef::named("A"),
            vec![TypeRef::named("M1"), TypeRef::named("M2")],
        ),
    ]);
    assert_eq!(res.diagnostics, Vec::new());
    assert_eq!(supertype_chain(&res, "D"), vec!["D", "_A&M1", "A", "Object"]);

    let d = class_id(&res, "D");
    let m2 = class_id(&res, "M2");
    assert_eq!(res.store.class(d).kind, ClassKind::NamedMixinApplication);
    assert_eq!(
        res.store.class(d).mixin.as_ref().map(|m| m.class),
        Some(m2)
    );
    assert_eq!(res.store.class(d).interfaces[0].class, m2);

    let link = class_id(&res, "_A&M1");
    let m1 = class_id(&res, "M1");
    assert_eq!(
        res.store.class(link).kind,
        ClassKind::SyntheticMixinApplication
    );
    assert_eq!(
        res.store.class(link).mixin.as_ref().map(|m| m.class),
        Some(m1)
    );
    assert_eq!(res.store.class(link).interfaces[0].class, m1);

    // Each application forwards its superclass's synthesized default.
    let a = class_id(&res, "A");
    let link_ctors = &res.store.class(link).constructors;
    assert_eq!(link_ctors.len(), 1);
    assert_eq!(link_ctors[0].origin, ConstructorOrigin::Forwarding);
    assert_eq!(link_ctors[0].super_target, Some(a));

    let d_ctors = &res.store.class(d).constructors;
    assert_eq!(d_ctors.len(), 1);
    assert_eq!(d_ctors[0].origin, ConstructorOrigin::Forwarding);
    assert_eq!(d_ctors[0].super_target, Some(link));
}

#[test]
fn declared_interfaces_follow_the_final_mixin() {
    let res = resolve_app(vec![
        ClassDecl::new("S"),
        ClassDecl::new("M1"),
        ClassDecl::new("M2"),
        ClassDecl::new("I"),
        ClassDecl::named_mixin_application(
            "N",
            TypeRef::named("S"),
            vec![TypeRef::named("M1"), TypeRef::named("M2")],
        )
        .with_interface(TypeRef::named("I")),
    ]);
    assert_eq!(res.diagnostics, Vec::new());

    let n = class_id(&res, "N");
    let interface_names: Vec<String> = res
        .store
        .class(n)
        .interfaces
        .iter()
        .map(|ty| res.store.class(ty.class).name.to_string())
        .collect();
    assert_eq!(interface_names, vec!["M2", "I"]);
}

#[test]
fn an_anonymous_application_chains_below_the_declaring_class() {
    let res = resolve_app(vec![
        ClassDecl::new("A"),
        ClassDecl::new("M1"),
        ClassDecl::new("M2"),
        ClassDecl::new("F")
            .with_extends(TypeRef::named("A"))
            .with_mixin(TypeRef::named("M1"))
            .with_mixin(TypeRef::named("M2")),
    ]);
    assert_eq!(res.diagnostics, Vec::new());
    assert_eq!(
        supertype_chain(&res, "F"),
        vec!["F", "_A&M1&M2", "_A&M1", "A", "Object"]
    );

    // The declaring class itself is not a mixin application.
    let f = class_id(&res, "F");
    assert_eq!(res.store.class(f).kind, ClassKind::Regular);
    assert_eq!(res.store.class(f).mixin, None);

    assert_eq!(
        linearized_names(&res, "F"),
        vec!["F", "_A&M1&M2", "_A&M1", "M2", "A", "M1", "Object"]
    );
}

#[test]
fn the_chain_length_equals_the_mixin_count() {
    let res = resolve_app(vec![
        ClassDecl::new("S"),
        ClassDecl::new("M1"),
        ClassDecl::new("M2"),
        ClassDecl::new("M3"),
        ClassDecl::named_mixin_application(
            "N",
            TypeRef::named("S"),
            vec![
                TypeRef::named("M1"),
                TypeRef::named("M2"),
                TypeRef::named("M3"),
            ],
        ),
    ]);
    assert_eq!(res.diagnostics, Vec::new());
    // k mixins: the walk from the result back to the original supertype
    // crosses exactly k applications.
    assert_eq!(
        supertype_chain(&res, "N"),
        vec!["N", "_S&M1&M2", "_S&M1", "S", "Object"]
    );
}

#[test]
fn mixin_arguments_flow_through_the_chain() {
    let res = resolve_app(vec![
        ClassDecl::new("Box").with_type_param("T"),
        ClassDecl::new("M").with_type_param("T"),
        ClassDecl::new("G")
            .with_type_param("T")
            .with_extends(TypeRef::generic("Box", vec![TypeRef::named("T")]))
            .with_mixin(TypeRef::generic("M", vec![TypeRef::named("T")])),
    ]);
    assert_eq!(res.diagnostics, Vec::new());

    let g = class_id(&res, "G");
    let m = class_id(&res, "M");
    let box_ = class_id(&res, "Box");
    let all = res.store.class(g).all_supertypes.as_ref().unwrap();
    let m_entry = all.iter().find(|ty| ty.class == m).expect("M inherited");
    assert_eq!(m_entry.args, vec![Type::type_variable(g, 0)]);
    let box_entry = all.iter().find(|ty| ty.class == box_).expect("Box inherited");
    assert_eq!(box_entry.args, vec![Type::type_variable(g, 0)]);

    // The link's own supertype is expressed in its own parameter space.
    let link = res.store.class(g).supertype.as_ref().unwrap().class;
    assert_eq!(res.store.class(link).type_params.len(), 1);
    assert_eq!(
        res.store.class(link).supertype.as_ref().unwrap().args,
        vec![Type::type_variable(link, 0)]
    );
}

#[test]
fn forwarders_preserve_structure_and_skip_foreign_private_constructors() {
    let other = LibraryTree::new("other").with_class(
        ClassDecl::new("S")
            .with_constructor(
                ConstructorDecl::unnamed()
                    .with_param("a", ParamKind::Required)
                    .with_param("b", ParamKind::Named),
            )
            .with_constructor(ConstructorDecl::named("create"))
            .with_constructor(ConstructorDecl::named("_hidden"))
            .with_constructor(ConstructorDecl::named("make").factory()),
    );
    let app = LibraryTree::new("app")
        .with_import("other")
        .with_class(ClassDecl::new("M"))
        .with_class(ClassDecl::named_mixin_application(
            "D",
            TypeRef::named("S"),
            vec![TypeRef::named("M")],
        ));
    let res = resolve(&Program::new(vec![
        LibraryTree::minimal_core(),
        other,
        app,
    ]))
    .expect("program has a core library");
    assert_eq!(res.diagnostics, Vec::new());

    let d = class_id(&res, "D");
    let constructors = &res.store.class(d).constructors;
    let names: Vec<&str> = constructors.iter().map(|c| c.name.as_str()).collect();
    // The factory and the cross-library private constructor are not
    // forwarded.
    assert_eq!(names, vec!["", "create"]);
    assert!(constructors
        .iter()
        .all(|c| c.origin == ConstructorOrigin::Forwarding));

    let unnamed = &constructors[0];
    assert_eq!(unnamed.params.len(), 2);
    assert_eq!(unnamed.params[0].kind, ParamKind::Required);
    assert_eq!(unnamed.params[1].kind, ParamKind::Named);
}

#[test]
fn private_constructors_are_forwarded_within_their_library() {
    let res = resolve_app(vec![
        ClassDecl::new("S")
            .with_constructor(ConstructorDecl::unnamed())
            .with_constructor(ConstructorDecl::named("_hidden")),
        ClassDecl::new("M"),
        ClassDecl::named_mixin_application("D", TypeRef::named("S"), vec![TypeRef::named("M")]),
    ]);
    assert_eq!(res.diagnostics, Vec::new());

    let d = class_id(&res, "D");
    let names: Vec<&str> = res
        .store
        .class(d)
        .constructors
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["", "_hidden"]);
}

#[test]
fn a_self_mixing_application_breaks_its_own_chain() {
    let res = resolve_app(vec![ClassDecl::named_mixin_application(
        "M1",
        TypeRef::named("Object"),
        vec![TypeRef::named("M1")],
    )]);
    assert_eq!(
        diagnostic_codes(&res),
        vec!["cyclic-class-hierarchy", "illegal-mixin-cycle"]
    );

    let m1 = class_id(&res, "M1");
    assert_eq!(res.store.class(m1).mixin, None);
    assert!(res.store.class(m1).has_incomplete_hierarchy);
    assert_eq!(linearized_names(&res, "M1"), vec!["M1", "Object"]);
}

#[test]
fn a_transitive_mixin_cycle_truncates_its_users() {
    let res = resolve_app(vec![
        ClassDecl::named_mixin_application(
            "M1",
            TypeRef::named("Object"),
            vec![TypeRef::named("M2")],
        ),
        ClassDecl::named_mixin_application(
            "M2",
            TypeRef::named("Object"),
            vec![TypeRef::named("M1")],
        ),
        ClassDecl::new("F").with_mixin(TypeRef::named("M1")),
    ]);
    let codes = diagnostic_codes(&res);
    assert_eq!(
        codes.iter().filter(|c| **c == "illegal-mixin-cycle").count(),
        1
    );

    let f = class_id(&res, "F");
    assert!(res.store.class(f).has_incomplete_hierarchy);
    // F still linearizes through its truncated superclass.
    assert_eq!(
        linearized_names(&res, "F"),
        vec!["F", "_Object&M1", "M1", "Object"]
    );
}

#[test]
fn an_invalid_mixin_truncates_the_link_but_keeps_the_chain() {
    let res = resolve_app(vec![
        ClassDecl::enum_("Color").with_enum_constant("red"),
        ClassDecl::new("A"),
        ClassDecl::new("F")
            .with_extends(TypeRef::named("A"))
            .with_mixin(TypeRef::named("Color")),
    ]);
    assert_eq!(diagnostic_codes(&res), vec!["cannot-mixin-enum"]);

    let f = class_id(&res, "F");
    let link = res.store.class(f).supertype.as_ref().unwrap().class;
    assert_eq!(
        res.store.class(link).kind,
        ClassKind::SyntheticMixinApplication
    );
    assert_eq!(res.store.class(link).mixin, None);
    assert!(res.store.class(link).has_incomplete_hierarchy);
    assert!(res.store.class(f).has_incomplete_hierarchy);
    assert_eq!(supertype_chain(&res, "F"), vec!["F", "_A&Color", "A", "Object"]);
}

#[test]
fn mixing_in_dynamic_is_rejected() {
    let res = resolve_app(vec![ClassDecl::new("F").with_mixin(TypeRef::dynamic())]);
    assert_eq!(diagnostic_codes(&res), vec!["cannot-mixin"]);

    let f = class_id(&res, "F");
    assert!(res.store.class(f).has_incomplete_hierarchy);
}

fn sharing_fixture() -> Program {
    let mut app = LibraryTree::new("app");
    app.classes = vec![
        ClassDecl::new("A"),
        ClassDecl::new("M"),
        ClassDecl::new("X")
            .with_extends(TypeRef::named("A"))
            .with_mixin(TypeRef::named("M")),
        ClassDecl::new("Y")
            .with_extends(TypeRef::named("A"))
            .with_mixin(TypeRef::named("M")),
    ];
    Program::with_core(app)
}

#[test]
fn equal_applications_share_one_link_when_sharing_is_on() {
    let res = resolve_shared(&sharing_fixture());
    assert_eq!(res.diagnostics, Vec::new());

    let x = class_id(&res, "X");
    let y = class_id(&res, "Y");
    let x_link = res.store.class(x).supertype.as_ref().unwrap().class;
    let y_link = res.store.class(y).supertype.as_ref().unwrap().class;
    assert_eq!(x_link, y_link);
}

#[test]
fn equal_applications_stay_distinct_by_default() {
    let res = resolve(&sharing_fixture()).expect("program has a core library");
    let x = class_id(&res, "X");
    let y = class_id(&res, "Y");
    let x_link = res.store.class(x).supertype.as_ref().unwrap().class;
    let y_link = res.store.class(y).supertype.as_ref().unwrap().class;
    assert_ne!(x_link, y_link);
}

#[test]
fn sharing_is_per_library() {
    let shared = LibraryTree::new("shared")
        .with_class(ClassDecl::new("A"))
        .with_class(ClassDecl::new("M"));
    let lib1 = LibraryTree::new("lib1").with_import("shared").with_class(
        ClassDecl::new("X")
            .with_extends(TypeRef::named("A"))
            .with_mixin(TypeRef::named("M")),
    );
    let lib2 = LibraryTree::new("lib2").with_import("shared").with_class(
        ClassDecl::new("Y")
            .with_extends(TypeRef::named("A"))
            .with_mixin(TypeRef::named("M")),
    );
    let res = resolve_shared(&Program::new(vec![
        LibraryTree::minimal_core(),
        shared,
        lib1,
        lib2,
    ]));
    assert_eq!(res.diagnostics, Vec::new());

    let x = class_id(&res, "X");
    let y = class_id(&res, "Y");
    let x_link = res.store.class(x).supertype.as_ref().unwrap().class;
    let y_link = res.store.class(y).supertype.as_ref().unwrap().class;
    assert_ne!(x_link, y_link);
}

#[test]
fn shared_links_abstract_over_the_declaring_classes_parameters() {
    let mut app = LibraryTree::new("app");
    app.classes = vec![
        ClassDecl::new("Box").with_type_param("T"),
        ClassDecl::new("M").with_type_param("T"),
        ClassDecl::new("P")
            .with_type_param("T")
            .with_extends(TypeRef::generic("Box", vec![TypeRef::named("T")]))
            .with_mixin(TypeRef::generic("M", vec![TypeRef::named("T")])),
        ClassDecl::new("Q")
            .with_type_param("S")
            .with_extends(TypeRef::generic("Box", vec![TypeRef::named("S")]))
            .with_mixin(TypeRef::generic("M", vec![TypeRef::named("S")])),
    ];
    let res = resolve_shared(&Program::with_core(app));
    assert_eq!(res.diagnostics, Vec::new());

    let p = class_id(&res, "P");
    let q = class_id(&res, "Q");
    let p_super = res.store.class(p).supertype.clone().unwrap();
    let q_super = res.store.class(q).supertype.clone().unwrap();
    assert_eq!(p_super.class, q_super.class);
    assert_eq!(p_super.args, vec![Type::type_variable(p, 0)]);
    assert_eq!(q_super.args, vec![Type::type_variable(q, 0)]);

    // The shared link has one parameter, standing for the one free variable.
    let link = p_super.class;
    assert_eq!(res.store.class(link).type_params.len(), 1);
}

#[test]
fn sharing_does_not_change_observable_hierarchies() {
    let program = {
        let mut app = LibraryTree::new("app");
        app.classes = vec![
            ClassDecl::new("Box").with_type_param("T"),
            ClassDecl::new("M").with_type_param("T"),
            ClassDecl::new("G")
                .with_type_param("T")
                .with_extends(TypeRef::generic("Box", vec![TypeRef::named("T")]))
                .with_mixin(TypeRef::generic("M", vec![TypeRef::named("T")])),
        ];
        Program::with_core(app)
    };

    let plain = resolve(&program).expect("program has a core library");
    let shared = resolve_shared(&program);
    assert_eq!(plain.diagnostics, Vec::new());
    assert_eq!(shared.diagnostics, Vec::new());
    assert_eq!(
        linearized_names(&plain, "G"),
        linearized_names(&shared, "G")
    );
}
