use lumen_core::{LibraryId, Name};
use lumen_types::{ParamKind, Span};

pub use lumen_types::LibraryKind;

/// A whole program: every library the compiler driver materialized before
/// resolution starts. [`LibraryId`]s index into `libraries`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub libraries: Vec<LibraryTree>,
}

impl Program {
    #[must_use]
    pub fn new(libraries: Vec<LibraryTree>) -> Self {
        Program { libraries }
    }

    /// A program consisting of the minimal core library plus `library`.
    #[must_use]
    pub fn with_core(library: LibraryTree) -> Self {
        Program {
            libraries: vec![LibraryTree::minimal_core(), library],
        }
    }

    #[must_use]
    pub fn library(&self, id: LibraryId) -> &LibraryTree {
        &self.libraries[id.idx()]
    }

    #[must_use]
    pub fn class_decl(&self, library: LibraryId, index: u32) -> &ClassDecl {
        &self.library(library).classes[index as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryTree {
    pub name: Name,
    pub kind: LibraryKind,
    pub imports: Vec<Import>,
    pub classes: Vec<ClassDecl>,
}

impl LibraryTree {
    #[must_use]
    pub fn new(name: impl Into<Name>) -> Self {
        LibraryTree {
            name: name.into(),
            kind: LibraryKind::User,
            imports: Vec::new(),
            classes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: ClassDecl) -> Self {
        self.classes.push(class);
        self
    }

    #[must_use]
    pub fn with_import(mut self, library: impl Into<Name>) -> Self {
        self.imports.push(Import {
            library: library.into(),
            prefix: None,
            range: Span::new(0, 0),
        });
        self
    }

    #[must_use]
    pub fn with_prefixed_import(
        mut self,
        library: impl Into<Name>,
        prefix: impl Into<Name>,
    ) -> Self {
        self.imports.push(Import {
            library: library.into(),
            prefix: Some(prefix.into()),
            range: Span::new(0, 0),
        });
        self
    }

    /// The minimal core library: the root class and the platform types the
    /// deny-list protects. Drivers and tests share this fixture.
    #[must_use]
    pub fn minimal_core() -> Self {
        let mut core = LibraryTree::new("core");
        core.kind = LibraryKind::Core;
        core.classes = vec![
            ClassDecl::new("Object").with_constructor(ConstructorDecl::unnamed().const_()),
            ClassDecl::new("bool"),
            ClassDecl::new("num"),
            ClassDecl::new("int").with_extends(TypeRef::named("num")),
            ClassDecl::new("double").with_extends(TypeRef::named("num")),
            ClassDecl::new("String"),
            ClassDecl::new("Null"),
        ];
        core
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub library: Name,
    pub prefix: Option<Name>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Enum,
    /// `class N = S with M1, M2 implements I;`
    NamedMixinApplication,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: Name,
    pub kind: DeclKind,
    pub range: Span,
    pub name_range: Span,
    pub type_params: Vec<TypeParamDecl>,
    pub extends: Option<TypeRef>,
    /// Mixins of the `with` clause, in source order.
    pub mixins: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub members: Vec<Member>,
}

impl ClassDecl {
    #[must_use]
    pub fn new(name: impl Into<Name>) -> Self {
        ClassDecl {
            name: name.into(),
            kind: DeclKind::Class,
            range: Span::new(0, 0),
            name_range: Span::new(0, 0),
            type_params: Vec::new(),
            extends: None,
            mixins: Vec::new(),
            implements: Vec::new(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn enum_(name: impl Into<Name>) -> Self {
        let mut decl = ClassDecl::new(name);
        decl.kind = DeclKind::Enum;
        decl
    }

    #[must_use]
    pub fn named_mixin_application(
        name: impl Into<Name>,
        extends: TypeRef,
        mixins: Vec<TypeRef>,
    ) -> Self {
        let mut decl = ClassDecl::new(name);
        decl.kind = DeclKind::NamedMixinApplication;
        decl.extends = Some(extends);
        decl.mixins = mixins;
        decl
    }

    #[must_use]
    pub fn with_type_param(mut self, name: impl Into<Name>) -> Self {
        self.type_params.push(TypeParamDecl {
            name: name.into(),
            name_range: Span::new(0, 0),
            bound: None,
        });
        self
    }

    #[must_use]
    pub fn with_bounded_type_param(mut self, name: impl Into<Name>, bound: TypeRef) -> Self {
        self.type_params.push(TypeParamDecl {
            name: name.into(),
            name_range: Span::new(0, 0),
            bound: Some(bound),
        });
        self
    }

    #[must_use]
    pub fn with_extends(mut self, supertype: TypeRef) -> Self {
        self.extends = Some(supertype);
        self
    }

    #[must_use]
    pub fn with_mixin(mut self, mixin: TypeRef) -> Self {
        self.mixins.push(mixin);
        self
    }

    #[must_use]
    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.implements.push(interface);
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.members.push(Member::Constructor(constructor));
        self
    }

    #[must_use]
    pub fn with_enum_constant(mut self, name: impl Into<Name>) -> Self {
        self.members.push(Member::EnumConstant {
            name: name.into(),
            range: Span::new(0, 0),
        });
        self
    }

    pub fn constructors(&self) -> impl Iterator<Item = &ConstructorDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Constructor(ctor) => Some(ctor),
            _ => None,
        })
    }

    #[must_use]
    pub fn has_enum_constants(&self) -> bool {
        self.members
            .iter()
            .any(|member| matches!(member, Member::EnumConstant { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Constructor(ConstructorDecl),
    EnumConstant {
        name: Name,
        range: Span,
    },
    /// A field or method; opaque to hierarchy resolution.
    Other {
        name: Name,
        range: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    /// Empty for the unnamed constructor.
    pub name: Name,
    pub is_factory: bool,
    pub is_const: bool,
    pub params: Vec<ParamDecl>,
    pub range: Span,
    pub name_range: Span,
}

impl ConstructorDecl {
    #[must_use]
    pub fn unnamed() -> Self {
        ConstructorDecl {
            name: Name::empty(),
            is_factory: false,
            is_const: false,
            params: Vec::new(),
            range: Span::new(0, 0),
            name_range: Span::new(0, 0),
        }
    }

    #[must_use]
    pub fn named(name: impl Into<Name>) -> Self {
        let mut ctor = ConstructorDecl::unnamed();
        ctor.name = name.into();
        ctor
    }

    #[must_use]
    pub fn factory(mut self) -> Self {
        self.is_factory = true;
        self
    }

    #[must_use]
    pub fn const_(mut self) -> Self {
        self.is_const = true;
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<Name>, kind: ParamKind) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            kind,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Name,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub name: Name,
    pub name_range: Span,
    pub bound: Option<TypeRef>,
}

/// A syntactic nominal type annotation, possibly generic, possibly behind an
/// import prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub prefix: Option<Name>,
    pub name: Name,
    pub args: Vec<TypeRef>,
    pub range: Span,
}

impl TypeRef {
    #[must_use]
    pub fn named(name: impl Into<Name>) -> Self {
        TypeRef {
            prefix: None,
            name: name.into(),
            args: Vec::new(),
            range: Span::new(0, 0),
        }
    }

    #[must_use]
    pub fn generic(name: impl Into<Name>, args: Vec<TypeRef>) -> Self {
        TypeRef {
            prefix: None,
            name: name.into(),
            args,
            range: Span::new(0, 0),
        }
    }

    #[must_use]
    pub fn prefixed(prefix: impl Into<Name>, name: impl Into<Name>) -> Self {
        TypeRef {
            prefix: Some(prefix.into()),
            name: name.into(),
            args: Vec::new(),
            range: Span::new(0, 0),
        }
    }

    /// The `dynamic` top-type annotation.
    #[must_use]
    pub fn dynamic() -> Self {
        TypeRef::named("dynamic")
    }
}
