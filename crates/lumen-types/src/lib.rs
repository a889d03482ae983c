//! Shared types for Lumen's hierarchy resolution.
//!
//! This crate serves two roles:
//! 1) A small "shared types" crate (spans, diagnostics) used across Lumen
//!    crates.
//! 2) The semantic class model: a compact [`Type`] representation and the
//!    mutable [`ClassDef`] records the resolver fills in, held in a
//!    [`ClassStore`] arena and addressed by [`ClassId`].

use std::collections::HashMap;
use std::fmt;

use lumen_core::{ClassId, LibraryId, Name};

// === Generic shared types ====================================================

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }
}

// === Type representation =====================================================

/// Identity of a type parameter: the declaring class plus its index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParameterId {
    pub class: ClassId,
    pub index: u32,
}

impl TypeParameterId {
    pub fn new(class: ClassId, index: u32) -> Self {
        Self { class, index }
    }
}

impl fmt::Debug for TypeParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeParameterId({:?}, {})", self.class, self.index)
    }
}

/// An instantiation of a class-like declaration used as a type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    pub class: ClassId,
    pub args: Vec<Type>,
}

impl InterfaceType {
    pub fn new(class: ClassId, args: Vec<Type>) -> Self {
        Self { class, args }
    }

    /// Replace references to `owner`'s type parameters with `args`.
    pub fn substitute(&self, owner: ClassId, args: &[Type]) -> InterfaceType {
        InterfaceType {
            class: self.class,
            args: self
                .args
                .iter()
                .map(|arg| arg.substitute(owner, args))
                .collect(),
        }
    }

    /// Rename type-variable identities from one declaring class to another.
    ///
    /// Used when a synthetic class mirrors the type parameters of the class
    /// whose clause introduced it.
    pub fn rename_type_variables(&self, from: ClassId, to: ClassId) -> InterfaceType {
        InterfaceType {
            class: self.class,
            args: self
                .args
                .iter()
                .map(|arg| arg.rename_type_variables(from, to))
                .collect(),
        }
    }
}

impl fmt::Debug for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "InterfaceType({:?})", self.class)
        } else {
            write!(f, "InterfaceType({:?}, {:?})", self.class, self.args)
        }
    }
}

/// A resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Reference to a class-like declaration with type arguments.
    Interface(InterfaceType),

    /// Reference to an in-scope type parameter.
    TypeVariable(TypeParameterId),

    /// The `dynamic` top type.
    Dynamic,

    /// A type that failed to resolve; carries the diagnostic that produced it.
    /// Used for error recovery.
    Malformed(Box<Diagnostic>),
}

impl Type {
    pub fn interface(class: ClassId, args: Vec<Type>) -> Self {
        Type::Interface(InterfaceType::new(class, args))
    }

    pub fn type_variable(class: ClassId, index: u32) -> Self {
        Type::TypeVariable(TypeParameterId::new(class, index))
    }

    pub fn malformed(diagnostic: Diagnostic) -> Self {
        Type::Malformed(Box::new(diagnostic))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Type::Malformed(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Type::Dynamic)
    }

    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            Type::Interface(ty) => Some(ty),
            _ => None,
        }
    }

    /// Replace references to `owner`'s type parameters with `args`.
    ///
    /// An out-of-range index degrades to `dynamic` rather than panicking;
    /// arity mismatches were already diagnosed where the type was formed.
    pub fn substitute(&self, owner: ClassId, args: &[Type]) -> Type {
        match self {
            Type::TypeVariable(tv) if tv.class == owner => args
                .get(tv.index as usize)
                .cloned()
                .unwrap_or(Type::Dynamic),
            Type::Interface(ty) => Type::Interface(ty.substitute(owner, args)),
            other => other.clone(),
        }
    }

    /// Rename type-variable identities from one declaring class to another.
    pub fn rename_type_variables(&self, from: ClassId, to: ClassId) -> Type {
        match self {
            Type::TypeVariable(tv) if tv.class == from => {
                Type::TypeVariable(TypeParameterId::new(to, tv.index))
            }
            Type::Interface(ty) => Type::Interface(ty.rename_type_variables(from, to)),
            other => other.clone(),
        }
    }
}

// === Class records ===========================================================

/// Progress of a per-class pass. Used for both supertype loading and full
/// resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Started,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Regular,
    Enum,
    /// `class N = S with M;`
    NamedMixinApplication,
    /// An intermediate link in a mixin chain, introduced by the resolver.
    SyntheticMixinApplication,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: Name,
    pub name_range: Span,
    /// Defaults to `dynamic` until (and unless) a bound annotation resolves.
    pub bound: Type,
}

impl TypeParamDef {
    pub fn new(name: impl Into<Name>, name_range: Span) -> Self {
        Self {
            name: name.into(),
            name_range,
            bound: Type::Dynamic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Required,
    OptionalPositional,
    Named,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: Name,
    pub kind: ParamKind,
}

impl ParamDef {
    pub fn new(name: impl Into<Name>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// How a constructor came to exist on its class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstructorOrigin {
    Declared,
    /// Synthesized zero-arg default forwarding to the superclass.
    Default,
    /// Synthesized mixin-application forwarder.
    Forwarding,
    /// Placeholder installed when no valid super target exists.
    Erroneous,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorDef {
    /// Empty for the unnamed constructor.
    pub name: Name,
    pub is_factory: bool,
    pub is_const: bool,
    pub origin: ConstructorOrigin,
    pub params: Vec<ParamDef>,
    /// The superclass whose constructor this one forwards to, for synthesized
    /// constructors.
    pub super_target: Option<ClassId>,
}

impl ConstructorDef {
    /// A generative constructor produces a fresh instance of its declaring
    /// class; anything that is not a factory qualifies.
    pub fn is_generative(&self) -> bool {
        !self.is_factory
    }

    pub fn requires_arguments(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::Required)
    }
}

/// The mutable record for one class-like declaration.
///
/// Created unresolved when the store is built (or when the resolver
/// introduces a synthetic mixin application) and filled in by the resolver,
/// which is the single writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub name: Name,
    pub library: LibraryId,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParamDef>,

    pub load_state: Phase,
    pub resolution_state: Phase,

    pub supertype: Option<InterfaceType>,
    pub interfaces: Vec<InterfaceType>,
    /// Present only on mixin applications.
    pub mixin: Option<InterfaceType>,
    /// The linearization including the class itself; `None` until computed.
    pub all_supertypes: Option<Vec<InterfaceType>>,
    pub has_incomplete_hierarchy: bool,

    pub constructors: Vec<ConstructorDef>,

    /// Index of the declaration this record was created from; `None` for
    /// synthetic classes.
    pub origin: Option<(LibraryId, u32)>,
}

impl ClassDef {
    pub fn new(name: impl Into<Name>, library: LibraryId, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            library,
            kind,
            type_params: Vec::new(),
            load_state: Phase::Unstarted,
            resolution_state: Phase::Unstarted,
            supertype: None,
            interfaces: Vec::new(),
            mixin: None,
            all_supertypes: None,
            has_incomplete_hierarchy: false,
            constructors: Vec::new(),
            origin: None,
        }
    }

    pub fn is_mixin_application(&self) -> bool {
        matches!(
            self.kind,
            ClassKind::NamedMixinApplication | ClassKind::SyntheticMixinApplication
        )
    }

    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    /// Install the supertype. Set once; the loader's cycle breaking may have
    /// installed it before the resolver runs, in which case the resolver
    /// skips the clause entirely.
    pub fn set_supertype(&mut self, supertype: InterfaceType) {
        debug_assert!(self.supertype.is_none(), "supertype set twice");
        self.supertype = Some(supertype);
    }

    pub fn set_all_supertypes(&mut self, all: Vec<InterfaceType>) {
        debug_assert!(self.all_supertypes.is_none(), "linearization set twice");
        self.all_supertypes = Some(all);
    }

    /// The unnamed constructor, if any.
    pub fn unnamed_constructor(&self) -> Option<&ConstructorDef> {
        self.constructors.iter().find(|c| c.name.is_empty())
    }

    /// First type parameter with the given name. Duplicate names keep their
    /// first declaration visible in scope.
    pub fn type_param_index(&self, name: &Name) -> Option<u32> {
        self.type_params
            .iter()
            .position(|tp| &tp.name == name)
            .map(|idx| idx as u32)
    }
}

// === Libraries ===============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryKind {
    /// The platform library declaring `Object` and the other root types.
    Core,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryDef {
    pub name: Name,
    pub kind: LibraryKind,
    /// Classes declared in this library, first declaration wins.
    pub classes_by_name: HashMap<Name, ClassId>,
    /// Import prefixes: `import "x" as p;` maps `p` to the imported library.
    pub prefixes: HashMap<Name, LibraryId>,
    /// Unprefixed imports, in declaration order. The core library is an
    /// implicit import of every user library.
    pub imports: Vec<LibraryId>,
    /// Interning table for shared synthetic mixin applications, keyed by
    /// structural signature.
    pub mixin_applications: HashMap<String, ClassId>,
}

impl LibraryDef {
    pub fn new(name: impl Into<Name>, kind: LibraryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            classes_by_name: HashMap::new(),
            prefixes: HashMap::new(),
            imports: Vec::new(),
            mixin_applications: HashMap::new(),
        }
    }

    pub fn is_core(&self) -> bool {
        self.kind == LibraryKind::Core
    }
}

/// The root class plus the platform types users may not extend, implement,
/// or mix in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreTypes {
    pub object: ClassId,
    pub bool_type: ClassId,
    pub num_type: ClassId,
    pub int_type: ClassId,
    pub double_type: ClassId,
    pub string_type: ClassId,
    pub null_type: ClassId,
}

impl CoreTypes {
    /// Whether `class` may not appear in an extends/implements/with clause of
    /// user code.
    pub fn is_denied(&self, class: ClassId) -> bool {
        class == self.bool_type
            || class == self.num_type
            || class == self.int_type
            || class == self.double_type
            || class == self.string_type
            || class == self.null_type
    }
}

// === Store ===================================================================

/// Arena of class records and libraries.
///
/// Ids are indices into the arenas and are allocated monotonically; synthetic
/// mixin applications are appended by the resolver during expansion.
#[derive(Debug, Default)]
pub struct ClassStore {
    classes: Vec<ClassDef>,
    libraries: Vec<LibraryDef>,
    core: Option<CoreTypes>,
}

impl ClassStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_class(&mut self, class: ClassDef) -> ClassId {
        let id = ClassId::from_raw(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    pub fn alloc_library(&mut self, library: LibraryDef) -> LibraryId {
        let id = LibraryId::from_raw(self.libraries.len() as u32);
        self.libraries.push(library);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.idx()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.idx()]
    }

    pub fn library(&self, id: LibraryId) -> &LibraryDef {
        &self.libraries[id.idx()]
    }

    pub fn library_mut(&mut self, id: LibraryId) -> &mut LibraryDef {
        &mut self.libraries[id.idx()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len() as u32).map(ClassId::from_raw)
    }

    pub fn library_ids(&self) -> impl Iterator<Item = LibraryId> {
        (0..self.libraries.len() as u32).map(LibraryId::from_raw)
    }

    pub fn set_core(&mut self, core: CoreTypes) {
        debug_assert!(self.core.is_none(), "core types set twice");
        self.core = Some(core);
    }

    pub fn core(&self) -> &CoreTypes {
        self.core
            .as_ref()
            .expect("core types must be initialized before resolution")
    }

    /// Look up a class declared in (not merely visible from) `library`.
    pub fn class_in_library(&self, library: LibraryId, name: &Name) -> Option<ClassId> {
        self.library(library).classes_by_name.get(name).copied()
    }

    /// The instantiation of a class with its own type parameters as
    /// arguments.
    pub fn this_type(&self, class: ClassId) -> InterfaceType {
        let args = (0..self.class(class).type_params.len() as u32)
            .map(|index| Type::type_variable(class, index))
            .collect();
        InterfaceType::new(class, args)
    }

    /// The root class as a type.
    pub fn object_type(&self) -> InterfaceType {
        InterfaceType::new(self.core().object, Vec::new())
    }
}
