//! Lexical lookup of type-level names.

use lumen_core::{ClassId, LibraryId, Name};
use lumen_hir::TypeRef;
use lumen_types::{ClassStore, TypeParameterId};

/// Result of looking up a nominal reference in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeLookup {
    Class(ClassId),
    TypeParameter(TypeParameterId),
    /// Nothing by that name is visible (also: a prefix member that is not a
    /// type-like declaration).
    NotFound,
    /// The receiver of a dotted reference is not an import prefix.
    NotAPrefix,
}

/// The lexical scope enclosing one class-like declaration: the type
/// parameters of the class itself, then the declaring library's own classes,
/// then its unprefixed imports (the core library is an implicit import of
/// every user library).
pub struct ClassScope<'a> {
    store: &'a ClassStore,
    library: LibraryId,
    owner: Option<ClassId>,
}

impl<'a> ClassScope<'a> {
    #[must_use]
    pub fn new(store: &'a ClassStore, library: LibraryId, owner: Option<ClassId>) -> Self {
        Self {
            store,
            library,
            owner,
        }
    }

    #[must_use]
    pub fn resolve_ref(&self, node: &TypeRef) -> TypeLookup {
        match &node.prefix {
            Some(prefix) => self.resolve_prefixed(prefix, &node.name),
            None => self.resolve_simple(&node.name),
        }
    }

    fn resolve_simple(&self, name: &Name) -> TypeLookup {
        // Type parameters shadow library-level names.
        if let Some(owner) = self.owner {
            if let Some(index) = self.store.class(owner).type_param_index(name) {
                return TypeLookup::TypeParameter(TypeParameterId::new(owner, index));
            }
        }

        if let Some(class) = self.store.class_in_library(self.library, name) {
            return TypeLookup::Class(class);
        }

        // Private names do not travel across library boundaries.
        if !name.is_private() {
            for &import in &self.store.library(self.library).imports {
                if let Some(class) = self.store.class_in_library(import, name) {
                    return TypeLookup::Class(class);
                }
            }
        }

        TypeLookup::NotFound
    }

    fn resolve_prefixed(&self, prefix: &Name, name: &Name) -> TypeLookup {
        let Some(&target) = self.store.library(self.library).prefixes.get(prefix) else {
            return TypeLookup::NotAPrefix;
        };
        if name.is_private() {
            return TypeLookup::NotFound;
        }
        match self.store.class_in_library(target, name) {
            Some(class) => TypeLookup::Class(class),
            None => TypeLookup::NotFound,
        }
    }
}
