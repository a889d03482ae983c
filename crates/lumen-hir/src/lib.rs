//! Parse-tree declarations consumed by the hierarchy resolver.
//!
//! This crate is the read-only view the resolver has of a parsed program:
//! class-like declarations with their clauses, constructors distinguished
//! from other members, and span-carrying type annotations. Bodies are opaque.

pub mod item_tree;

pub use item_tree::{
    ClassDecl, ConstructorDecl, DeclKind, Import, LibraryKind, LibraryTree, Member, ParamDecl,
    Program, TypeParamDecl, TypeRef,
};
