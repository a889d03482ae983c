//! Construction of the class-record store from a parsed program.

use std::collections::HashMap;

use lumen_core::{ClassId, LibraryId, Name};
use lumen_hir::{DeclKind, Program};
use lumen_types::{
    ClassDef, ClassKind, ClassStore, ConstructorDef, ConstructorOrigin, CoreTypes, LibraryDef,
    LibraryKind, ParamDef, TypeParamDef,
};

use crate::driver::HierarchyError;

/// Build one unresolved [`ClassDef`] per declaration, wire the library
/// scopes, and locate the core types. First declaration wins in every name
/// table; import resolution proper is a collaborator's job, so unknown
/// import targets are skipped.
pub(crate) fn build_store(program: &Program) -> Result<ClassStore, HierarchyError> {
    let mut store = ClassStore::new();

    let mut libraries_by_name: HashMap<Name, LibraryId> = HashMap::new();
    for tree in &program.libraries {
        let id = store.alloc_library(LibraryDef::new(tree.name.clone(), tree.kind));
        libraries_by_name.entry(tree.name.clone()).or_insert(id);
    }

    for (library_index, tree) in program.libraries.iter().enumerate() {
        let library = LibraryId::from_raw(library_index as u32);
        for (class_index, decl) in tree.classes.iter().enumerate() {
            let kind = match decl.kind {
                DeclKind::Class => ClassKind::Regular,
                DeclKind::Enum => ClassKind::Enum,
                DeclKind::NamedMixinApplication => ClassKind::NamedMixinApplication,
            };
            let mut def = ClassDef::new(decl.name.clone(), library, kind);
            def.origin = Some((library, class_index as u32));
            def.type_params = decl
                .type_params
                .iter()
                .map(|tp| TypeParamDef::new(tp.name.clone(), tp.name_range))
                .collect();
            def.constructors = decl
                .constructors()
                .map(|ctor| ConstructorDef {
                    name: ctor.name.clone(),
                    is_factory: ctor.is_factory,
                    is_const: ctor.is_const,
                    origin: ConstructorOrigin::Declared,
                    params: ctor
                        .params
                        .iter()
                        .map(|p| ParamDef::new(p.name.clone(), p.kind))
                        .collect(),
                    super_target: None,
                })
                .collect();

            let id = store.alloc_class(def);
            store
                .library_mut(library)
                .classes_by_name
                .entry(decl.name.clone())
                .or_insert(id);
        }
    }

    let core_library = store
        .library_ids()
        .find(|&id| store.library(id).is_core())
        .ok_or(HierarchyError::MissingCoreLibrary)?;

    for (library_index, tree) in program.libraries.iter().enumerate() {
        let library = LibraryId::from_raw(library_index as u32);
        for import in &tree.imports {
            let Some(&target) = libraries_by_name.get(&import.library) else {
                continue;
            };
            match &import.prefix {
                Some(prefix) => {
                    store
                        .library_mut(library)
                        .prefixes
                        .entry(prefix.clone())
                        .or_insert(target);
                }
                None => store.library_mut(library).imports.push(target),
            }
        }
        // Every user library sees the core library, last so explicit imports
        // shadow it.
        if tree.kind == LibraryKind::User
            && !store.library(library).imports.contains(&core_library)
        {
            store.library_mut(library).imports.push(core_library);
        }
    }

    let core = CoreTypes {
        object: core_class(&store, core_library, "Object")?,
        bool_type: core_class(&store, core_library, "bool")?,
        num_type: core_class(&store, core_library, "num")?,
        int_type: core_class(&store, core_library, "int")?,
        double_type: core_class(&store, core_library, "double")?,
        string_type: core_class(&store, core_library, "String")?,
        null_type: core_class(&store, core_library, "Null")?,
    };
    store.set_core(core);

    Ok(store)
}

fn core_class(
    store: &ClassStore,
    core_library: LibraryId,
    name: &'static str,
) -> Result<ClassId, HierarchyError> {
    store
        .class_in_library(core_library, &Name::new(name))
        .ok_or(HierarchyError::MissingCoreType(name))
}
