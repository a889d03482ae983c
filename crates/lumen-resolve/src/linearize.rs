//! Construction of the ordered set of all supertypes of a class.

use std::collections::HashSet;

use lumen_core::ClassId;
use lumen_types::{ClassStore, InterfaceType};

/// Compute the linearization of `class`: itself, its direct supertype, its
/// direct interfaces in declaration order, then the recursive linearizations
/// of the supertype and of each interface, each substituted into the
/// referring instantiation's type arguments.
///
/// Each class identity appears once; the first (most specific) instantiation
/// encountered wins. The root is withheld while accumulating and appended
/// exactly once at the end.
///
/// Callers guarantee the direct supertype and interfaces are resolved; a
/// dependency whose own linearization is absent (a hierarchy the loader cut)
/// contributes nothing beyond itself.
pub(crate) fn linearize(store: &ClassStore, class: ClassId) -> Vec<InterfaceType> {
    let object = store.core().object;
    if class == object {
        return vec![store.this_type(object)];
    }

    let mut builder = LinearizationBuilder::new(object, store.this_type(class));

    let def = store.class(class);
    let direct: Vec<InterfaceType> = def
        .supertype
        .iter()
        .chain(def.interfaces.iter())
        .cloned()
        .collect();

    for ty in &direct {
        builder.add(ty.clone());
    }
    for ty in &direct {
        let Some(all) = store.class(ty.class).all_supertypes.as_ref() else {
            continue;
        };
        for entry in all.iter().skip(1) {
            builder.add(entry.substitute(ty.class, &ty.args));
        }
    }

    builder.finish()
}

/// Accumulates insertion order while a separate set deduplicates by class
/// identity.
struct LinearizationBuilder {
    object: ClassId,
    order: Vec<InterfaceType>,
    seen: HashSet<ClassId>,
}

impl LinearizationBuilder {
    fn new(object: ClassId, this_type: InterfaceType) -> Self {
        let mut seen = HashSet::new();
        seen.insert(this_type.class);
        Self {
            object,
            order: vec![this_type],
            seen,
        }
    }

    fn add(&mut self, ty: InterfaceType) {
        if ty.class == self.object {
            return;
        }
        if self.seen.insert(ty.class) {
            self.order.push(ty);
        }
    }

    fn finish(mut self) -> Vec<InterfaceType> {
        self.order.push(InterfaceType::new(self.object, Vec::new()));
        self.order
    }
}
