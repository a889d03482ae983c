//! Expansion of mixin clauses into chains of synthetic intermediate classes.
//!
//! `S with M1, M2` becomes `S -> _S&M1 -> _S&M1&M2`; for a named application
//! `class N = S with M1, M2;` the user's class is the final link, so the
//! chain is `S -> _S&M1 -> N` with `N.mixin = M2`. Each link is created,
//! filled, and linearized on the spot — its superclass is always already
//! resolved.
//!
//! Two strategies produce the links. The default gives every link its own
//! class whose type parameters mirror the declaring class's. The sharing
//! strategy interns links per library under a structural signature so that
//! equal applications reuse one class; it is an optimization only, both
//! strategies yield hierarchies with the same observable semantics.

use std::collections::{HashMap, HashSet};

use lumen_core::{ClassId, Name};
use lumen_hir::{ClassDecl, DeclKind, TypeRef};
use lumen_types::{
    ClassDef, ClassKind, ClassStore, ConstructorDef, ConstructorOrigin, InterfaceType, Phase,
    Span, Type, TypeParamDef,
};

use crate::diagnostics::illegal_mixin_cycle_diagnostic;
use crate::driver::{constructor_accessible, ResolveContext};
use crate::linearize;
use crate::resolver::{self, UseSite};

pub(crate) fn apply_mixin_clause(cx: &mut ResolveContext<'_>, class: ClassId, decl: &ClassDecl) {
    debug_assert!(!decl.mixins.is_empty(), "mixin clause with no mixins");
    let named = decl.kind == DeclKind::NamedMixinApplication;

    let base = match &decl.extends {
        Some(node) => match resolver::resolve_and_validate(cx, class, node, UseSite::Extends) {
            Some(ty) => ty,
            None => {
                let object = cx.store.core().object;
                resolver::ensure_resolved(cx, object);
                cx.store.object_type()
            }
        },
        None => {
            let default = cx.backend.default_superclass(cx.store, class);
            resolver::ensure_resolved(cx, default);
            resolver::raw_instantiation(cx.store, default)
        }
    };

    let mut state = ShareState::new(class, cx.config.share_mixin_applications);
    if state.active {
        state.base_indices = state.interner.push_list(&base.args);
    }

    let mut current = base;
    for (index, node) in decl.mixins.iter().enumerate() {
        if named && index + 1 == decl.mixins.len() {
            // The user's named class occupies the final slot of the chain.
            install_named_application(cx, class, current, node);
            return;
        }
        current = expand_link(cx, class, current, node, index, &mut state);
    }

    // Anonymous application: the chain end becomes the declaring class's
    // supertype. The declaring class itself is not a mixin application.
    install_supertype(cx, class, current);
}

/// The loader's cycle breaking may have installed the root already; it wins
/// over the chain end.
fn install_supertype(cx: &mut ResolveContext<'_>, class: ClassId, supertype: InterfaceType) {
    if cx.store.class(class).supertype.is_none() {
        cx.store.class_mut(class).set_supertype(supertype);
    }
}

fn install_named_application(
    cx: &mut ResolveContext<'_>,
    class: ClassId,
    supertype: InterfaceType,
    node: &TypeRef,
) {
    let super_class = supertype.class;
    install_supertype(cx, class, supertype);

    match resolver::resolve_and_validate(cx, class, node, UseSite::Mixin) {
        Some(mixin) => {
            if check_for_mixin_cycle(cx, class, &mixin, node.range) {
                return;
            }
            cx.store.class_mut(class).mixin = Some(mixin.clone());
            // Instances of the application satisfy the mixin's interface;
            // declared `implements` entries follow it.
            cx.store.class_mut(class).interfaces.push(mixin);
            add_forwarding_constructors(cx, class, super_class);
        }
        None => {
            cx.store.class_mut(class).has_incomplete_hierarchy = true;
        }
    }
}

/// Create (or, when sharing, reuse) the intermediate for one `with` entry and
/// return its instantiation in the declaring class's parameter space.
fn expand_link(
    cx: &mut ResolveContext<'_>,
    enclosing: ClassId,
    current: InterfaceType,
    node: &TypeRef,
    index: usize,
    state: &mut ShareState,
) -> InterfaceType {
    match resolver::resolve_and_validate(cx, enclosing, node, UseSite::Mixin) {
        None => {
            // An invalid mixin poisons sharing for the rest of the chain; the
            // truncated link must stay unique to this class.
            state.active = false;
            expand_unshared_link(cx, enclosing, current, None, node)
        }
        Some(mixin) if state.active => expand_shared_link(cx, enclosing, current, mixin, node, index, state),
        Some(mixin) => expand_unshared_link(cx, enclosing, current, Some(mixin), node),
    }
}

fn expand_unshared_link(
    cx: &mut ResolveContext<'_>,
    enclosing: ClassId,
    current: InterfaceType,
    mixin: Option<InterfaceType>,
    node: &TypeRef,
) -> InterfaceType {
    let library = cx.store.class(enclosing).library;
    let mixin_name = match &mixin {
        Some(m) => cx.store.class(m.class).name.clone(),
        None => node.name.clone(),
    };
    let name = application_name(cx.store, current.class, &mixin_name);

    let mut def = ClassDef::new(name, library, ClassKind::SyntheticMixinApplication);
    // The link's parameters mirror the declaring class's, renamed to fresh
    // identities.
    def.type_params = cx.store.class(enclosing).type_params.clone();
    def.load_state = Phase::Done;
    def.resolution_state = Phase::Started;
    let link = cx.store.alloc_class(def);

    let renamed_bounds: Vec<Type> = cx
        .store
        .class(link)
        .type_params
        .iter()
        .map(|tp| tp.bound.rename_type_variables(enclosing, link))
        .collect();
    for (param, bound) in cx
        .store
        .class_mut(link)
        .type_params
        .iter_mut()
        .zip(renamed_bounds)
    {
        param.bound = bound;
    }

    let link_supertype = current.rename_type_variables(enclosing, link);
    cx.store.class_mut(link).set_supertype(link_supertype);

    match mixin {
        Some(m) if !check_for_mixin_cycle(cx, link, &m, node.range) => {
            let m = m.rename_type_variables(enclosing, link);
            cx.store.class_mut(link).mixin = Some(m.clone());
            cx.store.class_mut(link).interfaces.push(m);
            add_forwarding_constructors(cx, link, current.class);
        }
        _ => {
            cx.store.class_mut(link).has_incomplete_hierarchy = true;
        }
    }

    finish_link(cx, link);
    let args = cx.store.this_type(enclosing).args;
    InterfaceType::new(link, args)
}

fn expand_shared_link(
    cx: &mut ResolveContext<'_>,
    enclosing: ClassId,
    current: InterfaceType,
    mixin: InterfaceType,
    node: &TypeRef,
    index: usize,
    state: &mut ShareState,
) -> InterfaceType {
    let mixin_indices = state.interner.push_list(&mixin.args);
    let mixin_name = cx.store.class(mixin.class).name.clone();
    let name = application_name(cx.store, current.class, &mixin_name);
    let key = format!("{}{}", name, state.interner.signature());
    let library = cx.store.class(enclosing).library;

    if let Some(&existing) = cx.store.library(library).mixin_applications.get(&key) {
        return InterfaceType::new(existing, state.interner.representatives());
    }

    let mut def = ClassDef::new(name, library, ClassKind::SyntheticMixinApplication);
    // The link's parameters are the distinct free variables of its supertype
    // and mixin, in first-appearance order.
    def.type_params = state
        .interner
        .tokens()
        .iter()
        .map(|token| TypeParamDef::new(token.text.as_str(), Span::new(0, 0)))
        .collect();
    def.load_state = Phase::Done;
    def.resolution_state = Phase::Started;
    let link = cx.store.alloc_class(def);
    cx.store
        .library_mut(library)
        .mixin_applications
        .insert(key, link);

    // The previous link's parameters are a prefix of this link's; the base
    // supertype instead maps each of its arguments to the token it emitted.
    let link_supertype = if index == 0 {
        InterfaceType::new(
            current.class,
            state
                .base_indices
                .iter()
                .map(|&token| Type::type_variable(link, token))
                .collect(),
        )
    } else {
        let prev_params = cx.store.class(current.class).type_params.len() as u32;
        InterfaceType::new(
            current.class,
            (0..prev_params)
                .map(|token| Type::type_variable(link, token))
                .collect(),
        )
    };
    cx.store.class_mut(link).set_supertype(link_supertype);

    if check_for_mixin_cycle(cx, link, &mixin, node.range) {
        cx.store.class_mut(link).has_incomplete_hierarchy = true;
    } else {
        let link_mixin = InterfaceType::new(
            mixin.class,
            mixin_indices
                .iter()
                .map(|&token| Type::type_variable(link, token))
                .collect(),
        );
        cx.store.class_mut(link).mixin = Some(link_mixin.clone());
        cx.store.class_mut(link).interfaces.push(link_mixin);
        add_forwarding_constructors(cx, link, current.class);
    }

    finish_link(cx, link);
    InterfaceType::new(link, state.interner.representatives())
}

fn finish_link(cx: &mut ResolveContext<'_>, link: ClassId) {
    resolver::propagate_incomplete_hierarchy(cx, link);

    // A truncated link carries no forwarders; give it a quiet default so the
    // classes above it do not pile constructor diagnostics onto a hierarchy
    // that is already diagnosed.
    let def = cx.store.class(link);
    if def.has_incomplete_hierarchy && def.constructors.is_empty() {
        let super_target = def.supertype.as_ref().map(|s| s.class);
        cx.store.class_mut(link).constructors.push(ConstructorDef {
            name: Name::empty(),
            is_factory: false,
            is_const: false,
            origin: ConstructorOrigin::Default,
            params: Vec::new(),
            super_target,
        });
    }

    let all = linearize::linearize(cx.store, link);
    cx.store.class_mut(link).set_all_supertypes(all);
    cx.store.class_mut(link).resolution_state = Phase::Done;
}

/// `_S&M1`, `_S&M1&M2`, ... — synthetic supertypes keep growing the same
/// name instead of nesting another underscore.
fn application_name(store: &ClassStore, super_class: ClassId, mixin_name: &Name) -> Name {
    let super_def = store.class(super_class);
    if super_def.kind == ClassKind::SyntheticMixinApplication {
        Name::new(format!("{}&{mixin_name}", super_def.name))
    } else {
        Name::new(format!("_{}&{mixin_name}", super_def.name))
    }
}

/// One forwarder per accessible generative constructor of the superclass,
/// preserving the positional/named parameter structure and const-ness.
fn add_forwarding_constructors(cx: &mut ResolveContext<'_>, target: ClassId, super_class: ClassId) {
    let target_library = cx.store.class(target).library;
    let forwarders: Vec<ConstructorDef> = {
        let super_def = cx.store.class(super_class);
        super_def
            .constructors
            .iter()
            .filter(|ctor| ctor.is_generative())
            .filter(|ctor| constructor_accessible(&ctor.name, super_def.library, target_library))
            .map(|ctor| ConstructorDef {
                name: ctor.name.clone(),
                is_factory: false,
                is_const: ctor.is_const,
                origin: ConstructorOrigin::Forwarding,
                params: ctor.params.clone(),
                super_target: Some(super_class),
            })
            .collect()
    };
    cx.store.class_mut(target).constructors.extend(forwarders);
}

/// Walk the `.mixin` pointers starting from a candidate mixin. Reaching the
/// application under construction is a cycle: reported once here, and the
/// caller leaves the application without a mixin. Reaching some other
/// repeated application terminates silently; that cycle is reported on its
/// own starting member.
fn check_for_mixin_cycle(
    cx: &mut ResolveContext<'_>,
    application: ClassId,
    mixin: &InterfaceType,
    range: Span,
) -> bool {
    let mut seen: HashSet<ClassId> = HashSet::new();
    let mut current = Some(mixin.class);
    while let Some(link) = current {
        if !cx.store.class(link).is_mixin_application() {
            break;
        }
        if link == application {
            let application_name = cx.store.class(application).name.clone();
            let mixin_name = cx.store.class(mixin.class).name.clone();
            cx.diagnostics.push(illegal_mixin_cycle_diagnostic(
                range,
                &mixin_name,
                &application_name,
            ));
            cx.store.class_mut(application).has_incomplete_hierarchy = true;
            return true;
        }
        if !seen.insert(link) {
            break;
        }
        current = cx.store.class(link).mixin.as_ref().map(|m| m.class);
    }
    false
}

// === Structural signatures for the sharing strategy ==========================

struct ShareState {
    active: bool,
    interner: SignatureInterner,
    base_indices: Vec<u32>,
}

impl ShareState {
    fn new(enclosing: ClassId, active: bool) -> Self {
        Self {
            active,
            interner: SignatureInterner::new(enclosing),
            base_indices: Vec::new(),
        }
    }
}

struct SignatureToken {
    text: String,
    /// The argument the token stood for at its first occurrence; shared links
    /// are instantiated with these.
    representative: Type,
}

/// Builds the structural signature of an expansion: the declaring class's
/// parameters emit `#Ti`, raw generics emit a `#Uj` cached per class, every
/// other argument emits a fresh `#Uj`. Argument lists are prefixed with `^`
/// and joined with `&`.
struct SignatureInterner {
    enclosing: ClassId,
    signature: String,
    tokens: Vec<SignatureToken>,
    param_tokens: HashMap<u32, u32>,
    raw_tokens: HashMap<ClassId, u32>,
    fresh: u32,
}

impl SignatureInterner {
    fn new(enclosing: ClassId) -> Self {
        Self {
            enclosing,
            signature: String::new(),
            tokens: Vec::new(),
            param_tokens: HashMap::new(),
            raw_tokens: HashMap::new(),
            fresh: 0,
        }
    }

    fn signature(&self) -> &str {
        &self.signature
    }

    fn tokens(&self) -> &[SignatureToken] {
        &self.tokens
    }

    fn representatives(&self) -> Vec<Type> {
        self.tokens
            .iter()
            .map(|token| token.representative.clone())
            .collect()
    }

    /// Append one argument list to the signature and return the token index
    /// each argument mapped to.
    fn push_list(&mut self, args: &[Type]) -> Vec<u32> {
        if args.is_empty() {
            return Vec::new();
        }
        self.signature.push('^');
        let mut indices = Vec::with_capacity(args.len());
        for (position, arg) in args.iter().enumerate() {
            if position > 0 {
                self.signature.push('&');
            }
            let token = self.token_index(arg);
            self.signature.push_str(&self.tokens[token as usize].text);
            indices.push(token);
        }
        indices
    }

    fn token_index(&mut self, arg: &Type) -> u32 {
        match arg {
            Type::TypeVariable(tv) if tv.class == self.enclosing => {
                if let Some(&token) = self.param_tokens.get(&tv.index) {
                    return token;
                }
                let token = self.push_token(format!("#T{}", tv.index), arg.clone());
                self.param_tokens.insert(tv.index, token);
                token
            }
            Type::Interface(ty) if is_raw_generic(ty) => {
                if let Some(&token) = self.raw_tokens.get(&ty.class) {
                    return token;
                }
                let token = self.push_fresh(arg.clone());
                self.raw_tokens.insert(ty.class, token);
                token
            }
            _ => self.push_fresh(arg.clone()),
        }
    }

    fn push_fresh(&mut self, representative: Type) -> u32 {
        let text = format!("#U{}", self.fresh);
        self.fresh += 1;
        self.push_token(text, representative)
    }

    fn push_token(&mut self, text: String, representative: Type) -> u32 {
        let index = self.tokens.len() as u32;
        self.tokens.push(SignatureToken {
            text,
            representative,
        });
        index
    }
}

/// Resolution normalizes a raw reference to a generic class into an
/// instantiation whose arguments are all `dynamic`.
fn is_raw_generic(ty: &InterfaceType) -> bool {
    !ty.args.is_empty() && ty.args.iter().all(Type::is_dynamic)
}
