//! Sink for feature registrations and constructor-attached errors.

use lumen_core::ClassId;
use lumen_types::Diagnostic;

/// Capabilities the compiled program may need at runtime, discovered during
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// An erroneous synthesized constructor was installed; invoking it throws
    /// a no-such-method error.
    ThrowNoSuchMethod,
}

/// Sink consumed by the resolver. Downstream phases (codegen, reporting on
/// use sites) read what was registered here.
pub trait Registry {
    fn register_feature(&mut self, feature: Feature);

    /// Attach a compile-time error to a synthesized constructor of `class` so
    /// later phases see it at the synthesis point.
    fn register_constructor_error(&mut self, class: ClassId, diagnostic: Diagnostic);
}

/// Discards every registration.
#[derive(Debug, Default)]
pub struct NullRegistry;

impl Registry for NullRegistry {
    fn register_feature(&mut self, _feature: Feature) {}

    fn register_constructor_error(&mut self, _class: ClassId, _diagnostic: Diagnostic) {}
}

/// Records registrations, for drivers and tests.
#[derive(Debug, Default)]
pub struct CollectingRegistry {
    pub features: Vec<Feature>,
    pub constructor_errors: Vec<(ClassId, Diagnostic)>,
}

impl Registry for CollectingRegistry {
    fn register_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    fn register_constructor_error(&mut self, class: ClassId, diagnostic: Diagnostic) {
        self.constructor_errors.push((class, diagnostic));
    }
}
