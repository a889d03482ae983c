//! Shared name type.

use smol_str::SmolStr;

/// A lightweight owned identifier.
///
/// This is backed by [`smol_str::SmolStr`], which stores short strings inline
/// and avoids heap allocation in many common cases.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Name(SmolStr);

impl Name {
    #[inline]
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Self(text.into())
    }

    /// The empty name, used for unnamed constructors.
    #[inline]
    pub fn empty() -> Self {
        Self(SmolStr::default())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Library-private names start with an underscore.
    #[inline]
    pub fn is_private(&self) -> bool {
        self.0.starts_with('_')
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Name").field(&self.0.as_str()).finish()
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
