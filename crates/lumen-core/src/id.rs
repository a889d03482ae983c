//! Strongly-typed IDs used across Lumen.
//!
//! These are `#[repr(transparent)]` newtypes around `u32` to keep them cheap and
//! type-safe.

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self::from_raw(raw)
            }

            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn to_raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(LibraryId);
define_id!(ClassId);
