//! Handles into a [`crate::program::Program`]'s entity tables.
//!
//! Entities reference each other (parent/children, callers/callees, the confirmed match)
//! through these `Copy` handles instead of owning pointers, so the cyclic reference graph has
//! a single owner. A handle is only meaningful for the program that issued it.

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                // Entity tables are bounded by the u16 counts of a classfile times the class count
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            /// Position of the entity in its program table.
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Handle of a [`crate::program::ClassEntity`]
    ClassId,
    "c"
);
entity_id!(
    /// Handle of a [`crate::program::MethodEntity`]
    MethodId,
    "m"
);
entity_id!(
    /// Handle of a [`crate::program::FieldEntity`]
    FieldId,
    "f"
);

/// A handle to any matchable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    /// A class
    Class(ClassId),
    /// A method
    Method(MethodId),
    /// A field
    Field(FieldId),
}

impl From<ClassId> for EntityRef {
    fn from(id: ClassId) -> Self {
        EntityRef::Class(id)
    }
}

impl From<MethodId> for EntityRef {
    fn from(id: MethodId) -> Self {
        EntityRef::Method(id)
    }
}

impl From<FieldId> for EntityRef {
    fn from(id: FieldId) -> Self {
        EntityRef::Field(id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Class(id) => id.fmt(f),
            EntityRef::Method(id) => id.fmt(f),
            EntityRef::Field(id) => id.fmt(f),
        }
    }
}
