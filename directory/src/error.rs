//! Directory validation errors.

use std::fmt;

use crate::TypeId;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors that can occur when building or validating a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The same type id was defined twice.
    DuplicateTypeId { id: TypeId },

    /// An item type declared no fields.
    NoFields { id: TypeId },

    /// An item type declared more fields than the wire format allows.
    TooManyFields { id: TypeId, count: usize },

    /// An item type or field was given an empty name.
    EmptyName { id: TypeId },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTypeId { id } => write!(f, "duplicate {id} in directory"),
            Self::NoFields { id } => write!(f, "{id} declares no fields"),
            Self::TooManyFields { id, count } => {
                write!(f, "{id} declares {count} fields, over the limit")
            }
            Self::EmptyName { id } => write!(f, "{id} has an empty name"),
        }
    }
}

impl std::error::Error for DirectoryError {}
