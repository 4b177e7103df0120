//! Item type definitions and validation.

use std::collections::HashSet;

use crate::error::{DirectoryError, DirectoryResult};
use crate::{TypeId, MAX_FIELDS_PER_ITEM};

/// Definition of one item type: a name and an ordered list of named fields.
///
/// Fields are raw 32-bit signed integers on the wire; what a field means
/// (fixed-point, bitmask, enum) belongs to the caller, not to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDef {
    pub type_id: TypeId,
    pub name: String,
    pub fields: Vec<String>,
}

impl ItemDef {
    /// Creates a definition with no fields.
    #[must_use]
    pub fn new(type_id: TypeId, name: &str) -> Self {
        Self {
            type_id,
            name: name.to_owned(),
            fields: Vec::new(),
        }
    }

    /// Creates a definition with the provided field names.
    #[must_use]
    pub fn with_fields(type_id: TypeId, name: &str, fields: &[&str]) -> Self {
        Self {
            type_id,
            name: name.to_owned(),
            fields: fields.iter().map(|&f| f.to_owned()).collect(),
        }
    }

    /// Adds a field to the definition.
    #[must_use]
    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(name.to_owned());
        self
    }
}

/// The fixed catalogue of item types both peers agree on.
///
/// Read-only after construction; definition order is part of the identity
/// hashed by [`directory_hash`](crate::directory_hash).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Directory {
    defs: Vec<ItemDef>,
}

impl Directory {
    /// Creates a directory from definitions after validation.
    pub fn new(defs: Vec<ItemDef>) -> DirectoryResult<Self> {
        let directory = Self { defs };
        directory.validate()?;
        Ok(directory)
    }

    /// Creates a directory builder.
    #[must_use]
    pub fn builder() -> DirectoryBuilder {
        DirectoryBuilder { defs: Vec::new() }
    }

    /// Returns the definition for a type, if catalogued.
    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<&ItemDef> {
        self.defs.iter().find(|def| def.type_id == type_id)
    }

    /// Returns the field count for a type, if catalogued.
    #[must_use]
    pub fn field_count(&self, type_id: TypeId) -> Option<usize> {
        self.get(type_id).map(|def| def.fields.len())
    }

    /// Returns all definitions in declaration order.
    #[must_use]
    pub fn defs(&self) -> &[ItemDef] {
        &self.defs
    }

    /// Validates directory invariants.
    pub fn validate(&self) -> DirectoryResult<()> {
        let mut seen = HashSet::new();
        for def in &self.defs {
            if !seen.insert(def.type_id) {
                return Err(DirectoryError::DuplicateTypeId { id: def.type_id });
            }
            if def.name.is_empty() || def.fields.iter().any(String::is_empty) {
                return Err(DirectoryError::EmptyName { id: def.type_id });
            }
            if def.fields.is_empty() {
                return Err(DirectoryError::NoFields { id: def.type_id });
            }
            if def.fields.len() > MAX_FIELDS_PER_ITEM {
                return Err(DirectoryError::TooManyFields {
                    id: def.type_id,
                    count: def.fields.len(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`Directory`].
#[derive(Debug, Default)]
pub struct DirectoryBuilder {
    defs: Vec<ItemDef>,
}

impl DirectoryBuilder {
    /// Adds an item type definition.
    #[must_use]
    pub fn item(mut self, def: ItemDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Builds the directory after validation.
    pub fn build(self) -> DirectoryResult<Directory> {
        Directory::new(self.defs)
    }
}
