//! Item type catalogue for the snapnet codec.
//!
//! This crate defines the fixed set of item types a snapshot can carry:
//! - Identity types ([`TypeId`], [`ItemId`], [`ItemKey`])
//! - Item definitions with named i32 fields ([`ItemDef`], [`Directory`])
//! - Deterministic directory hashing ([`directory_hash`])
//!
//! # Design Principles
//!
//! - **Pure data** - Lookup and validation only; field interpretation
//!   (fixed-point, bitmasks, enums) belongs to callers.
//! - **Read-only after startup** - A validated `Directory` never mutates and
//!   is safe to share across threads.
//! - **Deterministic hashing** - The directory hash is stable given the same
//!   definition and is embedded in every payload to detect divergence.

mod directory;
mod error;
mod hash;
mod types;

pub use directory::{Directory, DirectoryBuilder, ItemDef};
pub use error::{DirectoryError, DirectoryResult};
pub use hash::directory_hash;
pub use types::{ItemId, ItemKey, TypeId};

/// Upper bound on fields per item type.
pub const MAX_FIELDS_PER_ITEM: usize = 64;
