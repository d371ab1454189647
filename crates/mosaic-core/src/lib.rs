//! Core runtime for Mosaic: the dynamic entity–field storage engine and the
//! hierarchical catalog tree it depends on.
//!
//! The engine lets administrators define arbitrary typed fields per entity
//! mold at runtime, stores and retrieves each field's value per language with
//! fallback semantics, and maintains a mutable forest of catalog nodes with
//! materialized ancestor paths. All writes flow through a prepare/apply
//! commit pass so a multi-field save, a cascading delete, or a subtree move
//! lands atomically or not at all.
#![warn(unreachable_pub)]

pub mod catalog;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod field;
pub(crate) mod i18n;
pub mod mold;
pub mod storage;
pub mod types;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum length for truenames (mold, field, and catalog identifiers).
pub const MAX_TRUENAME_LEN: usize = 64;

/// Maximum length for langcode identifiers.
pub const MAX_LANGCODE_LEN: usize = 12;

/// Maximum number of fields a single mold may carry.
///
/// This bounds resolved-field cache entries and keeps attribute gathering
/// within a predictable envelope.
pub const MAX_MOLD_FIELDS: usize = 64;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, or commit internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        catalog::CatalogNode,
        db::Db,
        entity::{Attributes, PositionUpdate, SaveRequest},
        field::{
            definition::{FieldDefinition, ResolvedField},
            descriptor::{FieldTypeDescriptor, StorageKind},
            registry::FieldTypeRegistry,
        },
        mold::EntityMold,
        types::{EntityId, Langcode, Truename},
        value::{Value, ValueKind},
    };
}
