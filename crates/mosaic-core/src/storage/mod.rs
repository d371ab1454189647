//! Per-field persistence strategies.
//!
//! Each field type declares a [`StorageKind`]; the strategy for that kind
//! turns get/set/unset requests into store reads and prepared commit ops.
//! Strategies never mutate: writes are staged as ops and applied by the
//! enclosing commit pass, which is how a multi-field save stays atomic.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        commit::CommitOp,
        store::{ExternalKey, Stores},
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    field::descriptor::StorageKind,
    types::{EntityId, Langcode, Truename},
    value::Value,
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// StorageError
///

#[derive(Debug, ThisError)]
pub enum StorageError {
    /// Write or delete against an entity that is not persisted. Fatal to the
    /// operation: there is no row to own the value.
    #[error("storage accessor bound to an invalid entity '{entity_id}'")]
    InvalidEntity { entity_id: EntityId },

    /// Read against an entity that is not persisted. Callers must treat this
    /// as "unset", not as a fault; it guards against reading stale
    /// associations for not-yet-persisted entities.
    #[error("entity '{entity_id}' not found")]
    NotFound { entity_id: EntityId },
}

impl StorageError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidEntity { .. } => ErrorClass::InvariantViolation,
            Self::NotFound { .. } => ErrorClass::NotFound,
        }
    }
}

impl From<StorageError> for InternalError {
    fn from(err: StorageError) -> Self {
        Self::new(err.class(), ErrorOrigin::Storage, err.to_string())
    }
}

///
/// FieldStorage
///
/// Capability set shared by both strategies. `get` distinguishes "value
/// unset" (`Ok(None)`) from "owner entity missing" (`Err(NotFound)`).
///

pub(crate) trait FieldStorage: Sync {
    fn get(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
    ) -> Result<Option<Value>, StorageError>;

    fn prepare_set(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
        value: Value,
    ) -> Result<CommitOp, StorageError>;

    fn prepare_unset(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
    ) -> Result<CommitOp, StorageError>;

    fn search(&self, stores: &Stores, field_id: &Truename, needle: &str) -> Vec<EntityId>;
}

/// The strategy for a storage kind.
pub(crate) fn storage_for(kind: StorageKind) -> &'static dyn FieldStorage {
    match kind {
        StorageKind::Inline => &InlineStorage,
        StorageKind::External => &ExternalStorage,
    }
}

fn require_entity(stores: &Stores, entity_id: &EntityId) -> Result<(), StorageError> {
    if stores.entities.contains_key(entity_id) {
        Ok(())
    } else {
        Err(StorageError::InvalidEntity {
            entity_id: *entity_id,
        })
    }
}

///
/// InlineStorage
///
/// Value lives as a column on the owning entity's own row; the row is
/// language-partitioned, so access is scoped `(entity, field, langcode)`.
///

pub(crate) struct InlineStorage;

impl FieldStorage for InlineStorage {
    fn get(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
    ) -> Result<Option<Value>, StorageError> {
        let row = stores
            .entities
            .get(entity_id)
            .ok_or(StorageError::NotFound {
                entity_id: *entity_id,
            })?;

        Ok(row
            .inline
            .get(&(field_id.clone(), langcode.clone()))
            .cloned())
    }

    fn prepare_set(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
        value: Value,
    ) -> Result<CommitOp, StorageError> {
        require_entity(stores, entity_id)?;

        Ok(CommitOp::PutInline {
            id: *entity_id,
            field_id: field_id.clone(),
            langcode: langcode.clone(),
            value: Some(value),
        })
    }

    fn prepare_unset(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
    ) -> Result<CommitOp, StorageError> {
        require_entity(stores, entity_id)?;

        Ok(CommitOp::PutInline {
            id: *entity_id,
            field_id: field_id.clone(),
            langcode: langcode.clone(),
            value: None,
        })
    }

    fn search(&self, stores: &Stores, field_id: &Truename, needle: &str) -> Vec<EntityId> {
        let mut hits = BTreeSet::new();
        for (id, row) in stores.entities.iter() {
            let matched = row.inline.iter().any(|((f, _), value)| {
                f == field_id && value.as_text().is_some_and(|s| s.contains(needle))
            });
            if matched {
                hits.insert(*id);
            }
        }

        hits.into_iter().collect()
    }
}

///
/// ExternalStorage
///
/// Value lives in a dedicated table keyed by the owning entity's locator plus
/// langcode. `set` is an upsert; `search` has no text index and reports no
/// matches.
///

pub(crate) struct ExternalStorage;

impl ExternalStorage {
    fn key(entity_id: &EntityId, field_id: &Truename, langcode: &Langcode) -> ExternalKey {
        ExternalKey {
            field_id: field_id.clone(),
            entity_id: *entity_id,
            langcode: langcode.clone(),
        }
    }
}

impl FieldStorage for ExternalStorage {
    fn get(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
    ) -> Result<Option<Value>, StorageError> {
        if !stores.entities.contains_key(entity_id) {
            return Err(StorageError::NotFound {
                entity_id: *entity_id,
            });
        }

        Ok(stores
            .external
            .get(&Self::key(entity_id, field_id, langcode))
            .cloned())
    }

    fn prepare_set(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
        value: Value,
    ) -> Result<CommitOp, StorageError> {
        require_entity(stores, entity_id)?;

        Ok(CommitOp::PutExternal {
            key: Self::key(entity_id, field_id, langcode),
            value: Some(value),
        })
    }

    fn prepare_unset(
        &self,
        stores: &Stores,
        entity_id: &EntityId,
        field_id: &Truename,
        langcode: &Langcode,
    ) -> Result<CommitOp, StorageError> {
        require_entity(stores, entity_id)?;

        Ok(CommitOp::PutExternal {
            key: Self::key(entity_id, field_id, langcode),
            value: None,
        })
    }

    fn search(&self, _stores: &Stores, _field_id: &Truename, _needle: &str) -> Vec<EntityId> {
        // no text index over the dedicated tables; fields of this kind are
        // not searchable
        Vec::new()
    }
}
