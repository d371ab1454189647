//! Multilingual value resolution.
//!
//! Every field read goes through the same two-level fallback regardless of
//! storage kind: requested language, then the entity's original language,
//! then the field's configured default.

use crate::{
    db::store::Stores,
    field::definition::ResolvedField,
    storage::{StorageError, storage_for},
    types::{EntityId, Langcode},
    value::Value,
};

/// Resolve one field's value for a requested language.
///
/// A missing owner entity reads as "value absent" (the store guard is a
/// recoverable miss on the read path), so resolution falls through to the
/// field default just as an unset value would.
pub(crate) fn resolve_value(
    stores: &Stores,
    field: &ResolvedField,
    entity_id: &EntityId,
    entity_langcode: &Langcode,
    requested: Option<&Langcode>,
) -> Option<Value> {
    let storage = storage_for(field.storage_kind);
    let langcode = requested.unwrap_or(entity_langcode);

    match storage.get(stores, entity_id, &field.field_id, langcode) {
        Ok(Some(value)) => return Some(value),
        Ok(None) | Err(StorageError::NotFound { .. } | StorageError::InvalidEntity { .. }) => {}
    }

    if langcode != entity_langcode {
        if let Ok(Some(value)) = storage.get(stores, entity_id, &field.field_id, entity_langcode) {
            return Some(value);
        }
    }

    field.default.clone()
}
