//! Entity read and write paths.
//!
//! A save validates every supplied raw value against the field's rule set
//! first, accumulating a field -> message-list map; only after everything
//! validates does the batch of field writes, tag writes, and position writes
//! commit, inside one exclusive store pass. A partial write where only some
//! fields persist cannot occur.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        Db,
        commit::{CommitBatch, CommitOp},
        store::{EntityRow, Stores},
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    field::definition::ResolvedField,
    field::rules::check_value,
    i18n,
    mold::MoldError,
    storage::{StorageError, storage_for},
    types::{EntityId, EntityIdError, Langcode, Truename},
    value::Value,
};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;
use tracing::debug;

/// Flat field-id -> raw-value map supplied by the request-shaping layer.
pub type RawInput = BTreeMap<String, serde_json::Value>;

/// Gathered attribute map handed to the templating collaborator. Keyed by
/// field id plus the synthetic `id`, `mold_id`, `tags`, and `positions`
/// entries; insertion order is the documented merge order.
pub type Attributes = IndexMap<String, serde_json::Value>;

///
/// PositionUpdate
///
/// Partial updates apply only the given diffs; a full update (create)
/// replaces the whole position set. The two modes are deliberately distinct.
///

#[derive(Clone, Debug)]
pub enum PositionUpdate {
    Diff {
        add: Vec<Truename>,
        remove: Vec<Truename>,
    },
    Replace(Vec<Truename>),
}

///
/// SaveRequest
///
/// One unit of work against an entity: field values, optional tag list,
/// optional position change, and an optional langcode for translation-mode
/// edits (values written under that language, the entity row untouched).
///

#[derive(Clone, Debug, Default)]
pub struct SaveRequest {
    pub values: RawInput,
    pub tags: Option<Vec<String>>,
    pub positions: Option<PositionUpdate>,
    pub langcode: Option<Langcode>,
}

impl SaveRequest {
    #[must_use]
    pub fn with_values(values: RawInput) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn positions(mut self, positions: PositionUpdate) -> Self {
        self.positions = Some(positions);
        self
    }

    #[must_use]
    pub fn translate_to(mut self, langcode: Langcode) -> Self {
        self.langcode = Some(langcode);
        self
    }
}

///
/// ValidationError
///
/// Per-field message map. Recovered locally: the operation aborts with no
/// partial write, and the map goes back to the caller as structured field
/// errors. Never a system fault.
///

#[derive(Debug, ThisError)]
#[error("validation failed for {} field(s)", errors.len())]
pub struct ValidationError {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl From<ValidationError> for InternalError {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Entity, err.to_string())
    }
}

///
/// EntityError
///

#[derive(Debug, ThisError)]
pub enum EntityError {
    #[error("entity '{entity_id}' does not exist")]
    InvalidEntity { entity_id: EntityId },

    #[error("unknown catalog node '{catalog_id}'")]
    UnknownCatalog { catalog_id: Truename },

    #[error("langcode '{langcode}' is not configured")]
    UnknownLangcode { langcode: Langcode },

    #[error(transparent)]
    Id(#[from] EntityIdError),

    #[error(transparent)]
    Mold(#[from] MoldError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EntityError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidEntity { .. } | Self::UnknownCatalog { .. } => ErrorClass::NotFound,
            Self::UnknownLangcode { .. } => ErrorClass::Validation,
            Self::Id(_) => ErrorClass::Internal,
            Self::Mold(err) => err.class(),
            Self::Storage(err) => err.class(),
            Self::Validation(_) => ErrorClass::Validation,
        }
    }
}

impl From<EntityError> for InternalError {
    fn from(err: EntityError) -> Self {
        Self::new(err.class(), ErrorOrigin::Entity, err.to_string())
    }
}

/// Staged write for one field after validation: set a coerced value or unset.
enum StagedWrite {
    Set(Value),
    Unset,
}

impl Db {
    /// Create a new entity of a mold, validating and writing the whole
    /// request as one atomic unit.
    pub fn create_entity(
        &self,
        mold_id: &Truename,
        langcode: &Langcode,
        request: &SaveRequest,
    ) -> Result<EntityId, EntityError> {
        if !self.config().knows_langcode(langcode) {
            return Err(EntityError::UnknownLangcode {
                langcode: langcode.clone(),
            });
        }

        let id = EntityId::generate()?;

        self.write(|stores| {
            let fields = self.mold_fields_in(stores, mold_id, None)?;
            let staged = validate_values(&fields, &request.values, false)?;
            let positions = stage_positions(stores, None, request.positions.as_ref())?;

            // the row lands first so the field strategies see their owner
            let now = Self::now();
            let mut head = CommitBatch::new();
            head.push(CommitOp::PutEntity {
                id,
                row: EntityRow {
                    mold_id: mold_id.clone(),
                    langcode: langcode.clone(),
                    created_at: now,
                    updated_at: now,
                    inline: BTreeMap::new(),
                },
            });
            head.apply(stores);

            let mut batch = CommitBatch::new();
            for (field, write) in staged {
                batch.push(stage_field_write(stores, &id, &field, langcode, write)?);
            }
            if let Some(tags) = &request.tags {
                batch.push(CommitOp::PutTags {
                    id,
                    tags: tags.iter().cloned().collect(),
                });
            }
            if let Some(positions) = positions {
                batch.push(CommitOp::PutPositions { id, positions });
            }

            debug!(entity = %id, mold = %mold_id, ops = batch.len(), "entity created");
            batch.apply(stores);

            Ok(id)
        })
    }

    /// Update an existing entity. Only fields present in the raw input are
    /// touched; a JSON `null` unsets the field in the target language.
    pub fn update_entity(&self, id: &EntityId, request: &SaveRequest) -> Result<(), EntityError> {
        if let Some(langcode) = &request.langcode {
            if !self.config().knows_langcode(langcode) {
                return Err(EntityError::UnknownLangcode {
                    langcode: langcode.clone(),
                });
            }
        }

        self.write(|stores| {
            let row = stores
                .entities
                .get(id)
                .ok_or(EntityError::InvalidEntity { entity_id: *id })?;
            let mold_id = row.mold_id.clone();
            let target_lang = request.langcode.clone().unwrap_or_else(|| row.langcode.clone());

            let fields = self.mold_fields_in(stores, &mold_id, None)?;
            let staged = validate_values(&fields, &request.values, true)?;
            let positions = stage_positions(stores, Some(id), request.positions.as_ref())?;

            let mut batch = CommitBatch::new();
            for (field, write) in staged {
                batch.push(stage_field_write(stores, id, &field, &target_lang, write)?);
            }
            if let Some(tags) = &request.tags {
                batch.push(CommitOp::PutTags {
                    id: *id,
                    tags: tags.iter().cloned().collect(),
                });
            }
            if let Some(positions) = positions {
                batch.push(CommitOp::PutPositions {
                    id: *id,
                    positions,
                });
            }
            batch.push(CommitOp::TouchEntity {
                id: *id,
                at: Self::now(),
            });

            debug!(entity = %id, lang = %target_lang, ops = batch.len(), "entity updated");
            batch.apply(stores);

            Ok(())
        })
    }

    /// Gather the full attribute map for one entity in one language.
    pub fn gather(
        &self,
        id: &EntityId,
        langcode: Option<&Langcode>,
    ) -> Result<Attributes, EntityError> {
        self.read(|stores| {
            let row = stores
                .entities
                .get(id)
                .ok_or(EntityError::InvalidEntity { entity_id: *id })?;

            let fields = self.mold_fields_in(stores, &row.mold_id, langcode)?;

            let mut attributes = Attributes::new();
            attributes.insert("id".to_string(), serde_json::Value::from(id.to_string()));
            attributes.insert(
                "mold_id".to_string(),
                serde_json::Value::from(row.mold_id.to_string()),
            );

            for field in fields.iter() {
                let value = i18n::resolve_value(stores, field, id, &row.langcode, langcode);
                attributes.insert(
                    field.field_id.to_string(),
                    value.map_or(serde_json::Value::Null, |v| v.to_json()),
                );
            }

            let tags: Vec<serde_json::Value> = stores
                .tags
                .get(id)
                .map(|tags| tags.iter().cloned().map(serde_json::Value::from).collect())
                .unwrap_or_default();
            attributes.insert("tags".to_string(), serde_json::Value::Array(tags));

            let positions: Vec<serde_json::Value> = stores
                .positions
                .get(id)
                .map(|set| {
                    set.iter()
                        .map(|name| serde_json::Value::from(name.to_string()))
                        .collect()
                })
                .unwrap_or_default();
            attributes.insert("positions".to_string(), serde_json::Value::Array(positions));

            Ok(attributes)
        })
    }

    /// Synchronize catalog positions for one entity.
    pub fn save_positions(
        &self,
        id: &EntityId,
        update: &PositionUpdate,
    ) -> Result<(), EntityError> {
        self.write(|stores| {
            if !stores.entities.contains_key(id) {
                return Err(EntityError::InvalidEntity { entity_id: *id });
            }

            let Some(positions) = stage_positions(stores, Some(id), Some(update))? else {
                return Ok(());
            };

            let mut batch = CommitBatch::new();
            batch.push(CommitOp::PutPositions {
                id: *id,
                positions,
            });
            batch.apply(stores);

            Ok(())
        })
    }

    /// Delete an entity, cascading to all its field values in every
    /// language, its tag associations, and its catalog positions.
    pub fn delete_entity(&self, id: &EntityId) -> Result<(), EntityError> {
        self.write(|stores| {
            if !stores.entities.contains_key(id) {
                return Err(EntityError::InvalidEntity { entity_id: *id });
            }

            let mut batch = CommitBatch::new();
            batch.extend(
                stores
                    .external
                    .keys_for_entity(id)
                    .into_iter()
                    .map(|key| CommitOp::PutExternal { key, value: None }),
            );
            batch.push(CommitOp::RemoveTags { id: *id });
            batch.push(CommitOp::RemovePositions { id: *id });
            batch.push(CommitOp::RemoveEntity { id: *id });

            debug!(entity = %id, ops = batch.len(), "entity deleted with cascade");
            batch.apply(stores);

            Ok(())
        })
    }

    /// Entity ids whose stored values for one field contain the needle.
    ///
    /// Fields whose type is not searchable report no matches.
    pub fn search_field(
        &self,
        field_id: &Truename,
        needle: &str,
    ) -> Result<Vec<EntityId>, EntityError> {
        self.read(|stores| {
            let def = stores
                .fields
                .get(field_id)
                .ok_or_else(|| MoldError::UnknownField {
                    field_id: field_id.clone(),
                })?;
            let descriptor = self.registry().resolve(&def.type_id).map_err(MoldError::from)?;

            if !descriptor.searchable {
                return Ok(Vec::new());
            }

            Ok(storage_for(descriptor.storage_kind).search(stores, field_id, needle))
        })
    }
}

/// Validate raw values against the resolved field set.
///
/// On create (`partial == false`) every field is checked so `Required`
/// violations on absent fields surface; on update only supplied fields are
/// staged. All failures accumulate before any is returned.
fn validate_values(
    fields: &[ResolvedField],
    values: &RawInput,
    partial: bool,
) -> Result<Vec<(ResolvedField, StagedWrite)>, ValidationError> {
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut staged = Vec::new();

    for key in values.keys() {
        if !fields.iter().any(|f| f.field_id.as_str() == key) {
            errors
                .entry(key.clone())
                .or_default()
                .push("unknown field".to_string());
        }
    }

    for field in fields {
        let raw = values.get(field.field_id.as_str());
        let supplied = raw.is_some_and(|v| !v.is_null());
        let unset_requested = raw.is_some_and(serde_json::Value::is_null);

        if !supplied && partial && !unset_requested {
            continue;
        }

        let value = match raw {
            Some(raw) if !raw.is_null() => match field.value_kind.coerce(raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    errors
                        .entry(field.field_id.to_string())
                        .or_default()
                        .push(err.to_string());
                    continue;
                }
            },
            _ => None,
        };

        let messages = check_value(&field.rules, value.as_ref());
        if messages.is_empty() {
            match value {
                Some(value) => staged.push((field.clone(), StagedWrite::Set(value))),
                None if unset_requested => staged.push((field.clone(), StagedWrite::Unset)),
                None => {}
            }
        } else {
            errors
                .entry(field.field_id.to_string())
                .or_default()
                .extend(messages);
        }
    }

    if errors.is_empty() {
        Ok(staged)
    } else {
        Err(ValidationError { errors })
    }
}

fn stage_field_write(
    stores: &Stores,
    id: &EntityId,
    field: &ResolvedField,
    langcode: &Langcode,
    write: StagedWrite,
) -> Result<CommitOp, EntityError> {
    let storage = storage_for(field.storage_kind);
    let op = match write {
        StagedWrite::Set(value) => {
            storage.prepare_set(stores, id, &field.field_id, langcode, value)?
        }
        StagedWrite::Unset => storage.prepare_unset(stores, id, &field.field_id, langcode)?,
    };

    Ok(op)
}

/// Resolve a position update into the full set to persist, verifying every
/// named catalog node exists. `entity` is `None` on create (no current set).
fn stage_positions(
    stores: &Stores,
    entity: Option<&EntityId>,
    update: Option<&PositionUpdate>,
) -> Result<Option<BTreeSet<Truename>>, EntityError> {
    let Some(update) = update else {
        return Ok(None);
    };

    let verify = |names: &[Truename]| -> Result<(), EntityError> {
        for name in names {
            if !stores.catalog.contains_key(name) {
                return Err(EntityError::UnknownCatalog {
                    catalog_id: name.clone(),
                });
            }
        }
        Ok(())
    };

    let set = match update {
        PositionUpdate::Replace(names) => {
            verify(names)?;
            names.iter().cloned().collect()
        }
        PositionUpdate::Diff { add, remove } => {
            verify(add)?;
            let mut set: BTreeSet<Truename> = entity
                .and_then(|id| stores.positions.get(id).cloned())
                .unwrap_or_default();
            for name in add {
                set.insert(name.clone());
            }
            for name in remove {
                set.remove(name);
            }
            set
        }
    };

    Ok(Some(set))
}
