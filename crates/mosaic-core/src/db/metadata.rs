//! Administrator-facing metadata operations: field definitions and molds.
//!
//! These are the writes the resolved-field cache discipline revolves around:
//! every mutation here evicts the affected cache entries inside the same
//! exclusive pass that applies the change, keyed on field identity (a
//! global-field edit touches every mold at once).

use crate::{
    db::{
        Db,
        commit::{CommitBatch, CommitOp},
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    field::{
        definition::{FieldDefinition, ResolvedField},
        registry::RegistryError,
    },
    mold::{EntityMold, MoldError},
    types::{Langcode, Truename},
};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::debug;

///
/// MetadataError
///

#[derive(Debug, ThisError)]
pub enum MetadataError {
    #[error("unknown field '{field_id}'")]
    UnknownField { field_id: Truename },

    #[error("field '{field_id}' already exists")]
    DuplicateField { field_id: Truename },

    #[error("field '{field_id}' is reserved and cannot be deleted")]
    ReservedField { field_id: Truename },

    #[error("langcode '{langcode}' is not configured")]
    UnknownLangcode { langcode: Langcode },

    #[error("mold '{mold_id}' still has entities and cannot be deleted")]
    MoldInUse { mold_id: Truename },

    #[error(transparent)]
    Mold(#[from] MoldError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl MetadataError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownField { .. } => ErrorClass::NotFound,
            Self::DuplicateField { .. } => ErrorClass::Conflict,
            Self::ReservedField { .. } | Self::MoldInUse { .. } => ErrorClass::Unsupported,
            Self::UnknownLangcode { .. } => ErrorClass::Validation,
            Self::Mold(err) => err.class(),
            Self::Registry(err) => err.class(),
        }
    }
}

impl From<MetadataError> for InternalError {
    fn from(err: MetadataError) -> Self {
        Self::new(err.class(), ErrorOrigin::Mold, err.to_string())
    }
}

impl Db {
    /// Register a new field definition.
    pub fn create_field(&self, def: FieldDefinition) -> Result<(), MetadataError> {
        self.registry().resolve(&def.type_id)?;
        if !self.config().knows_langcode(&def.langcode) {
            return Err(MetadataError::UnknownLangcode {
                langcode: def.langcode.clone(),
            });
        }

        let is_global = def.is_global;
        self.write(|stores| {
            if stores.fields.contains_key(&def.field_id) {
                return Err(MetadataError::DuplicateField {
                    field_id: def.field_id.clone(),
                });
            }

            debug!(field = %def.field_id, global = is_global, "field created");
            let mut batch = CommitBatch::new();
            batch.push(CommitOp::PutField { def });
            batch.apply(stores);

            // a fresh global field surfaces in every mold at once
            if is_global {
                self.mold_cache.clear();
            }

            Ok(())
        })
    }

    /// Replace an existing field definition.
    pub fn update_field(&self, def: FieldDefinition) -> Result<(), MetadataError> {
        self.registry().resolve(&def.type_id)?;

        self.write(|stores| {
            let Some(existing) = stores.fields.get(&def.field_id) else {
                return Err(MetadataError::UnknownField {
                    field_id: def.field_id.clone(),
                });
            };

            let any_global = existing.is_global || def.is_global;
            let field_id = def.field_id.clone();

            let mut batch = CommitBatch::new();
            batch.push(CommitOp::PutField { def });
            batch.apply(stores);

            debug!(field = %field_id, "field updated");
            if any_global {
                self.mold_cache.clear();
            } else {
                let carrying = stores.molds_carrying(&field_id);
                self.mold_cache
                    .invalidate_where(|mold| carrying.contains(mold));
            }

            Ok(())
        })
    }

    /// Delete a field definition, cascading to every stored value for that
    /// field in every language and every entity. Sibling fields' values are
    /// untouched.
    pub fn delete_field(&self, field_id: &Truename) -> Result<(), MetadataError> {
        self.write(|stores| {
            let Some(def) = stores.fields.get(field_id) else {
                return Err(MetadataError::UnknownField {
                    field_id: field_id.clone(),
                });
            };
            if def.is_reserved {
                return Err(MetadataError::ReservedField {
                    field_id: field_id.clone(),
                });
            }
            let was_global = def.is_global;

            let mut batch = CommitBatch::new();
            batch.extend(
                stores
                    .external
                    .keys_for_field(field_id)
                    .into_iter()
                    .map(|key| CommitOp::PutExternal { key, value: None }),
            );
            batch.push(CommitOp::StripInlineField {
                field_id: field_id.clone(),
            });
            for mold_id in stores.molds_carrying(field_id) {
                batch.push(CommitOp::StripMoldField {
                    mold_id,
                    field_id: field_id.clone(),
                });
            }
            batch.push(CommitOp::RemoveField {
                id: field_id.clone(),
            });

            debug!(field = %field_id, ops = batch.len(), "field deleted with cascade");
            let carrying = stores.molds_carrying(field_id);
            batch.apply(stores);

            if was_global {
                self.mold_cache.clear();
            } else {
                self.mold_cache
                    .invalidate_where(|mold| carrying.contains(mold));
            }

            Ok(())
        })
    }

    /// Register a new mold.
    pub fn create_mold(&self, mold: EntityMold) -> Result<(), MetadataError> {
        mold.validate().map_err(MoldError::from)?;

        self.write(|stores| {
            if stores.molds.contains_key(&mold.mold_id) {
                return Err(MoldError::DuplicateMold {
                    mold_id: mold.mold_id.clone(),
                }
                .into());
            }
            for field_id in &mold.fields {
                if !stores.fields.contains_key(field_id) {
                    return Err(MoldError::UnknownField {
                        field_id: field_id.clone(),
                    }
                    .into());
                }
            }

            debug!(mold = %mold.mold_id, fields = mold.fields.len(), "mold created");
            let mut batch = CommitBatch::new();
            batch.push(CommitOp::PutMold { mold });
            batch.apply(stores);

            Ok(())
        })
    }

    /// Replace an existing mold's label and field list.
    pub fn update_mold(&self, mold: EntityMold) -> Result<(), MetadataError> {
        mold.validate().map_err(MoldError::from)?;

        self.write(|stores| {
            if !stores.molds.contains_key(&mold.mold_id) {
                return Err(MoldError::UnknownMold {
                    mold_id: mold.mold_id.clone(),
                }
                .into());
            }
            for field_id in &mold.fields {
                if !stores.fields.contains_key(field_id) {
                    return Err(MoldError::UnknownField {
                        field_id: field_id.clone(),
                    }
                    .into());
                }
            }

            let mold_id = mold.mold_id.clone();
            let mut batch = CommitBatch::new();
            batch.push(CommitOp::PutMold { mold });
            batch.apply(stores);

            self.mold_cache.invalidate_mold(&mold_id);

            Ok(())
        })
    }

    /// Delete a mold. Refused while entities of the mold exist.
    pub fn delete_mold(&self, mold_id: &Truename) -> Result<(), MetadataError> {
        self.write(|stores| {
            if !stores.molds.contains_key(mold_id) {
                return Err(MoldError::UnknownMold {
                    mold_id: mold_id.clone(),
                }
                .into());
            }
            if stores.entities.values().any(|row| row.mold_id == *mold_id) {
                return Err(MetadataError::MoldInUse {
                    mold_id: mold_id.clone(),
                });
            }

            let mut batch = CommitBatch::new();
            batch.push(CommitOp::RemoveMold {
                id: mold_id.clone(),
            });
            batch.apply(stores);

            self.mold_cache.invalidate_mold(mold_id);

            Ok(())
        })
    }

    /// Look up one field definition.
    #[must_use]
    pub fn field(&self, field_id: &Truename) -> Option<FieldDefinition> {
        self.read(|stores| stores.fields.get(field_id).cloned())
    }

    /// Look up one mold.
    #[must_use]
    pub fn mold(&self, mold_id: &Truename) -> Option<EntityMold> {
        self.read(|stores| stores.molds.get(mold_id).cloned())
    }

    /// Resolved field list for a mold in one language: mold-own fields
    /// first, then global fields, each in registration order, with display
    /// metadata resolved in the requested language (falling back to each
    /// definition's authoring language).
    ///
    /// Results are cached per `(mold, langcode)`; metadata writes evict.
    pub fn mold_fields(
        &self,
        mold_id: &Truename,
        langcode: Option<&Langcode>,
    ) -> Result<Arc<[ResolvedField]>, MoldError> {
        self.read(|stores| self.mold_fields_in(stores, mold_id, langcode))
    }

    /// Store-level resolution used by operations already holding the store
    /// pass (the public wrapper takes the read lock itself).
    pub(crate) fn mold_fields_in(
        &self,
        stores: &crate::db::store::Stores,
        mold_id: &Truename,
        langcode: Option<&Langcode>,
    ) -> Result<Arc<[ResolvedField]>, MoldError> {
        let langcode = langcode
            .cloned()
            .unwrap_or_else(|| self.config().default_langcode.clone());

        if let Some(hit) = self.mold_cache.get(mold_id, &langcode) {
            return Ok(hit);
        }

        {
            let mold = stores
                .molds
                .get(mold_id)
                .ok_or_else(|| MoldError::UnknownMold {
                    mold_id: mold_id.clone(),
                })?;

            let mut resolved: Vec<ResolvedField> = Vec::new();

            for field_id in &mold.fields {
                let def = stores
                    .fields
                    .get(field_id)
                    .ok_or_else(|| MoldError::UnknownField {
                        field_id: field_id.clone(),
                    })?;
                resolved.push(self.resolve_field(def, &langcode)?);
            }

            for def in stores.fields.values() {
                let listed = mold.fields.contains(&def.field_id);
                if def.is_global && !listed {
                    resolved.push(self.resolve_field(def, &langcode)?);
                }
            }

            let fields: Arc<[ResolvedField]> = resolved.into();
            self.mold_cache
                .insert(mold_id.clone(), langcode, Arc::clone(&fields));

            Ok(fields)
        }
    }

    fn resolve_field(
        &self,
        def: &FieldDefinition,
        langcode: &Langcode,
    ) -> Result<ResolvedField, MoldError> {
        let descriptor = self.registry().resolve(&def.type_id)?;
        let display = def.display(langcode);

        Ok(ResolvedField {
            field_id: def.field_id.clone(),
            type_id: def.type_id.clone(),
            label: display.label.clone(),
            help: display.help.clone(),
            group_title: def.group_title.clone(),
            is_global: def.is_global,
            is_reserved: def.is_reserved,
            value_kind: descriptor.value_kind,
            storage_kind: descriptor.storage_kind,
            searchable: descriptor.searchable,
            renderer: descriptor.renderer.to_string(),
            parameters: def.parameters.clone(),
            default: def.default.clone(),
            rules: descriptor.rules(&def.parameters, self.config()),
        })
    }
}
