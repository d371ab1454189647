use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    field::{
        builtin,
        descriptor::{ColumnSpec, FieldParameters, FieldTypeDescriptor, StorageKind},
    },
    types::Truename,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("field type '{type_id}' is already registered")]
    DuplicateType { type_id: String },

    #[error("unknown field type '{type_id}'")]
    UnknownType { type_id: String },

    #[error("field type '{type_id}' is not inline and has no column shape")]
    NotColumnar { type_id: String },
}

impl RegistryError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateType { .. } => ErrorClass::Conflict,
            Self::UnknownType { .. } => ErrorClass::NotFound,
            Self::NotColumnar { .. } => ErrorClass::Unsupported,
        }
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Registry, err.to_string())
    }
}

///
/// FieldTypeRegistry
///
/// Static catalog of field-type descriptors. Populated once before the `Db`
/// opens and read-only thereafter; a reload replaces the whole table
/// atomically, never partially.
///

#[derive(Debug, Default)]
pub struct FieldTypeRegistry {
    types: BTreeMap<&'static str, FieldTypeDescriptor>,
}

impl FieldTypeRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with the builtin field types.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for descriptor in builtin::descriptors() {
            registry.register(descriptor)?;
        }

        Ok(registry)
    }

    pub fn register(&mut self, descriptor: FieldTypeDescriptor) -> Result<(), RegistryError> {
        let type_id = descriptor.type_id;
        if self.types.contains_key(type_id) {
            return Err(RegistryError::DuplicateType {
                type_id: type_id.to_string(),
            });
        }
        self.types.insert(type_id, descriptor);

        Ok(())
    }

    /// Swap the whole table for a new descriptor set.
    ///
    /// Duplicates fail the reload before the existing table is touched.
    pub fn replace_all(
        &mut self,
        descriptors: impl IntoIterator<Item = FieldTypeDescriptor>,
    ) -> Result<(), RegistryError> {
        let mut fresh = Self::new();
        for descriptor in descriptors {
            fresh.register(descriptor)?;
        }
        self.types = fresh.types;

        Ok(())
    }

    pub fn resolve(&self, type_id: &str) -> Result<&FieldTypeDescriptor, RegistryError> {
        self.types
            .get(type_id)
            .ok_or_else(|| RegistryError::UnknownType {
                type_id: type_id.to_string(),
            })
    }

    /// Physical column shapes for an Inline field definition.
    pub fn build_column_spec(
        &self,
        type_id: &str,
        field_id: &Truename,
        params: &FieldParameters,
    ) -> Result<Vec<ColumnSpec>, RegistryError> {
        let descriptor = self.resolve(type_id)?;
        if descriptor.storage_kind != StorageKind::Inline {
            return Err(RegistryError::NotColumnar {
                type_id: type_id.to_string(),
            });
        }

        Ok(descriptor.columns(field_id, params))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldTypeDescriptor> {
        self.types.values()
    }
}
