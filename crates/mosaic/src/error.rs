use mosaic_core::{
    catalog::CatalogError,
    db::metadata::MetadataError,
    entity::{EntityError, ValidationError},
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    field::registry::RegistryError,
    mold::MoldError,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Per-field messages when this is a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match &self.kind {
            ErrorKind::Validation { fields } => Some(fields),
            _ => None,
        }
    }
}

fn kind_of(class: ErrorClass) -> ErrorKind {
    match class {
        ErrorClass::Conflict => ErrorKind::Conflict,
        ErrorClass::NotFound => ErrorKind::NotFound,
        ErrorClass::Unsupported => ErrorKind::Unsupported,
        ErrorClass::Validation => ErrorKind::Validation {
            fields: BTreeMap::new(),
        },
        ErrorClass::Corruption | ErrorClass::Internal | ErrorClass::InvariantViolation => {
            ErrorKind::Internal
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(kind_of(err.class), err.origin.into(), err.message)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        Self::new(
            ErrorKind::Validation { fields: err.errors },
            ErrorOrigin::Entity,
            message,
        )
    }
}

impl From<EntityError> for Error {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::Validation(err) => err.into(),
            other => Self::new(kind_of(other.class()), ErrorOrigin::Entity, other.to_string()),
        }
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Self::new(kind_of(err.class()), ErrorOrigin::Mold, err.to_string())
    }
}

impl From<MoldError> for Error {
    fn from(err: MoldError) -> Self {
        Self::new(kind_of(err.class()), ErrorOrigin::Mold, err.to_string())
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::new(kind_of(err.class()), ErrorOrigin::Catalog, err.to_string())
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Self::new(kind_of(err.class()), ErrorOrigin::Registry, err.to_string())
    }
}

///
/// ErrorKind
/// Public taxonomy for callers and host applications.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Caller-supplied data failed validation, with per-field messages.
    Validation { fields: BTreeMap<String, Vec<String>> },

    /// The target does not exist.
    NotFound,

    /// A registration or identity conflict.
    Conflict,

    /// The operation is not supported for the target.
    Unsupported,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers and host applications.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Catalog,
    Entity,
    Field,
    Mold,
    Registry,
    Storage,
    Store,
    Value,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Catalog => "catalog",
            Self::Entity => "entity",
            Self::Field => "field",
            Self::Mold => "mold",
            Self::Registry => "registry",
            Self::Storage => "storage",
            Self::Store => "store",
            Self::Value => "value",
        };
        write!(f, "{s}")
    }
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Catalog => Self::Catalog,
            CoreErrorOrigin::Entity => Self::Entity,
            CoreErrorOrigin::Field => Self::Field,
            CoreErrorOrigin::Mold => Self::Mold,
            CoreErrorOrigin::Registry => Self::Registry,
            CoreErrorOrigin::Storage => Self::Storage,
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Value => Self::Value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{
        config::EngineConfig,
        db::Db,
        entity::SaveRequest,
        field::registry::FieldTypeRegistry,
        types::{Langcode, Truename},
    };

    #[test]
    fn validation_errors_carry_the_field_map() {
        let db = Db::open(FieldTypeRegistry::builtin().unwrap(), EngineConfig::default());
        db.create_mold(mosaic_core::mold::EntityMold::new(
            Truename::new("page").unwrap(),
            "Page",
        ))
        .unwrap();

        let mut values = std::collections::BTreeMap::new();
        values.insert("ghost".to_string(), serde_json::json!("boo"));

        let err: Error = db
            .create_entity(
                &Truename::new("page").unwrap(),
                &Langcode::new("en").unwrap(),
                &SaveRequest::with_values(values),
            )
            .unwrap_err()
            .into();

        let fields = err.field_errors().expect("validation kind");
        assert!(fields.contains_key("ghost"));
        assert_eq!(err.origin, ErrorOrigin::Entity);
    }

    #[test]
    fn not_found_maps_by_class() {
        let db = Db::open(FieldTypeRegistry::builtin().unwrap(), EngineConfig::default());

        let err: Error = db
            .catalog()
            .path(&Truename::new("ghost").unwrap())
            .unwrap_err()
            .into();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.origin, ErrorOrigin::Catalog);
    }
}
