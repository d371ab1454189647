pub(crate) mod cache;

#[cfg(test)]
mod tests;

use crate::{
    MAX_MOLD_FIELDS,
    error::{ErrorClass, ErrorOrigin, InternalError},
    field::registry::RegistryError,
    types::Truename,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// MoldError
///

#[derive(Debug, ThisError)]
pub enum MoldError {
    #[error("unknown mold '{mold_id}'")]
    UnknownMold { mold_id: Truename },

    #[error("mold '{mold_id}' already exists")]
    DuplicateMold { mold_id: Truename },

    #[error("unknown field '{field_id}'")]
    UnknownField { field_id: Truename },

    #[error("field '{field_id}' appears more than once in mold '{mold_id}'")]
    FieldRepeated {
        mold_id: Truename,
        field_id: Truename,
    },

    #[error("mold '{mold_id}' exceeds {MAX_MOLD_FIELDS} fields")]
    TooManyFields { mold_id: Truename },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl MoldError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownMold { .. } | Self::UnknownField { .. } => ErrorClass::NotFound,
            Self::DuplicateMold { .. } => ErrorClass::Conflict,
            Self::FieldRepeated { .. } | Self::TooManyFields { .. } => ErrorClass::Validation,
            Self::Registry(err) => err.class(),
        }
    }
}

impl From<MoldError> for InternalError {
    fn from(err: MoldError) -> Self {
        Self::new(err.class(), ErrorOrigin::Mold, err.to_string())
    }
}

///
/// EntityMold
///
/// Type descriptor for entities: which fields the type carries, in display
/// order. Global fields are implicitly carried by every mold and are not
/// listed here.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityMold {
    pub mold_id: Truename,
    pub label: String,

    /// Mold-own field ids, in display order. A field appears at most once.
    pub fields: Vec<Truename>,
}

impl EntityMold {
    #[must_use]
    pub fn new(mold_id: Truename, label: impl Into<String>) -> Self {
        Self {
            mold_id,
            label: label.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Truename>) -> Self {
        self.fields = fields;
        self
    }

    /// Structural checks that do not need store access.
    pub fn validate(&self) -> Result<(), MoldError> {
        if self.fields.len() > MAX_MOLD_FIELDS {
            return Err(MoldError::TooManyFields {
                mold_id: self.mold_id.clone(),
            });
        }

        for (i, field_id) in self.fields.iter().enumerate() {
            if self.fields[..i].contains(field_id) {
                return Err(MoldError::FieldRepeated {
                    mold_id: self.mold_id.clone(),
                    field_id: field_id.clone(),
                });
            }
        }

        Ok(())
    }
}
