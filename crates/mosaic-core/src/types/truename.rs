use crate::{
    MAX_TRUENAME_LEN,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// TruenameError
///

#[derive(Debug, ThisError)]
pub enum TruenameError {
    #[error("truename cannot be empty")]
    Empty,

    #[error("truename exceeds {MAX_TRUENAME_LEN} characters: '{name}'")]
    TooLong { name: String },

    #[error("truename must be lowercase ascii [a-z0-9_] starting with a letter: '{name}'")]
    InvalidChars { name: String },
}

impl From<TruenameError> for InternalError {
    fn from(err: TruenameError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Value, err.to_string())
    }
}

///
/// Truename
///
/// Stable slug identity used for molds, fields, and catalog nodes. The slug
/// is the primary key wherever it appears; renaming is not supported.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Truename(String);

impl Truename {
    pub fn new(name: impl Into<String>) -> Result<Self, TruenameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TruenameError::Empty);
        }
        if name.len() > MAX_TRUENAME_LEN {
            return Err(TruenameError::TooLong { name });
        }

        let mut chars = name.chars();
        let head_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let tail_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !head_ok || !tail_ok {
            return Err(TruenameError::InvalidChars { name });
        }

        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Truename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Truename {
    type Err = TruenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Truename {
    type Error = TruenameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Truename> for String {
    fn from(name: Truename) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slugs() {
        assert!(Truename::new("article").is_ok());
        assert!(Truename::new("a1_b2").is_ok());
    }

    #[test]
    fn rejects_bad_slugs() {
        assert!(matches!(Truename::new(""), Err(TruenameError::Empty)));
        assert!(matches!(
            Truename::new("1abc"),
            Err(TruenameError::InvalidChars { .. })
        ));
        assert!(matches!(
            Truename::new("Hello"),
            Err(TruenameError::InvalidChars { .. })
        ));
        assert!(matches!(
            Truename::new("a".repeat(65)),
            Err(TruenameError::TooLong { .. })
        ));
    }
}
