use crate::{
    MAX_LANGCODE_LEN,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// LangcodeError
///

#[derive(Debug, ThisError)]
pub enum LangcodeError {
    #[error("langcode cannot be empty")]
    Empty,

    #[error("langcode exceeds {MAX_LANGCODE_LEN} characters: '{code}'")]
    TooLong { code: String },

    #[error("langcode must be lowercase ascii subtags joined by '-': '{code}'")]
    InvalidFormat { code: String },
}

impl From<LangcodeError> for InternalError {
    fn from(err: LangcodeError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Value, err.to_string())
    }
}

///
/// Langcode
///
/// Language identifier in the `xx` or `xx-variant` shape (`en`, `zh-hans`).
/// Every field value and catalog path resolution is scoped by one of these.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Langcode(String);

impl Langcode {
    pub fn new(code: impl Into<String>) -> Result<Self, LangcodeError> {
        let code = code.into();
        if code.is_empty() {
            return Err(LangcodeError::Empty);
        }
        if code.len() > MAX_LANGCODE_LEN {
            return Err(LangcodeError::TooLong { code });
        }

        let subtags_ok = code
            .split('-')
            .all(|tag| !tag.is_empty() && tag.chars().all(|c| c.is_ascii_lowercase()));
        if !subtags_ok {
            return Err(LangcodeError::InvalidFormat { code });
        }

        Ok(Self(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Langcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Langcode {
    type Err = LangcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Langcode {
    type Error = LangcodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Langcode> for String {
    fn from(code: Langcode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_and_variant_codes() {
        assert!(Langcode::new("en").is_ok());
        assert!(Langcode::new("zh-hans").is_ok());
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(Langcode::new("").is_err());
        assert!(Langcode::new("EN").is_err());
        assert!(Langcode::new("en-").is_err());
        assert!(Langcode::new("en_us").is_err());
    }
}
