use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    /// Construct an InternalError from a class, origin, and message.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }
}

///
/// ErrorClass
///
/// Coarse classification used for routing and reporting. The class answers
/// "what went wrong", the origin answers "where".
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// A registration or identity conflict (duplicate type, duplicate node).
    Conflict,

    /// Stored state failed a structural check.
    Corruption,

    /// An unclassified runtime failure.
    Internal,

    /// A documented invariant was violated.
    InvariantViolation,

    /// The target does not exist.
    NotFound,

    /// The operation is not supported for the target.
    Unsupported,

    /// Caller-supplied data failed validation; recoverable by the caller.
    Validation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Conflict => "conflict",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
            Self::Validation => "validation",
        };
        write!(f, "{s}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
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
