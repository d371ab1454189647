mod id;
mod langcode;
mod truename;

pub use id::{EntityId, EntityIdError};
pub use langcode::{Langcode, LangcodeError};
pub use truename::{Truename, TruenameError};
