//! Mosaic — dynamic entity–field storage with multilingual fallback and a
//! hierarchical catalog.
//!
//! This is the public meta-crate. Downstream users depend on **mosaic** only.
//!
//! It re-exports the runtime from `mosaic-core` and wraps the core's internal
//! errors in a stable public taxonomy ([`Error`], [`ErrorKind`],
//! [`ErrorOrigin`]).

mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};
pub use mosaic_core as core;

/// Workspace version, stamped into host application diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::{Error, ErrorKind, ErrorOrigin};
    pub use mosaic_core::prelude::*;
}
