//! Field types, definitions, and the process-wide type registry.
//!
//! A field *type* is a registered descriptor (schema of configurable
//! parameters, storage kind, validation-rule builder, renderer hook). A field
//! *definition* is an administrator-created instance of a type, carried by
//! one mold or shared globally across all molds.

pub mod builtin;
pub mod definition;
pub mod descriptor;
pub mod registry;
pub mod rules;
