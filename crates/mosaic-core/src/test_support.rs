//! Shared fixtures for the engine test suite.

use crate::{
    config::EngineConfig,
    db::Db,
    field::{definition::FieldDefinition, registry::FieldTypeRegistry},
    mold::EntityMold,
    types::{Langcode, Truename},
};

pub(crate) fn tn(name: &str) -> Truename {
    Truename::new(name).unwrap()
}

pub(crate) fn lc(code: &str) -> Langcode {
    Langcode::new(code).unwrap()
}

/// Default config plus German as a translation language.
pub(crate) fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.langcodes.push(lc("de"));

    config
}

/// Engine with builtin field types and an empty store.
pub(crate) fn db() -> Db {
    Db::open(FieldTypeRegistry::builtin().unwrap(), config())
}

/// Engine carrying the `article` mold: `title` (Inline text, required) and
/// `body` (External long text).
pub(crate) fn article_db() -> Db {
    let db = db();

    let mut title = FieldDefinition::new(tn("title"), "text", lc("en"), "Title");
    title = title.with_parameters(required_params());
    db.create_field(title).unwrap();

    db.create_field(FieldDefinition::new(tn("body"), "longtext", lc("en"), "Body"))
        .unwrap();

    db.create_mold(
        EntityMold::new(tn("article"), "Article").with_fields(vec![tn("title"), tn("body")]),
    )
    .unwrap();

    db
}

fn required_params() -> crate::field::descriptor::FieldParameters {
    let registry = FieldTypeRegistry::builtin().unwrap();
    let raw = serde_json::json!({ "required": true });

    registry
        .resolve("text")
        .unwrap()
        .extract_parameters(raw.as_object().unwrap())
        .unwrap()
}
