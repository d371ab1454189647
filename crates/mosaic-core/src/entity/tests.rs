use crate::{
    entity::{EntityError, PositionUpdate, SaveRequest},
    test_support::{article_db, lc, tn},
    value::Value,
};
use serde_json::json;
use std::collections::BTreeMap;

fn values(raw: serde_json::Value) -> BTreeMap<String, serde_json::Value> {
    raw.as_object()
        .expect("object literal")
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[test]
fn create_then_gather_round_trips() {
    let db = article_db();

    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({
                "title": "Hello",
                "body": "World",
            }))),
        )
        .unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["title"], json!("Hello"));
    assert_eq!(attrs["body"], json!("World"));

    // deterministic merge order: id, mold, fields in mold order, tags, positions
    let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
    assert_eq!(keys, ["id", "mold_id", "title", "body", "tags", "positions"]);
}

#[test]
fn partial_update_preserves_untouched_fields() {
    let db = article_db();
    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "body": "World" }))),
        )
        .unwrap();

    db.update_entity(&id, &SaveRequest::with_values(values(json!({ "title": "Hi" }))))
        .unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["title"], json!("Hi"));
    assert_eq!(attrs["body"], json!("World"));
}

#[test]
fn invalid_field_aborts_the_whole_save() {
    let db = article_db();
    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "body": "World" }))),
        )
        .unwrap();

    // title is required; unsetting it fails, and body must stay untouched
    let err = db
        .update_entity(
            &id,
            &SaveRequest::with_values(values(json!({ "title": null, "body": "Changed" }))),
        )
        .unwrap_err();

    match err {
        EntityError::Validation(v) => {
            assert!(v.errors.contains_key("title"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["title"], json!("Hello"));
    assert_eq!(attrs["body"], json!("World"));
}

#[test]
fn create_rejects_missing_required_field() {
    let db = article_db();

    let err = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "body": "World" }))),
        )
        .unwrap_err();

    assert!(matches!(err, EntityError::Validation(_)));
}

#[test]
fn unknown_field_in_input_is_reported() {
    let db = article_db();

    let err = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "subtitle": "?" }))),
        )
        .unwrap_err();

    match err {
        EntityError::Validation(v) => assert!(v.errors.contains_key("subtitle")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn translation_falls_back_to_original_language() {
    let db = article_db();
    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "body": "World" }))),
        )
        .unwrap();

    // German translation of the title only
    db.update_entity(
        &id,
        &SaveRequest::with_values(values(json!({ "title": "Hallo" }))).translate_to(lc("de")),
    )
    .unwrap();

    let attrs = db.gather(&id, Some(&lc("de"))).unwrap();
    assert_eq!(attrs["title"], json!("Hallo"));
    assert_eq!(attrs["body"], json!("World"));

    // original language view is untouched by the translation
    let attrs = db.gather(&id, Some(&lc("en"))).unwrap();
    assert_eq!(attrs["title"], json!("Hello"));
}

#[test]
fn unset_value_falls_back_to_field_default() {
    let db = article_db();

    let mut subtitle = crate::field::definition::FieldDefinition::new(
        tn("subtitle"),
        "text",
        lc("en"),
        "Subtitle",
    );
    subtitle = subtitle.with_default(Value::Text("untitled".to_string()));
    db.create_field(subtitle).unwrap();

    let mold = crate::mold::EntityMold::new(tn("article"), "Article")
        .with_fields(vec![tn("title"), tn("body"), tn("subtitle")]);
    db.update_mold(mold).unwrap();

    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello" }))),
        )
        .unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["subtitle"], json!("untitled"));
}

#[test]
fn rejects_unconfigured_langcode() {
    let db = article_db();

    let err = db
        .create_entity(
            &tn("article"),
            &lc("xx"),
            &SaveRequest::with_values(values(json!({ "title": "Hello" }))),
        )
        .unwrap_err();

    assert!(matches!(err, EntityError::UnknownLangcode { .. }));
}

#[test]
fn tags_round_trip() {
    let db = article_db();
    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello" })))
                .tags(vec!["news".to_string(), "featured".to_string()]),
        )
        .unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["tags"], json!(["featured", "news"]));
}

#[test]
fn positions_replace_and_diff() {
    let db = article_db();
    let catalog = db.catalog();
    catalog.attach(tn("news"), None, "News").unwrap();
    catalog.attach(tn("sports"), None, "Sports").unwrap();

    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello" })))
                .positions(PositionUpdate::Replace(vec![tn("news")])),
        )
        .unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["positions"], json!(["news"]));

    db.save_positions(
        &id,
        &PositionUpdate::Diff {
            add: vec![tn("sports")],
            remove: vec![tn("news")],
        },
    )
    .unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["positions"], json!(["sports"]));
}

#[test]
fn positions_must_name_existing_catalog_nodes() {
    let db = article_db();

    let err = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello" })))
                .positions(PositionUpdate::Replace(vec![tn("ghost")])),
        )
        .unwrap_err();

    assert!(matches!(err, EntityError::UnknownCatalog { .. }));

    // the failed create must not leave a half-written entity behind
    assert!(db.read(|stores| stores.entities.is_empty()));
}

#[test]
fn delete_cascades_values_tags_and_positions() {
    let db = article_db();
    db.catalog().attach(tn("news"), None, "News").unwrap();

    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "body": "World" })))
                .tags(vec!["news".to_string()])
                .positions(PositionUpdate::Replace(vec![tn("news")])),
        )
        .unwrap();

    db.delete_entity(&id).unwrap();

    assert!(matches!(
        db.gather(&id, None),
        Err(EntityError::InvalidEntity { .. })
    ));
    db.read(|stores| {
        assert!(stores.entities.is_empty());
        assert!(stores.external.is_empty());
        assert!(stores.tags.is_empty());
        assert!(stores.positions.is_empty());
    });
}

#[test]
fn field_delete_cascade_spares_sibling_values() {
    let db = article_db();
    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "body": "World" }))),
        )
        .unwrap();

    db.delete_field(&tn("body")).unwrap();

    let attrs = db.gather(&id, None).unwrap();
    assert_eq!(attrs["title"], json!("Hello"));
    assert!(!attrs.contains_key("body"));
    db.read(|stores| assert!(stores.external.is_empty()));
}

#[test]
fn search_covers_inline_but_not_external_fields() {
    let db = article_db();
    let id = db
        .create_entity(
            &tn("article"),
            &lc("en"),
            &SaveRequest::with_values(values(json!({ "title": "Hello", "body": "World" }))),
        )
        .unwrap();

    assert_eq!(db.search_field(&tn("title"), "Hell").unwrap(), vec![id]);
    assert!(db.search_field(&tn("title"), "nothing").unwrap().is_empty());

    // External storage has no text index
    assert!(db.search_field(&tn("body"), "World").unwrap().is_empty());
}
