use crate::{
    db::metadata::MetadataError,
    entity::SaveRequest,
    field::definition::{FieldDefinition, FieldDisplay},
    mold::{EntityMold, MoldError},
    test_support::{article_db, db, lc, tn},
};
use serde_json::json;

#[test]
fn validate_rejects_repeated_fields() {
    let mold = EntityMold::new(tn("article"), "Article")
        .with_fields(vec![tn("title"), tn("title")]);

    assert!(matches!(
        mold.validate(),
        Err(MoldError::FieldRepeated { .. })
    ));
}

#[test]
fn mold_fields_lists_own_fields_then_globals() {
    let db = article_db();

    db.create_field(FieldDefinition::new(tn("seo_title"), "text", lc("en"), "SEO title").global())
        .unwrap();

    let fields = db.mold_fields(&tn("article"), None).unwrap();
    let ids: Vec<&str> = fields.iter().map(|f| f.field_id.as_str()).collect();

    assert_eq!(ids, ["title", "body", "seo_title"]);
}

#[test]
fn listed_global_field_keeps_its_mold_slot() {
    let db = article_db();

    db.create_field(FieldDefinition::new(tn("seo_title"), "text", lc("en"), "SEO title").global())
        .unwrap();
    db.update_mold(
        EntityMold::new(tn("article"), "Article")
            .with_fields(vec![tn("seo_title"), tn("title"), tn("body")]),
    )
    .unwrap();

    let fields = db.mold_fields(&tn("article"), None).unwrap();
    let ids: Vec<&str> = fields.iter().map(|f| f.field_id.as_str()).collect();

    // explicitly listed globals are not re-appended
    assert_eq!(ids, ["seo_title", "title", "body"]);
}

#[test]
fn display_resolves_requested_language_with_fallback() {
    let db = article_db();

    let mut title = db.field(&tn("title")).unwrap();
    title.set_display(lc("de"), FieldDisplay::new("Titel"));
    db.update_field(title).unwrap();

    let fields = db.mold_fields(&tn("article"), Some(&lc("de"))).unwrap();
    assert_eq!(fields[0].label, "Titel");
    // body has no German display, so the authoring language shows
    assert_eq!(fields[1].label, "Body");

    let fields = db.mold_fields(&tn("article"), None).unwrap();
    assert_eq!(fields[0].label, "Title");
}

#[test]
fn field_update_is_visible_through_the_cache() {
    let db = article_db();

    // warm the cache
    let before = db.mold_fields(&tn("article"), None).unwrap();
    assert_eq!(before[0].label, "Title");

    let mut title = db.field(&tn("title")).unwrap();
    title.set_display(lc("en"), FieldDisplay::new("Headline"));
    db.update_field(title).unwrap();

    let after = db.mold_fields(&tn("article"), None).unwrap();
    assert_eq!(after[0].label, "Headline");
}

#[test]
fn global_field_create_reaches_every_mold() {
    let db = article_db();
    db.create_field(FieldDefinition::new(tn("note"), "text", lc("en"), "Note"))
        .unwrap();
    db.create_mold(EntityMold::new(tn("page"), "Page").with_fields(vec![tn("note")]))
        .unwrap();

    // warm both molds
    db.mold_fields(&tn("article"), None).unwrap();
    db.mold_fields(&tn("page"), None).unwrap();
    assert_eq!(db.mold_cache.len(), 2);

    db.create_field(FieldDefinition::new(tn("footer"), "text", lc("en"), "Footer").global())
        .unwrap();
    assert_eq!(db.mold_cache.len(), 0);

    for mold in [tn("article"), tn("page")] {
        let fields = db.mold_fields(&mold, None).unwrap();
        assert!(fields.iter().any(|f| f.field_id == tn("footer")));
    }
}

#[test]
fn mold_update_invalidates_its_cache_entry() {
    let db = article_db();
    assert_eq!(db.mold_fields(&tn("article"), None).unwrap().len(), 2);

    db.update_mold(EntityMold::new(tn("article"), "Article").with_fields(vec![tn("title")]))
        .unwrap();

    let fields = db.mold_fields(&tn("article"), None).unwrap();
    let ids: Vec<&str> = fields.iter().map(|f| f.field_id.as_str()).collect();
    assert_eq!(ids, ["title"]);
}

#[test]
fn create_mold_requires_known_fields() {
    let db = db();

    let err = db
        .create_mold(EntityMold::new(tn("page"), "Page").with_fields(vec![tn("ghost")]))
        .unwrap_err();

    assert!(matches!(
        err,
        MetadataError::Mold(MoldError::UnknownField { .. })
    ));
}

#[test]
fn duplicate_field_and_mold_are_conflicts() {
    let db = article_db();

    assert!(matches!(
        db.create_field(FieldDefinition::new(tn("title"), "text", lc("en"), "Title")),
        Err(MetadataError::DuplicateField { .. })
    ));
    assert!(matches!(
        db.create_mold(EntityMold::new(tn("article"), "Article")),
        Err(MetadataError::Mold(MoldError::DuplicateMold { .. }))
    ));
}

#[test]
fn reserved_fields_cannot_be_deleted() {
    let db = db();
    db.create_field(FieldDefinition::new(tn("slug"), "text", lc("en"), "Slug").reserved())
        .unwrap();

    assert!(matches!(
        db.delete_field(&tn("slug")),
        Err(MetadataError::ReservedField { .. })
    ));
}

#[test]
fn mold_with_entities_cannot_be_deleted() {
    let db = article_db();
    let values = json!({ "title": "Hello" })
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    db.create_entity(&tn("article"), &lc("en"), &SaveRequest::with_values(values))
        .unwrap();

    assert!(matches!(
        db.delete_mold(&tn("article")),
        Err(MetadataError::MoldInUse { .. })
    ));
}

#[test]
fn deleted_field_disappears_from_molds() {
    let db = article_db();
    db.mold_fields(&tn("article"), None).unwrap();

    db.delete_field(&tn("body")).unwrap();

    let fields = db.mold_fields(&tn("article"), None).unwrap();
    assert!(fields.iter().all(|f| f.field_id != tn("body")));
    assert_eq!(db.mold(&tn("article")).unwrap().fields, vec![tn("title")]);
}

#[test]
fn field_type_must_exist() {
    let db = db();

    assert!(matches!(
        db.create_field(FieldDefinition::new(tn("thing"), "hologram", lc("en"), "Thing")),
        Err(MetadataError::Registry(_))
    ));
}
