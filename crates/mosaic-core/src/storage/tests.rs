use crate::{
    db::{
        commit::CommitBatch,
        store::{EntityRow, Stores},
    },
    storage::{StorageError, storage_for},
    field::descriptor::StorageKind,
    test_support::{lc, tn},
    types::EntityId,
    value::Value,
};
use std::collections::BTreeMap;
use time::OffsetDateTime;

fn seeded() -> (Stores, EntityId) {
    let mut stores = Stores::default();
    let id = EntityId::generate().unwrap();
    stores.entities.insert(
        id,
        EntityRow {
            mold_id: tn("article"),
            langcode: lc("en"),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            inline: BTreeMap::new(),
        },
    );

    (stores, id)
}

fn txt(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn set(
    stores: &mut Stores,
    kind: StorageKind,
    id: &EntityId,
    field: &str,
    lang: &str,
    value: Value,
) {
    let op = storage_for(kind)
        .prepare_set(stores, id, &tn(field), &lc(lang), value)
        .unwrap();
    let mut batch = CommitBatch::new();
    batch.push(op);
    batch.apply(stores);
}

#[test]
fn inline_set_get_unset_round_trip() {
    let (mut stores, id) = seeded();
    let storage = storage_for(StorageKind::Inline);

    assert_eq!(storage.get(&stores, &id, &tn("title"), &lc("en")).unwrap(), None);

    set(&mut stores, StorageKind::Inline, &id, "title", "en", txt("Hello"));
    assert_eq!(
        storage.get(&stores, &id, &tn("title"), &lc("en")).unwrap(),
        Some(txt("Hello"))
    );

    // other languages stay unset
    assert_eq!(storage.get(&stores, &id, &tn("title"), &lc("de")).unwrap(), None);

    let op = storage
        .prepare_unset(&stores, &id, &tn("title"), &lc("en"))
        .unwrap();
    let mut batch = CommitBatch::new();
    batch.push(op);
    batch.apply(&mut stores);
    assert_eq!(storage.get(&stores, &id, &tn("title"), &lc("en")).unwrap(), None);
}

#[test]
fn external_set_is_an_upsert() {
    let (mut stores, id) = seeded();
    let storage = storage_for(StorageKind::External);

    set(&mut stores, StorageKind::External, &id, "body", "en", txt("one"));
    set(&mut stores, StorageKind::External, &id, "body", "en", txt("two"));

    assert_eq!(stores.external.len(), 1);
    assert_eq!(
        storage.get(&stores, &id, &tn("body"), &lc("en")).unwrap(),
        Some(txt("two"))
    );
}

#[test]
fn reads_on_missing_entities_are_not_found() {
    let (stores, _) = seeded();
    let ghost = EntityId::generate().unwrap();

    for kind in [StorageKind::Inline, StorageKind::External] {
        assert!(matches!(
            storage_for(kind).get(&stores, &ghost, &tn("title"), &lc("en")),
            Err(StorageError::NotFound { .. })
        ));
    }
}

#[test]
fn writes_on_missing_entities_are_invalid() {
    let (stores, _) = seeded();
    let ghost = EntityId::generate().unwrap();

    for kind in [StorageKind::Inline, StorageKind::External] {
        assert!(matches!(
            storage_for(kind).prepare_set(&stores, &ghost, &tn("title"), &lc("en"), txt("x")),
            Err(StorageError::InvalidEntity { .. })
        ));
        assert!(matches!(
            storage_for(kind).prepare_unset(&stores, &ghost, &tn("title"), &lc("en")),
            Err(StorageError::InvalidEntity { .. })
        ));
    }
}

#[test]
fn inline_search_matches_substrings() {
    let (mut stores, id) = seeded();
    set(&mut stores, StorageKind::Inline, &id, "title", "en", txt("Hello world"));

    let storage = storage_for(StorageKind::Inline);
    assert_eq!(storage.search(&stores, &tn("title"), "world"), vec![id]);
    assert!(storage.search(&stores, &tn("title"), "mars").is_empty());
    assert!(storage.search(&stores, &tn("body"), "world").is_empty());
}

#[test]
fn external_search_reports_no_matches() {
    let (mut stores, id) = seeded();
    set(&mut stores, StorageKind::External, &id, "body", "en", txt("Hello world"));

    let storage = storage_for(StorageKind::External);
    assert!(storage.search(&stores, &tn("body"), "world").is_empty());
}
