use crate::{
    field::definition::FieldDefinition,
    mold::EntityMold,
    types::{EntityId, Langcode, Truename},
    value::Value,
};
use derive_more::{Deref, DerefMut};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

///
/// EntityRow
///
/// One persisted entity: mold binding, original language, audit stamps, and
/// the Inline column map. Inline field values are columns on this row, keyed
/// `(field, langcode)` so the row itself is language-partitioned.
///

#[derive(Clone, Debug)]
pub struct EntityRow {
    pub mold_id: Truename,
    pub langcode: Langcode,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub inline: BTreeMap<(Truename, Langcode), Value>,
}

///
/// ExternalKey
///
/// Logical key of one External field value: field identity plus a stable
/// locator of the owning entity plus the value's language.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ExternalKey {
    pub field_id: Truename,
    pub entity_id: EntityId,
    pub langcode: Langcode,
}

///
/// CatalogRow
///
/// One catalog node. `path` is the materialized ancestor chain, root first
/// and including the node itself; it is recomputed eagerly on every move so
/// ancestor/descendant queries are prefix comparisons, never walks.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub parent: Option<Truename>,
    pub label: String,
    pub weight: i64,
    pub path: Vec<Truename>,
}

///
/// EntityStore
///

#[derive(Default, Deref, DerefMut)]
pub struct EntityStore(BTreeMap<EntityId, EntityRow>);

///
/// ExternalValueStore
///
/// Dedicated value table for External fields, keyed `(field, locator,
/// langcode)`. One flat ordered map stands in for the per-field tables of a
/// relational layout; range scans by field prefix replace per-table queries.
///

#[derive(Default, Deref, DerefMut)]
pub struct ExternalValueStore(BTreeMap<ExternalKey, Value>);

impl ExternalValueStore {
    /// All keys belonging to one field.
    pub fn keys_for_field(&self, field_id: &Truename) -> Vec<ExternalKey> {
        self.0
            .keys()
            .filter(|key| key.field_id == *field_id)
            .cloned()
            .collect()
    }

    /// All keys belonging to one entity.
    pub fn keys_for_entity(&self, entity_id: &EntityId) -> Vec<ExternalKey> {
        self.0
            .keys()
            .filter(|key| key.entity_id == *entity_id)
            .cloned()
            .collect()
    }
}

///
/// TagStore
///

#[derive(Default, Deref, DerefMut)]
pub struct TagStore(BTreeMap<EntityId, BTreeSet<String>>);

///
/// PositionStore
///
/// Many-to-many entity -> catalog-node associations.
///

#[derive(Default, Deref, DerefMut)]
pub struct PositionStore(BTreeMap<EntityId, BTreeSet<Truename>>);

impl PositionStore {
    /// Entities associated with one catalog node.
    pub fn entities_at(&self, catalog_id: &Truename) -> Vec<EntityId> {
        self.0
            .iter()
            .filter(|(_, positions)| positions.contains(catalog_id))
            .map(|(id, _)| *id)
            .collect()
    }
}

///
/// CatalogStore
///

#[derive(Default, Deref, DerefMut)]
pub struct CatalogStore(BTreeMap<Truename, CatalogRow>);

///
/// FieldStore
///
/// Field definitions in registration order (insertion order is the display
/// order contract for global fields).
///

#[derive(Default, Deref, DerefMut)]
pub struct FieldStore(IndexMap<Truename, FieldDefinition>);

///
/// MoldStore
///

#[derive(Default, Deref, DerefMut)]
pub struct MoldStore(IndexMap<Truename, EntityMold>);

///
/// Stores
///
/// The whole mutable state of one engine instance. Owned by `Db` behind a
/// single lock; every mutation arrives as an applied commit batch.
///

#[derive(Default)]
pub struct Stores {
    pub entities: EntityStore,
    pub external: ExternalValueStore,
    pub tags: TagStore,
    pub positions: PositionStore,
    pub catalog: CatalogStore,
    pub fields: FieldStore,
    pub molds: MoldStore,
}

impl Stores {
    /// Molds carrying a given (non-global) field.
    pub fn molds_carrying(&self, field_id: &Truename) -> Vec<Truename> {
        self.molds
            .values()
            .filter(|mold| mold.fields.contains(field_id))
            .map(|mold| mold.mold_id.clone())
            .collect()
    }
}
