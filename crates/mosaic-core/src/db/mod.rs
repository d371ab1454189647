pub(crate) mod commit;
pub mod metadata;
pub mod store;

use crate::{
    config::EngineConfig, db::store::Stores, field::registry::FieldTypeRegistry,
    mold::cache::MoldFieldCache,
};
use std::sync::RwLock;
use time::OffsetDateTime;

///
/// Db
///
/// A handle to one engine instance: the field-type registry (read-only after
/// open), engine configuration, the mutable stores behind a single lock, and
/// the resolved-field cache.
///
/// Every write operation runs as one exclusive prepare/apply pass: validate
/// and stage ops with the lock held, then replay them infallibly. That single
/// pass is what linearizes field, tag, and position writes per entity and
/// serializes overlapping catalog moves.
///

pub struct Db {
    registry: FieldTypeRegistry,
    config: EngineConfig,
    stores: RwLock<Stores>,
    pub(crate) mold_cache: MoldFieldCache,
}

impl Db {
    #[must_use]
    pub fn open(registry: FieldTypeRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            stores: RwLock::new(Stores::default()),
            mold_cache: MoldFieldCache::default(),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &FieldTypeRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a closure with shared read access to the stores.
    pub fn read<R>(&self, f: impl FnOnce(&Stores) -> R) -> R {
        let stores = self.stores.read().expect("store lock poisoned");
        f(&stores)
    }

    /// Run a closure with exclusive access to the stores.
    ///
    /// Prepare and apply must both happen inside the closure so no other
    /// writer can interleave between validation and mutation.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Stores) -> R) -> R {
        let mut stores = self.stores.write().expect("store lock poisoned");
        f(&mut stores)
    }

    pub(crate) fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
