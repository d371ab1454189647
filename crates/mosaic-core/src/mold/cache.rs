use crate::{
    field::definition::ResolvedField,
    types::{Langcode, Truename},
};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tracing::debug;

///
/// MoldFieldCache
///
/// Process-wide cache of resolved field lists, keyed `(mold, langcode)`.
/// Readers populate on miss; every field or mold mutation must evict before
/// its effects become visible. Eviction is keyed on *field* identity where it
/// matters: a global-field edit affects every mold at once.
///

#[derive(Default)]
pub(crate) struct MoldFieldCache {
    entries: RwLock<HashMap<(Truename, Langcode), Arc<[ResolvedField]>>>,
}

impl MoldFieldCache {
    pub(crate) fn get(&self, mold_id: &Truename, langcode: &Langcode) -> Option<Arc<[ResolvedField]>> {
        self.entries
            .read()
            .expect("mold cache lock poisoned")
            .get(&(mold_id.clone(), langcode.clone()))
            .cloned()
    }

    pub(crate) fn insert(
        &self,
        mold_id: Truename,
        langcode: Langcode,
        fields: Arc<[ResolvedField]>,
    ) {
        self.entries
            .write()
            .expect("mold cache lock poisoned")
            .insert((mold_id, langcode), fields);
    }

    /// Evict every language entry of one mold.
    pub(crate) fn invalidate_mold(&self, mold_id: &Truename) {
        debug!(mold = %mold_id, "mold cache invalidated");
        self.entries
            .write()
            .expect("mold cache lock poisoned")
            .retain(|(cached, _), _| cached != mold_id);
    }

    /// Evict entries of every mold matched by the predicate.
    pub(crate) fn invalidate_where(&self, keep_out: impl Fn(&Truename) -> bool) {
        self.entries
            .write()
            .expect("mold cache lock poisoned")
            .retain(|(cached, _), _| !keep_out(cached));
    }

    /// Evict everything; used for global-field mutations.
    pub(crate) fn clear(&self) {
        debug!("mold cache cleared");
        self.entries
            .write()
            .expect("mold cache lock poisoned")
            .clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().expect("mold cache lock poisoned").len()
    }
}
