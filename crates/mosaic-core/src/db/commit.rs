//! Commit protocol and atomicity guardrails.
//!
//! Contract:
//! - Operations validate and *prepare* a batch of mechanical ops fallibly,
//!   without mutating any store.
//! - `CommitBatch::apply` replays the ops infallibly under the exclusive
//!   store pass. After prepare succeeds, apply must not re-derive semantics
//!   or branch on store contents.
//!
//! A batch fully describes every mutation of its unit of work: field writes,
//! tag writes, position writes, and catalog rewrites land together or not at
//! all.

use crate::{
    db::store::{CatalogRow, EntityRow, ExternalKey, Stores},
    field::definition::FieldDefinition,
    mold::EntityMold,
    types::{EntityId, Langcode, Truename},
    value::Value,
};
use std::collections::BTreeSet;
use time::OffsetDateTime;

///
/// CommitOp
///
/// One mechanical store mutation. `Put*` with `None` payloads are removals;
/// targets that vanished between prepare and apply cannot occur because both
/// run under the same exclusive pass.
///

#[derive(Clone, Debug)]
pub(crate) enum CommitOp {
    PutEntity {
        id: EntityId,
        row: EntityRow,
    },
    TouchEntity {
        id: EntityId,
        at: OffsetDateTime,
    },
    RemoveEntity {
        id: EntityId,
    },
    PutInline {
        id: EntityId,
        field_id: Truename,
        langcode: Langcode,
        value: Option<Value>,
    },
    PutExternal {
        key: ExternalKey,
        value: Option<Value>,
    },
    PutTags {
        id: EntityId,
        tags: BTreeSet<String>,
    },
    RemoveTags {
        id: EntityId,
    },
    PutPositions {
        id: EntityId,
        positions: BTreeSet<Truename>,
    },
    RemovePositions {
        id: EntityId,
    },
    PutCatalog {
        id: Truename,
        row: CatalogRow,
    },
    RemoveCatalog {
        id: Truename,
    },
    PutField {
        def: FieldDefinition,
    },
    RemoveField {
        id: Truename,
    },
    PutMold {
        mold: EntityMold,
    },
    RemoveMold {
        id: Truename,
    },
    /// Drop one field from a mold's carried list (delete-field cascade).
    StripMoldField {
        mold_id: Truename,
        field_id: Truename,
    },
    /// Drop one field's Inline columns from every entity row.
    StripInlineField {
        field_id: Truename,
    },
}

///
/// CommitBatch
///

#[derive(Debug, Default)]
pub(crate) struct CommitBatch {
    ops: Vec<CommitOp>,
}

impl CommitBatch {
    pub(crate) const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub(crate) fn push(&mut self, op: CommitOp) {
        self.ops.push(op);
    }

    pub(crate) fn extend(&mut self, ops: impl IntoIterator<Item = CommitOp>) {
        self.ops.extend(ops);
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    /// Apply every op in order. Infallible.
    pub(crate) fn apply(self, stores: &mut Stores) {
        for op in self.ops {
            apply_op(op, stores);
        }
    }
}

#[allow(clippy::too_many_lines)]
fn apply_op(op: CommitOp, stores: &mut Stores) {
    match op {
        CommitOp::PutEntity { id, row } => {
            stores.entities.insert(id, row);
        }

        CommitOp::TouchEntity { id, at } => {
            if let Some(row) = stores.entities.get_mut(&id) {
                row.updated_at = at;
            }
        }

        CommitOp::RemoveEntity { id } => {
            stores.entities.remove(&id);
        }

        CommitOp::PutInline {
            id,
            field_id,
            langcode,
            value,
        } => {
            if let Some(row) = stores.entities.get_mut(&id) {
                match value {
                    Some(value) => {
                        row.inline.insert((field_id, langcode), value);
                    }
                    None => {
                        row.inline.remove(&(field_id, langcode));
                    }
                }
            }
        }

        CommitOp::PutExternal { key, value } => match value {
            Some(value) => {
                stores.external.insert(key, value);
            }
            None => {
                stores.external.remove(&key);
            }
        },

        CommitOp::PutTags { id, tags } => {
            stores.tags.insert(id, tags);
        }

        CommitOp::RemoveTags { id } => {
            stores.tags.remove(&id);
        }

        CommitOp::PutPositions { id, positions } => {
            stores.positions.insert(id, positions);
        }

        CommitOp::RemovePositions { id } => {
            stores.positions.remove(&id);
        }

        CommitOp::PutCatalog { id, row } => {
            stores.catalog.insert(id, row);
        }

        CommitOp::RemoveCatalog { id } => {
            stores.catalog.remove(&id);
        }

        CommitOp::PutField { def } => {
            stores.fields.insert(def.field_id.clone(), def);
        }

        CommitOp::RemoveField { id } => {
            stores.fields.shift_remove(&id);
        }

        CommitOp::PutMold { mold } => {
            stores.molds.insert(mold.mold_id.clone(), mold);
        }

        CommitOp::RemoveMold { id } => {
            stores.molds.shift_remove(&id);
        }

        CommitOp::StripMoldField { mold_id, field_id } => {
            if let Some(mold) = stores.molds.get_mut(&mold_id) {
                mold.fields.retain(|f| *f != field_id);
            }
        }

        CommitOp::StripInlineField { field_id } => {
            for row in stores.entities.values_mut() {
                row.inline.retain(|(f, _), _| *f != field_id);
            }
        }
    }
}
