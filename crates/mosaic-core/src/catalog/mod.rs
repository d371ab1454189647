//! Hierarchical catalog forest.
//!
//! Nodes carry a materialized `path` (ancestor chain, root first, including
//! self), so ancestor and descendant queries are prefix comparisons instead
//! of parent-link walks. Every attach and reparenting move recomputes `path`
//! for exactly the moved subtree, inside one exclusive pass; weight-only
//! reorders never touch `path`.


use crate::{
    db::{
        Db,
        commit::{CommitBatch, CommitOp},
        store::{CatalogRow, Stores},
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    types::{EntityId, Truename},
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;
use tracing::debug;

///
/// CatalogNode
///
/// Read-side view of one node.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogNode {
    pub id: Truename,
    pub parent: Option<Truename>,
    pub label: String,
    pub weight: i64,
    pub path: Vec<Truename>,
}

impl CatalogNode {
    fn view(id: &Truename, row: &CatalogRow) -> Self {
        Self {
            id: id.clone(),
            parent: row.parent.clone(),
            label: row.label.clone(),
            weight: row.weight,
            path: row.path.clone(),
        }
    }
}

///
/// CatalogError
///

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("catalog node '{id}' already exists")]
    DuplicateNode { id: Truename },

    #[error("moving '{id}' under its own subtree would create a cycle")]
    Cycle { id: Truename },

    #[error("catalog node '{id}' has children and cannot be detached")]
    NotLeaf { id: Truename },

    #[error("unknown catalog node '{id}'")]
    UnknownNode { id: Truename },

    #[error("unknown parent catalog node '{id}'")]
    UnknownParent { id: Truename },
}

impl CatalogError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateNode { .. } => ErrorClass::Conflict,
            Self::Cycle { .. } => ErrorClass::InvariantViolation,
            Self::NotLeaf { .. } => ErrorClass::Unsupported,
            Self::UnknownNode { .. } | Self::UnknownParent { .. } => ErrorClass::NotFound,
        }
    }
}

impl From<CatalogError> for InternalError {
    fn from(err: CatalogError) -> Self {
        Self::new(err.class(), ErrorOrigin::Catalog, err.to_string())
    }
}

///
/// CatalogTree
///
/// Handle over the catalog stores of one engine instance.
///

pub struct CatalogTree<'a> {
    db: &'a Db,
}

impl Db {
    #[must_use]
    pub const fn catalog(&self) -> CatalogTree<'_> {
        CatalogTree { db: self }
    }
}

impl CatalogTree<'_> {
    /// Attach a new node under a parent (or as a root), appended after the
    /// existing siblings.
    pub fn attach(
        &self,
        id: Truename,
        parent: Option<Truename>,
        label: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let label = label.into();

        self.db.write(|stores| {
            if stores.catalog.contains_key(&id) {
                return Err(CatalogError::DuplicateNode { id });
            }

            let path = match &parent {
                Some(parent_id) => {
                    let parent_row =
                        stores
                            .catalog
                            .get(parent_id)
                            .ok_or_else(|| CatalogError::UnknownParent {
                                id: parent_id.clone(),
                            })?;
                    let mut path = parent_row.path.clone();
                    path.push(id.clone());
                    path
                }
                None => vec![id.clone()],
            };

            let weight = sibling_order(stores, parent.as_ref(), None).len() as i64;

            debug!(node = %id, weight, "catalog node attached");
            let mut batch = CommitBatch::new();
            batch.push(CommitOp::PutCatalog {
                id,
                row: CatalogRow {
                    parent,
                    label,
                    weight,
                    path,
                },
            });
            batch.apply(stores);

            Ok(())
        })
    }

    /// Move a node to a new parent and/or a new position among its siblings.
    ///
    /// `new_weight` is the desired rank: the node lands before the first
    /// sibling whose weight is not below it, and the whole sibling group is
    /// renumbered densely from zero. When the parent changes, the `path` of
    /// the node and of every descendant is rewritten; a weight-only reorder
    /// leaves every `path` untouched. A failed move changes nothing.
    pub fn move_node(
        &self,
        id: &Truename,
        new_parent: Option<&Truename>,
        new_weight: i64,
    ) -> Result<(), CatalogError> {
        self.db.write(|stores| {
            let row = stores
                .catalog
                .get(id)
                .ok_or_else(|| CatalogError::UnknownNode { id: id.clone() })?
                .clone();

            let new_prefix = match new_parent {
                Some(parent_id) => {
                    let parent_row =
                        stores
                            .catalog
                            .get(parent_id)
                            .ok_or_else(|| CatalogError::UnknownParent {
                                id: parent_id.clone(),
                            })?;
                    if parent_id == id || parent_row.path.contains(id) {
                        return Err(CatalogError::Cycle { id: id.clone() });
                    }
                    parent_row.path.clone()
                }
                None => Vec::new(),
            };

            let parent_changed = row.parent.as_ref() != new_parent;
            let mut updated: BTreeMap<Truename, CatalogRow> = BTreeMap::new();

            if parent_changed {
                // rewrite the moved subtree's paths: swap the old ancestor
                // prefix for the new one, node and descendants alike
                let keep_from = row.path.len() - 1;
                for (node_id, node_row) in stores.catalog.iter() {
                    if !node_row.path.starts_with(&row.path) {
                        continue;
                    }
                    let mut path = new_prefix.clone();
                    path.extend_from_slice(&node_row.path[keep_from..]);

                    let mut next = node_row.clone();
                    next.path = path;
                    if node_id == id {
                        next.parent = new_parent.cloned();
                    }
                    updated.insert(node_id.clone(), next);
                }

                // old sibling group closes ranks
                let old_siblings = sibling_order(stores, row.parent.as_ref(), Some(id));
                renumber(stores, &mut updated, &old_siblings);
            }

            // place the node in the target sibling group
            let mut order = sibling_order(stores, new_parent, Some(id));
            let at = order
                .iter()
                .position(|sibling_id| {
                    let weight = updated
                        .get(sibling_id)
                        .map_or_else(|| weight_of(stores, sibling_id), |r| r.weight);
                    weight >= new_weight
                })
                .unwrap_or(order.len());
            order.insert(at, id.clone());
            renumber(stores, &mut updated, &order);

            let mut batch = CommitBatch::new();
            for (node_id, next) in updated {
                if stores.catalog.get(&node_id) != Some(&next) {
                    batch.push(CommitOp::PutCatalog { id: node_id, row: next });
                }
            }

            debug!(node = %id, reparented = parent_changed, ops = batch.len(), "catalog node moved");
            batch.apply(stores);

            Ok(())
        })
    }

    /// Detach a leaf node, dropping every entity position that referenced it.
    pub fn detach(&self, id: &Truename) -> Result<(), CatalogError> {
        self.db.write(|stores| {
            let row = stores
                .catalog
                .get(id)
                .ok_or_else(|| CatalogError::UnknownNode { id: id.clone() })?
                .clone();

            let has_children = stores
                .catalog
                .values()
                .any(|r| r.parent.as_ref() == Some(id));
            if has_children {
                return Err(CatalogError::NotLeaf { id: id.clone() });
            }

            let mut batch = CommitBatch::new();
            for entity_id in stores.positions.entities_at(id) {
                if let Some(set) = stores.positions.get(&entity_id) {
                    let mut set = set.clone();
                    set.remove(id);
                    if set.is_empty() {
                        batch.push(CommitOp::RemovePositions { id: entity_id });
                    } else {
                        batch.push(CommitOp::PutPositions {
                            id: entity_id,
                            positions: set,
                        });
                    }
                }
            }
            batch.push(CommitOp::RemoveCatalog { id: id.clone() });

            let mut updated = BTreeMap::new();
            let siblings = sibling_order(stores, row.parent.as_ref(), Some(id));
            renumber(stores, &mut updated, &siblings);
            for (node_id, next) in updated {
                batch.push(CommitOp::PutCatalog { id: node_id, row: next });
            }

            debug!(node = %id, ops = batch.len(), "catalog node detached");
            batch.apply(stores);

            Ok(())
        })
    }

    /// Look up one node.
    #[must_use]
    pub fn node(&self, id: &Truename) -> Option<CatalogNode> {
        self.db
            .read(|stores| stores.catalog.get(id).map(|row| CatalogNode::view(id, row)))
    }

    /// Root nodes, ordered by weight.
    #[must_use]
    pub fn roots(&self) -> Vec<CatalogNode> {
        self.db.read(|stores| {
            ordered_views(stores, |row| row.parent.is_none())
        })
    }

    /// Direct children, ordered by weight.
    pub fn children(&self, id: &Truename) -> Result<Vec<CatalogNode>, CatalogError> {
        self.db.read(|stores| {
            require(stores, id)?;

            Ok(ordered_views(stores, |row| row.parent.as_ref() == Some(id)))
        })
    }

    /// The whole subtree below a node, depth-first with siblings in weight
    /// order, excluding the node itself.
    pub fn descendants(&self, id: &Truename) -> Result<Vec<CatalogNode>, CatalogError> {
        self.db.read(|stores| {
            require(stores, id)?;

            let mut out = Vec::new();
            collect_subtree(stores, id, &mut out);

            Ok(out)
        })
    }

    /// Direct parent, if any.
    pub fn parent(&self, id: &Truename) -> Result<Option<CatalogNode>, CatalogError> {
        self.db.read(|stores| {
            let row = require(stores, id)?;

            Ok(row.parent.as_ref().and_then(|parent_id| {
                stores
                    .catalog
                    .get(parent_id)
                    .map(|parent_row| CatalogNode::view(parent_id, parent_row))
            }))
        })
    }

    /// Ancestors from root to immediate parent, read straight off the
    /// materialized path.
    pub fn ancestors(&self, id: &Truename) -> Result<Vec<CatalogNode>, CatalogError> {
        self.db.read(|stores| {
            let row = require(stores, id)?;

            Ok(row.path[..row.path.len() - 1]
                .iter()
                .filter_map(|ancestor_id| {
                    stores
                        .catalog
                        .get(ancestor_id)
                        .map(|ancestor_row| CatalogNode::view(ancestor_id, ancestor_row))
                })
                .collect())
        })
    }

    /// Nodes sharing the parent, ordered by weight, excluding the node.
    pub fn siblings(&self, id: &Truename) -> Result<Vec<CatalogNode>, CatalogError> {
        self.db.read(|stores| {
            let row = require(stores, id)?;
            let parent = row.parent.clone();

            let mut group = ordered_views(stores, |r| r.parent == parent);
            group.retain(|node| node.id != *id);

            Ok(group)
        })
    }

    /// The node's materialized path, root first, including the node.
    pub fn path(&self, id: &Truename) -> Result<Vec<Truename>, CatalogError> {
        self.db.read(|stores| Ok(require(stores, id)?.path.clone()))
    }

    /// The sibling immediately before the node by weight.
    pub fn prev(&self, id: &Truename) -> Result<Option<CatalogNode>, CatalogError> {
        self.neighbor(id, false)
    }

    /// The sibling immediately after the node by weight.
    pub fn next(&self, id: &Truename) -> Result<Option<CatalogNode>, CatalogError> {
        self.neighbor(id, true)
    }

    /// Entities positioned at a node.
    pub fn entities_at(&self, id: &Truename) -> Result<Vec<EntityId>, CatalogError> {
        self.db.read(|stores| {
            require(stores, id)?;

            Ok(stores.positions.entities_at(id))
        })
    }

    fn neighbor(&self, id: &Truename, after: bool) -> Result<Option<CatalogNode>, CatalogError> {
        self.db.read(|stores| {
            let row = require(stores, id)?;
            let parent = row.parent.clone();

            let group = ordered_views(stores, |r| r.parent == parent);
            let at = group.iter().position(|node| node.id == *id);

            Ok(at.and_then(|at| {
                if after {
                    group.get(at + 1).cloned()
                } else {
                    at.checked_sub(1).and_then(|i| group.get(i).cloned())
                }
            }))
        })
    }
}

fn require<'a>(stores: &'a Stores, id: &Truename) -> Result<&'a CatalogRow, CatalogError> {
    stores
        .catalog
        .get(id)
        .ok_or_else(|| CatalogError::UnknownNode { id: id.clone() })
}

fn weight_of(stores: &Stores, id: &Truename) -> i64 {
    stores.catalog.get(id).map_or(0, |row| row.weight)
}

/// Children of `parent` in `(weight, id)` order, optionally excluding one.
fn sibling_order(
    stores: &Stores,
    parent: Option<&Truename>,
    exclude: Option<&Truename>,
) -> Vec<Truename> {
    let mut group: Vec<(i64, Truename)> = stores
        .catalog
        .iter()
        .filter(|(node_id, row)| {
            row.parent.as_ref() == parent && exclude.is_none_or(|ex| *node_id != ex)
        })
        .map(|(node_id, row)| (row.weight, node_id.clone()))
        .collect();
    group.sort();

    group.into_iter().map(|(_, node_id)| node_id).collect()
}

/// Assign dense weights 0..n to an ordered sibling group, merging over any
/// rows already rewritten earlier in the same prepare.
fn renumber(stores: &Stores, updated: &mut BTreeMap<Truename, CatalogRow>, order: &[Truename]) {
    for (weight, node_id) in (0..).zip(order) {
        let mut next = updated
            .get(node_id)
            .cloned()
            .or_else(|| stores.catalog.get(node_id).cloned());
        if let Some(row) = next.as_mut() {
            row.weight = weight;
            updated.insert(node_id.clone(), row.clone());
        }
    }
}

fn ordered_views(stores: &Stores, keep: impl Fn(&CatalogRow) -> bool) -> Vec<CatalogNode> {
    let mut group: Vec<CatalogNode> = stores
        .catalog
        .iter()
        .filter(|(_, row)| keep(row))
        .map(|(node_id, row)| CatalogNode::view(node_id, row))
        .collect();
    group.sort_by(|a, b| (a.weight, &a.id).cmp(&(b.weight, &b.id)));

    group
}

fn collect_subtree(stores: &Stores, id: &Truename, out: &mut Vec<CatalogNode>) {
    for child in ordered_views(stores, |row| row.parent.as_ref() == Some(id)) {
        let child_id = child.id.clone();
        out.push(child);
        collect_subtree(stores, &child_id, out);
    }
}
