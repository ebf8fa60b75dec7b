//! Row classification between a snapshot and an update.
//!
//! For every key present on both sides `delta = old_index - new_index`:
//!
//! ```text
//! delta > 0                      → MovedUp         (towards the top)
//! delta < 0                      → MovedDown
//! delta == 0, content differs    → ChangedInPlace
//! delta == 0, content identical  → Unchanged       (no DOM mutation)
//! ```
//!
//! Keys only in the update are `Inserted`, keys only in the snapshot are
//! `Removed`.

use std::fmt;

use crate::row::RowKey;
use crate::snapshot::{Snapshot, Update};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    MovedUp,
    MovedDown,
    ChangedInPlace,
    Unchanged,
    Inserted,
    Removed,
}

impl Classification {
    pub fn is_move(self) -> bool {
        matches!(self, Classification::MovedUp | Classification::MovedDown)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::MovedUp => "moved up",
            Classification::MovedDown => "moved down",
            Classification::ChangedInPlace => "changed in place",
            Classification::Unchanged => "unchanged",
            Classification::Inserted => "inserted",
            Classification::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// Classification of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange {
    pub key: RowKey,
    pub class: Classification,
    pub old_index: Option<usize>,
    pub new_index: Option<usize>,
}

impl RowChange {
    /// `old_index - new_index`, for keys present on both sides.
    pub fn delta(&self) -> Option<isize> {
        Some(self.old_index? as isize - self.new_index? as isize)
    }
}

/// Classification of every key of a reconciliation.
///
/// Changes come in update order, followed by removals in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    changes: Vec<RowChange>,
}

impl Plan {
    pub fn changes(&self) -> &[RowChange] {
        &self.changes
    }

    pub fn get(&self, key: &RowKey) -> Option<&RowChange> {
        self.changes.iter().find(|change| &change.key == key)
    }

    pub fn class_of(&self, key: &RowKey) -> Option<Classification> {
        self.get(key).map(|change| change.class)
    }

    pub fn count(&self, class: Classification) -> usize {
        self.changes.iter().filter(|change| change.class == class).count()
    }

    /// Nothing to animate: every key is `Unchanged`.
    pub fn is_noop(&self) -> bool {
        self.changes
            .iter()
            .all(|change| change.class == Classification::Unchanged)
    }
}

pub fn classify(snapshot: &Snapshot, update: &Update) -> Plan {
    let mut changes = Vec::with_capacity(update.len());

    for (new_index, row) in update.rows().enumerate() {
        let key = row.key().clone();
        let change = match snapshot.index_of(&key) {
            None => RowChange {
                key,
                class: Classification::Inserted,
                old_index: None,
                new_index: Some(new_index),
            },
            Some(old_index) => {
                let class = if old_index > new_index {
                    Classification::MovedUp
                } else if old_index < new_index {
                    Classification::MovedDown
                } else if snapshot
                    .get_index(old_index)
                    .is_some_and(|old| old.same_content(row))
                {
                    Classification::Unchanged
                } else {
                    Classification::ChangedInPlace
                };
                RowChange {
                    key,
                    class,
                    old_index: Some(old_index),
                    new_index: Some(new_index),
                }
            }
        };
        changes.push(change);
    }

    for (old_index, key) in snapshot.keys().enumerate() {
        if update.index_of(key).is_none() {
            changes.push(RowChange {
                key: key.clone(),
                class: Classification::Removed,
                old_index: Some(old_index),
                new_index: None,
            });
        }
    }

    Plan { changes }
}
