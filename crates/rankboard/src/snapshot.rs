//! Keyed, ordered lists of rows.
//!
//! [`Snapshot`] is what the container currently shows; [`Update`] is the full
//! state the server wants shown next. Both keep insertion order as position
//! order and refuse duplicate keys on construction, so the uniqueness
//! invariant holds for every value of either type.

use indexmap::IndexMap;

use crate::row::{Row, RowError, RowKey};

fn index_rows(rows: impl IntoIterator<Item = Row>) -> Result<IndexMap<RowKey, Row>, RowError> {
    let mut indexed = IndexMap::new();
    for row in rows {
        let key = row.key().clone();
        if indexed.insert(key.clone(), row).is_some() {
            return Err(RowError::DuplicateKey(key));
        }
    }
    Ok(indexed)
}

/// The rows currently attached to the container, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    rows: IndexMap<RowKey, Row>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Result<Self, RowError> {
        Ok(Self {
            rows: index_rows(rows)?,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index_of(&self, key: &RowKey) -> Option<usize> {
        self.rows.get_index_of(key)
    }

    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn get_index(&self, index: usize) -> Option<&Row> {
        self.rows.get_index(index).map(|(_, row)| row)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RowKey> + '_ {
        self.rows.keys()
    }

    /// Cell count shared by the rows, taken from the first row.
    pub fn column_count(&self) -> Option<usize> {
        self.get_index(0).map(Row::cell_count)
    }
}

/// Full desired next state of a list, addressed by key.
///
/// Partial updates are not a thing: a key missing from an update is a row to
/// remove.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    rows: IndexMap<RowKey, Row>,
}

impl Update {
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Result<Self, RowError> {
        Ok(Self {
            rows: index_rows(rows)?,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index_of(&self, key: &RowKey) -> Option<usize> {
        self.rows.get_index_of(key)
    }

    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RowKey> + '_ {
        self.rows.keys()
    }

    pub fn column_count(&self) -> Option<usize> {
        self.rows.get_index(0).map(|(_, row)| row.cell_count())
    }

    /// The snapshot this update describes once applied.
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot { rows: self.rows }
    }
}

impl From<Snapshot> for Update {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            rows: snapshot.rows,
        }
    }
}
