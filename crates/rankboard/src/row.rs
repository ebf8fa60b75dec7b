//! Rows of a ranked table.
//!
//! A [`Row`] is addressed by its [`RowKey`] and rendered as an ordered list of
//! [`Cell`]s. Cells flagged `mutable` are the parts of a row expected to change
//! between two updates (rank, score). Everything else (a name, a school) is
//! considered immutable and is never faded on its own.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::markup;

/// Stable row identifier, the `id` attribute of the row element.
///
/// Arc-backed so timelines and plans can clone keys freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RowKey(Arc<str>);

impl RowKey {
    /// Build a key, stripping a leading `#` so CSS selectors (`#sb-12`) and
    /// bare ids (`sb-12`) name the same row.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RowError> {
        let raw = raw.as_ref().trim();
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        if raw.is_empty() {
            return Err(RowError::EmptyKey);
        }
        Ok(Self(raw.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RowKey {
    type Error = RowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RowKey> for String {
    fn from(key: RowKey) -> Self {
        key.0.to_string()
    }
}

impl TryFrom<&str> for RowKey {
    type Error = RowError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One column of a row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Class attribute, kept verbatim.
    #[serde(default)]
    pub class: String,
    /// Inner markup, kept verbatim.
    pub html: String,
    /// Whether this cell is faded out and back in when its value changes.
    #[serde(default)]
    pub mutable: bool,
}

impl Cell {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            class: String::new(),
            html: html.into(),
            mutable: false,
        }
    }

    pub fn mutable(html: impl Into<String>) -> Self {
        Self {
            mutable: true,
            ..Self::new(html)
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Visible text of the cell, tags removed.
    pub fn text(&self) -> String {
        markup::text_content(&self.html)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    key: RowKey,
    cells: SmallVec<[Cell; 4]>,
}

impl Row {
    pub fn new(key: RowKey, cells: impl IntoIterator<Item = Cell>) -> Result<Self, RowError> {
        let cells: SmallVec<[Cell; 4]> = cells.into_iter().collect();
        if cells.is_empty() {
            return Err(RowError::NoCells(key));
        }
        Ok(Self { key, cells })
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Indices of the cells declared mutable.
    pub fn mutable_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.mutable)
            .map(|(index, _)| index)
    }

    pub fn mutable_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(|cell| cell.mutable)
    }

    /// Same rendered content (markup, classes and mutability of every cell).
    /// Keys are not compared.
    pub fn same_content(&self, other: &Row) -> bool {
        self.cells == other.cells
    }

    /// Cell texts joined by a single space.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(Cell::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Key is empty once trimmed and stripped of `#`.
    EmptyKey,
    /// A row must have at least one cell.
    NoCells(RowKey),
    /// Two rows of the same list share a key.
    DuplicateKey(RowKey),
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::EmptyKey => write!(f, "row key is empty"),
            RowError::NoCells(key) => write!(f, "row '{}' has no cells", key),
            RowError::DuplicateKey(key) => write!(f, "duplicate row key '{}'", key),
        }
    }
}

impl std::error::Error for RowError {}
