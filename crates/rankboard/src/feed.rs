//! JSON wire format of scoreboard updates.
//!
//! A feed is a JSON array, one entry per row in display order. Two entry
//! shapes are accepted and may be mixed:
//!
//! ```json
//! [
//!   {"id": "#sb-12", "html": "<tr id=\"sb-12\"><td class=\"sb-update\">1</td>…</tr>"},
//!   {"key": "sb-7", "cells": [{"class": "sb-update", "html": "2", "mutable": true}]}
//! ]
//! ```
//!
//! The first is what the scoreboard endpoint serves; the second skips markup
//! parsing. Encoding always produces the structured shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markup::{self, MarkupError};
use crate::row::{Cell, Row, RowError, RowKey};
use crate::snapshot::Update;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedEntry {
    Markup { id: String, html: String },
    Cells { key: RowKey, cells: Vec<Cell> },
}

impl FeedEntry {
    pub fn from_row(row: &Row) -> Self {
        FeedEntry::Cells {
            key: row.key().clone(),
            cells: row.cells().to_vec(),
        }
    }

    pub fn into_row(self, mutable_class: &str) -> Result<Row, FeedError> {
        match self {
            FeedEntry::Markup { id, html } => {
                let key = RowKey::new(&id)?;
                let parsed = markup::parse_cells(&html, mutable_class).map_err(|source| {
                    FeedError::Markup {
                        key: key.clone(),
                        source,
                    }
                })?;
                if let Some(found) = parsed.key {
                    if found != key {
                        return Err(FeedError::KeyMismatch { id: key, found });
                    }
                }
                Ok(Row::new(key, parsed.cells)?)
            }
            FeedEntry::Cells { key, cells } => Ok(Row::new(key, cells)?),
        }
    }
}

#[derive(Debug)]
pub enum FeedError {
    Json(serde_json::Error),
    Markup { key: RowKey, source: MarkupError },
    /// The entry `id` and the `<tr id>` disagree.
    KeyMismatch { id: RowKey, found: RowKey },
    Row(RowError),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Json(error) => write!(f, "invalid feed JSON: {}", error),
            FeedError::Markup { key, source } => write!(f, "row '{}': {}", key, source),
            FeedError::KeyMismatch { id, found } => {
                write!(f, "feed entry '{}' renders a row with id '{}'", id, found)
            }
            FeedError::Row(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Json(error) => Some(error),
            FeedError::Markup { source, .. } => Some(source),
            FeedError::Row(error) => Some(error),
            FeedError::KeyMismatch { .. } => None,
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(error: serde_json::Error) -> Self {
        FeedError::Json(error)
    }
}

impl From<RowError> for FeedError {
    fn from(error: RowError) -> Self {
        FeedError::Row(error)
    }
}

pub fn decode_rows(json: &str, mutable_class: &str) -> Result<Vec<Row>, FeedError> {
    let entries: Vec<FeedEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .map(|entry| entry.into_row(mutable_class))
        .collect()
}

pub fn decode_update(json: &str, mutable_class: &str) -> Result<Update, FeedError> {
    Ok(Update::from_rows(decode_rows(json, mutable_class)?)?)
}

pub fn encode_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Result<String, FeedError> {
    let entries: Vec<FeedEntry> = rows.into_iter().map(FeedEntry::from_row).collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_shape() {
        let json = r##"[
            {"id": "#sb-1", "html": "<tr id=\"sb-1\"><td class=\"sb-update\">1</td><td>bob</td></tr>"},
            {"id": "#sb-2", "html": "<tr id=\"sb-2\"><td class=\"sb-update\">2</td><td>eve</td></tr>"}
        ]"##;
        let update = decode_update(json, "sb-update").unwrap();
        let keys: Vec<_> = update.keys().map(RowKey::as_str).collect();
        assert_eq!(keys, vec!["sb-1", "sb-2"]);
        let first = update.get(&RowKey::new("sb-1").unwrap()).unwrap();
        assert!(first.cells()[0].mutable);
        assert_eq!(first.cells()[1].html, "bob");
    }

    #[test]
    fn decodes_structured_shape() {
        let json = r#"[{"key": "sb-3", "cells": [{"html": "4", "mutable": true}, {"html": "ann"}]}]"#;
        let rows = decode_rows(json, "sb-update").unwrap();
        assert_eq!(rows[0].mutable_indices().collect::<Vec<_>>(), vec![0]);
        assert_eq!(rows[0].cells()[1].class, "");
    }

    #[test]
    fn mismatched_ids_are_rejected() {
        let json = r##"[{"id": "#sb-1", "html": "<tr id=\"sb-9\"><td>1</td></tr>"}]"##;
        assert!(matches!(
            decode_rows(json, "sb-update"),
            Err(FeedError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn bad_markup_names_the_row() {
        let json = r#"[{"id": "sb-1", "html": "<tr id=\"sb-1\"><td>1</td>"}]"#;
        let error = decode_rows(json, "sb-update").unwrap_err();
        assert_eq!(error.to_string(), "row 'sb-1': row markup ends before </tr>");
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let json = r#"[{"key": "a", "cells": [{"html": "1"}]}, {"key": "a", "cells": [{"html": "2"}]}]"#;
        assert!(matches!(
            decode_update(json, "sb-update"),
            Err(FeedError::Row(RowError::DuplicateKey(_)))
        ));
    }

    #[test]
    fn encoded_feed_decodes_to_same_rows() {
        let json = r#"[{"key": "a", "cells": [{"class": "sb-update", "html": "1", "mutable": true}]}]"#;
        let rows = decode_rows(json, "sb-update").unwrap();
        let again = decode_rows(&encode_rows(&rows).unwrap(), "sb-update").unwrap();
        assert_eq!(rows, again);
    }
}
