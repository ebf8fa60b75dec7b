//! Server-rendered row markup.
//!
//! The scoreboard endpoint renders each row as a `<tr id="sb-12">` fragment
//! with one `<td>` (or `<th>`) per column. Cells whose class list contains
//! the mutable class become mutable [`Cell`]s. Inner cell markup is sliced
//! out of the source verbatim, never re-serialized.

use std::fmt;

use quick_xml::escape::{escape, resolve_predefined_entity};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

use crate::row::{Cell, Row, RowError, RowKey};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupError {
    /// The reader failed at a byte position.
    Syntax { position: u64, message: String },
    /// No `<tr>` element in the fragment.
    MissingRow,
    /// The `<tr>` has no `id` attribute.
    MissingKey,
    /// The fragment ended inside a cell or before `</tr>`.
    Unterminated,
    Row(RowError),
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupError::Syntax { position, message } => {
                write!(f, "malformed row markup at byte {}: {}", position, message)
            }
            MarkupError::MissingRow => write!(f, "row markup has no <tr> element"),
            MarkupError::MissingKey => write!(f, "row markup has no id attribute"),
            MarkupError::Unterminated => write!(f, "row markup ends before </tr>"),
            MarkupError::Row(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for MarkupError {}

impl From<RowError> for MarkupError {
    fn from(error: RowError) -> Self {
        MarkupError::Row(error)
    }
}

/// Cells and key attribute of a row fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub key: Option<RowKey>,
    pub cells: Vec<Cell>,
}

struct OpenCell {
    class: String,
    start: usize,
    depth: usize,
}

fn is_cell(name: &[u8]) -> bool {
    name.eq_ignore_ascii_case(b"td") || name.eq_ignore_ascii_case(b"th")
}

fn is_row(name: &[u8]) -> bool {
    name.eq_ignore_ascii_case(b"tr")
}

/// Raw value of an attribute, HTML-style attributes allowed.
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .html_attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref().eq_ignore_ascii_case(name))
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn has_class(class: &str, wanted: &str) -> bool {
    class.split_whitespace().any(|name| name == wanted)
}

fn cell_from(class: String, html: &str, mutable_class: &str) -> Cell {
    Cell {
        mutable: has_class(&class, mutable_class),
        class,
        html: html.to_string(),
    }
}

/// A reader lenient enough for HTML fragments.
fn html_reader(html: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    // Cell bodies may hold unclosed tags like <br> and bare ampersands.
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    reader
}

/// Parse a `<tr>` fragment. Anything after `</tr>` is ignored.
pub fn parse_cells(html: &str, mutable_class: &str) -> Result<ParsedRow, MarkupError> {
    let mut reader = html_reader(html);
    let mut key = None;
    let mut in_row = false;
    let mut cells = Vec::new();
    let mut open: Option<OpenCell> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|error| MarkupError::Syntax {
            position: reader.error_position() as u64,
            message: error.to_string(),
        })?;
        match event {
            Event::Start(element) => {
                let name = element.local_name();
                if let Some(cell) = open.as_mut() {
                    if is_cell(name.as_ref()) {
                        cell.depth += 1;
                    }
                } else if is_row(name.as_ref()) && !in_row {
                    in_row = true;
                    key = attribute(&element, b"id").map(RowKey::new).transpose()?;
                } else if is_cell(name.as_ref()) && in_row {
                    open = Some(OpenCell {
                        class: attribute(&element, b"class").unwrap_or_default(),
                        start: reader.buffer_position() as usize,
                        depth: 1,
                    });
                }
            }
            Event::Empty(element) => {
                let name = element.local_name();
                if open.is_none() && in_row && is_cell(name.as_ref()) {
                    let class = attribute(&element, b"class").unwrap_or_default();
                    cells.push(cell_from(class, "", mutable_class));
                } else if open.is_none() && !in_row && is_row(name.as_ref()) {
                    key = attribute(&element, b"id").map(RowKey::new).transpose()?;
                    return Ok(ParsedRow { key, cells });
                }
            }
            Event::End(element) => {
                let name = element.local_name();
                if is_cell(name.as_ref()) {
                    if let Some(mut cell) = open.take() {
                        cell.depth -= 1;
                        if cell.depth == 0 {
                            let inner = &html[cell.start..before];
                            cells.push(cell_from(cell.class, inner, mutable_class));
                        } else {
                            open = Some(cell);
                        }
                    }
                } else if is_row(name.as_ref()) && in_row && open.is_none() {
                    return Ok(ParsedRow { key, cells });
                }
            }
            Event::Eof => {
                return Err(if in_row {
                    MarkupError::Unterminated
                } else {
                    MarkupError::MissingRow
                });
            }
            _ => {}
        }
    }
}

/// Parse a `<tr id="…">` fragment into a row.
pub fn parse_row(html: &str, mutable_class: &str) -> Result<Row, MarkupError> {
    let parsed = parse_cells(html, mutable_class)?;
    let key = parsed.key.ok_or(MarkupError::MissingKey)?;
    Ok(Row::new(key, parsed.cells)?)
}

/// `<td>` elements of a row, as inner markup of a `<tr>`.
pub fn render_cells(row: &Row) -> String {
    let mut html = String::new();
    for cell in row.cells() {
        if cell.class.is_empty() {
            html.push_str("<td>");
        } else {
            html.push_str("<td class=\"");
            html.push_str(&escape(cell.class.as_str()));
            html.push_str("\">");
        }
        html.push_str(&cell.html);
        html.push_str("</td>");
    }
    html
}

pub fn render_row(row: &Row) -> String {
    format!(
        "<tr id=\"{}\">{}</tr>",
        escape(row.key().as_str()),
        render_cells(row)
    )
}

/// Text of a markup fragment: tags dropped, character and HTML entity
/// references resolved, whitespace collapsed.
pub fn text_content(html: &str) -> String {
    let mut reader = html_reader(html);
    let mut text = String::with_capacity(html.len());
    loop {
        match reader.read_event() {
            Ok(Event::Text(raw)) => {
                if let Ok(decoded) = raw.decode() {
                    text.push_str(&decoded);
                }
            }
            Ok(Event::CData(raw)) => {
                if let Ok(decoded) = raw.decode() {
                    text.push_str(&decoded);
                }
            }
            Ok(Event::GeneralRef(reference)) => push_reference(&mut text, &reference),
            Ok(Event::Start(_) | Event::End(_) | Event::Empty(_)) => text.push(' '),
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_reference(text: &mut String, reference: &BytesRef<'_>) {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        text.push(ch);
        return;
    }
    let Ok(name) = reference.decode() else {
        return;
    };
    match resolve_predefined_entity(&name) {
        Some(value) => text.push_str(value),
        // Unknown entities stay as written.
        None => {
            text.push('&');
            text.push_str(&name);
            text.push(';');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"<tr id="sb-12">
        <td class="sb-rank sb-update">3</td>
        <td class="sb-name"><a href="/user/12">alice</a></td>
        <td class="sb-update">1&nbsp;200</td>
    </tr>"#;

    #[test]
    fn parses_cells_and_key() {
        let row = parse_row(ROW, "sb-update").unwrap();
        assert_eq!(row.key().as_str(), "sb-12");
        assert_eq!(row.cell_count(), 3);
        assert_eq!(row.mutable_indices().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(row.cells()[1].html, r#"<a href="/user/12">alice</a>"#);
        assert_eq!(row.cells()[1].class, "sb-name");
        assert_eq!(row.cells()[2].text(), "1 200");
    }

    #[test]
    fn unclosed_inline_tags_stay_inside_cell() {
        let row = parse_row(r#"<tr id="a"><td>x<br>y</td><td class="sb-update">1</td></tr>"#, "sb-update")
            .unwrap();
        assert_eq!(row.cells()[0].html, "x<br>y");
        assert!(row.cells()[1].mutable);
    }

    #[test]
    fn empty_cell_elements() {
        let row = parse_row(r#"<tr id="a"><td/><td class="sb-update"></td></tr>"#, "sb-update").unwrap();
        assert_eq!(row.cell_count(), 2);
        assert_eq!(row.cells()[0].html, "");
        assert!(row.cells()[1].mutable);
    }

    #[test]
    fn class_match_is_whole_word() {
        let row = parse_row(r#"<tr id="a"><td class="sb-updated">1</td></tr>"#, "sb-update").unwrap();
        assert!(!row.cells()[0].mutable);
    }

    #[test]
    fn missing_pieces_are_errors() {
        assert_eq!(parse_row("<div>no row</div>", "sb-update"), Err(MarkupError::MissingRow));
        assert_eq!(parse_row("<tr><td>1</td></tr>", "sb-update"), Err(MarkupError::MissingKey));
        assert_eq!(
            parse_row(r#"<tr id="a"><td>1</td>"#, "sb-update"),
            Err(MarkupError::Unterminated)
        );
        assert!(matches!(
            parse_row(r#"<tr id="a"></tr>"#, "sb-update"),
            Err(MarkupError::Row(RowError::NoCells(_)))
        ));
    }

    #[test]
    fn render_then_parse_keeps_cells() {
        let row = parse_row(ROW, "sb-update").unwrap();
        let again = parse_row(&render_row(&row), "sb-update").unwrap();
        assert!(row.same_content(&again));
        assert_eq!(again.key(), row.key());
    }

    #[test]
    fn text_content_strips_tags() {
        assert_eq!(text_content("<b>Tom</b> &amp; <i>Jerry</i>"), "Tom & Jerry");
    }

    #[test]
    fn text_content_resolves_html_entities() {
        assert_eq!(text_content("caf&eacute; &#8594; &hellip;"), "caf\u{e9} \u{2192} \u{2026}");
        assert_eq!(text_content("x&#x41;y"), "xAy");
        assert_eq!(text_content("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn text_content_keeps_bare_ampersands() {
        assert_eq!(text_content("Tom & Jerry<br>"), "Tom & Jerry");
    }

    #[test]
    fn cell_text_may_hold_bare_ampersands() {
        let row = parse_row(r#"<tr id="a"><td>R & D</td></tr>"#, "sb-update").unwrap();
        assert_eq!(row.cells()[0].html, "R & D");
    }
}
