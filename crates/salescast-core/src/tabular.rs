//! Comma-delimited text tables.
//!
//! Lines are split on every comma, with no quoting and no escaping. A cell
//! value that itself contains a comma is split into two cells; the extra
//! cell shifts into the next column or is dropped when it runs past the
//! last header.

use crate::error::{Result, SalescastError};
use crate::types::Row;

/// Field delimiter of the table format.
pub const DELIMITER: u8 = b',';

/// Parse a delimited table into rows keyed by the header line.
///
/// Returns an empty vector when the trimmed input has fewer than two
/// non-empty lines. Lines holding only whitespace are skipped; a line of
/// bare delimiters still counts. Headers and values are trimmed. A header
/// without a corresponding value maps to the empty string; values past the
/// last header are ignored.
pub fn parse(text: &str) -> Vec<Row> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(DELIMITER)
        .from_reader(text.trim().as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        // Input is &str, so only malformed UTF-8 could fail here.
        let Ok(record) = result else { continue };
        if is_blank(&record) {
            continue;
        }

        match &headers {
            None => headers = Some(record.iter().map(|h| h.trim().to_string()).collect()),
            Some(columns) => {
                let row: Row = columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let value = record.get(i).map(str::trim).unwrap_or("");
                        (column.clone(), value.to_string())
                    })
                    .collect();
                rows.push(row);
            }
        }
    }

    rows
}

/// Serialize rows back into the delimited format.
///
/// The header line is taken from the first row's keys. Values are written
/// verbatim, so `parse(serialize(rows)) == rows` holds only for values that
/// contain no delimiter, no line break and no surrounding whitespace.
pub fn serialize(rows: &[Row]) -> Result<String> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&headers)?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|h| row.get(*h).map(String::as_str).unwrap_or("")),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SalescastError::Codec(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SalescastError::Codec(e.to_string()))
}

// A whitespace-only line reads as a single field; any delimiter makes two.
fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|field| field.trim().is_empty())
}
