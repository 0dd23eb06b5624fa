//! CSV exchange format: a `Word,Definition` header followed by one row per entry.

use crate::error::{MementoError, Result};
use crate::debug_log;
use std::io::{Read, Write};

pub const WORD_COLUMN: &str = "Word";
pub const DEFINITION_COLUMN: &str = "Definition";

/// Read every data row from a CSV source.
///
/// The header must name both a `Word` and a `Definition` column; other
/// columns are ignored. Rows are returned as found, untrimmed, with a
/// missing cell read as an empty string. Nothing is returned unless the
/// whole source parses.
pub fn read_rows<R: Read>(source: R) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(word_idx), Some(definition_idx)) = (column(WORD_COLUMN), column(DEFINITION_COLUMN))
    else {
        return Err(MementoError::MalformedInput(format!(
            "CSV must have '{WORD_COLUMN}' and '{DEFINITION_COLUMN}' columns"
        )));
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let word = record.get(word_idx).unwrap_or_default().to_string();
        let definition = record.get(definition_idx).unwrap_or_default().to_string();
        rows.push((word, definition));
    }
    debug_log!("read {} CSV rows", rows.len());
    Ok(rows)
}

/// Write the header and one row per pair, exactly as given.
pub fn write_rows<'a, W, I>(sink: W, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record([WORD_COLUMN, DEFINITION_COLUMN])?;
    for (word, definition) in rows {
        writer.write_record([word, definition])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(word: &str, definition: &str) -> (String, String) {
        (word.to_string(), definition.to_string())
    }

    #[test]
    fn test_read_rows_basic() {
        let data = "Word,Definition\nalpha,first\nbeta,second\n";
        let rows = read_rows(data.as_bytes()).expect("parse");
        assert_eq!(rows, vec![pair("alpha", "first"), pair("beta", "second")]);
    }

    #[test]
    fn test_read_rows_columns_located_by_name() {
        let data = "Notes,Definition,Word\nx,first,alpha\n";
        let rows = read_rows(data.as_bytes()).expect("parse");
        assert_eq!(rows, vec![pair("alpha", "first")]);
    }

    #[test]
    fn test_read_rows_quoted_fields() {
        let data = "Word,Definition\n\"ennui\",\"boredom, listlessness\"\n";
        let rows = read_rows(data.as_bytes()).expect("parse");
        assert_eq!(rows, vec![pair("ennui", "boredom, listlessness")]);
    }

    #[test]
    fn test_read_rows_short_row_reads_empty_cell() {
        let data = "Word,Definition\nlonely\n";
        let rows = read_rows(data.as_bytes()).expect("parse");
        assert_eq!(rows, vec![pair("lonely", "")]);
    }

    #[test]
    fn test_read_rows_missing_column_rejected() {
        let data = "Term,Meaning\nalpha,first\n";
        let err = read_rows(data.as_bytes()).unwrap_err();
        assert!(matches!(err, MementoError::MalformedInput(_)));
    }

    #[test]
    fn test_read_rows_header_is_case_sensitive() {
        let data = "word,definition\nalpha,first\n";
        assert!(read_rows(data.as_bytes()).is_err());
    }

    #[test]
    fn test_write_rows_quotes_when_needed() {
        let mut out = Vec::new();
        write_rows(&mut out, [("ennui", "boredom, listlessness"), ("cat", "feline")])
            .expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "Word,Definition\nennui,\"boredom, listlessness\"\ncat,feline\n"
        );
    }

    #[test]
    fn test_write_rows_empty_has_header_only() {
        let mut out = Vec::new();
        write_rows(&mut out, std::iter::empty::<(&str, &str)>()).expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "Word,Definition\n");
    }
}
