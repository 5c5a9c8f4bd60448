//! CSV row parser
//!
//! Turns the bytes of one object into a lazy sequence of [`RawRow`]s. The
//! first line is always a header and is dropped without looking at it, so a
//! header with the wrong number of columns is fine. Data rows may have any
//! number of fields; deciding whether that is enough is the mapper's job.

use csv::{ReaderBuilder, StringRecordsIntoIter};
use tracing::debug;

use crate::config::DEFAULT_DELIMITER;
use crate::error::FileParseError;
use crate::models::RawRow;

/// Parser for delimited text with a header line
#[derive(Debug, Clone, Copy)]
pub struct CsvRowParser {
    delimiter: u8,
}

impl Default for CsvRowParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl CsvRowParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Start iterating over the data rows of `data`.
    ///
    /// The whole buffer is checked to be UTF-8 text first, so a file that
    /// cannot be decoded fails here without yielding a single row.
    pub fn parse<'a>(&self, data: &'a [u8]) -> Result<RawRows<'a>, FileParseError> {
        if let Err(e) = std::str::from_utf8(data) {
            return Err(FileParseError::InvalidEncoding {
                valid_up_to: e.valid_up_to(),
            });
        }

        debug!(bytes = data.len(), delimiter = %char::from(self.delimiter), "Parsing CSV");

        let reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        Ok(RawRows {
            records: reader.into_records(),
            finished: false,
        })
    }
}

/// Lazy, non-restartable iterator over data rows.
///
/// Yields at most one error, after which it is exhausted.
pub struct RawRows<'a> {
    records: StringRecordsIntoIter<&'a [u8]>,
    finished: bool,
}

impl Iterator for RawRows<'_> {
    type Item = Result<RawRow, FileParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.records.next()? {
            Ok(record) => Some(Ok(RawRow::from(record))),
            Err(e) => {
                self.finished = true;
                Some(Err(FileParseError::Malformed(e)))
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn rows(data: &str) -> Vec<RawRow> {
        CsvRowParser::default()
            .parse(data.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_header_is_skipped() {
        let parsed = rows("id,first,middle,last,email,doc,ext\nE1,Ann,,Lee,ann@x.com,doc1,s3://b/d1\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].get(0), Some("E1"));
        assert_eq!(parsed[0].get(2), Some(""));
        assert_eq!(parsed[0].len(), 7);
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        assert!(rows("id,first\n").is_empty());
        assert!(rows("").is_empty());
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let parsed = rows("a,b,c\nE2,Bob\nE3,Cy,,Doe,c@x.com,d,e,extra\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].len(), 2);
        assert_eq!(parsed[1].len(), 8);
    }

    #[test]
    fn test_header_column_count_is_ignored() {
        let parsed = rows("just-one-column\nE1,Ann,,Lee,ann@x.com,doc1,ext\n");
        assert_eq!(parsed[0].len(), 7);
    }

    #[test]
    fn test_quoted_fields() {
        let parsed = rows("h\n\"E1\",\"Ann, Jr\",,Lee,a@x.com,\"doc \"\"1\"\"\",ext\n");
        assert_eq!(parsed[0].get(1), Some("Ann, Jr"));
        assert_eq!(parsed[0].get(5), Some("doc \"1\""));
    }

    #[test]
    fn test_custom_delimiter() {
        let parsed: Vec<RawRow> = CsvRowParser::new(b';')
            .parse(b"h;h\nE1;Ann;;Lee;a@x.com;d;e\n")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(parsed[0].len(), 7);
        assert_eq!(parsed[0].get(3), Some("Lee"));
    }

    #[test]
    fn test_invalid_utf8_fails_whole_file() {
        let data = b"id,first\nE1,Ann\nE2,\xff\xfe\n";
        let err = CsvRowParser::default().parse(data).err().unwrap();
        assert!(matches!(err, FileParseError::InvalidEncoding { valid_up_to: 19 }));
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = rows("id,first\r\nE1,Ann,,Lee,a@x.com,d,e\r\nE2,Bo\r\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].get(6), Some("e"));
    }
}
