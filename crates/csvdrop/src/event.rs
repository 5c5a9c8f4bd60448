//! Trigger event decoding
//!
//! Reads S3 event notification documents:
//!
//! ```json
//! { "Records": [ { "s3": { "bucket": { "name": "uploads" },
//!                          "object": { "key": "hr/staff+2024.csv" } } } ] }
//! ```
//!
//! S3 form-encodes object keys in events (`+` for space, `%XX` escapes), so
//! keys are decoded before use.

use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::error::EventError;
use crate::models::FileArrival;

#[derive(Debug, Deserialize)]
struct EventDocument {
    #[serde(rename = "Records", default)]
    records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Decode an event document into file arrivals, in record order
pub fn parse_event(document: &str) -> Result<Vec<FileArrival>, EventError> {
    let event: EventDocument = serde_json::from_str(document)?;

    event
        .records
        .into_iter()
        .map(|record| {
            let key = decode_key(&record.s3.object.key)?;
            Ok(FileArrival::new(record.s3.bucket.name, key))
        })
        .collect()
}

fn decode_key(raw: &str) -> Result<String, EventError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| EventError::InvalidKey(raw.to_string()))
}
