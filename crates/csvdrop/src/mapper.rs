//! Row mapper and validator
//!
//! Pure function of `(row_index, row, processed_at)`: no I/O, no clock, no
//! logging. Validation is limited to column count and non-empty required
//! fields; email format and references are left to downstream consumers.

use chrono::{DateTime, Utc};

use crate::models::{EmployeeRecord, RawRow, RejectionReason, RowOutcome};
use crate::schema::{Schema, CANONICAL_SCHEMA};

#[derive(Debug, Clone, Copy)]
pub struct RowMapper {
    schema: &'static Schema,
}

impl Default for RowMapper {
    fn default() -> Self {
        Self::new(&CANONICAL_SCHEMA)
    }
}

impl RowMapper {
    pub fn new(schema: &'static Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Map one data row. Values are taken verbatim; extra trailing fields
    /// are ignored.
    pub fn map(&self, row_index: usize, row: &RawRow, processed_at: DateTime<Utc>) -> RowOutcome {
        let expected = self.schema.required_column_count();
        if row.len() < expected {
            return RowOutcome::Rejected {
                row_index,
                reason: RejectionReason::InsufficientColumns {
                    expected,
                    found: row.len(),
                },
            };
        }

        let mut record = EmployeeRecord::empty(processed_at);
        for column in self.schema.columns {
            let value = row.get(column.index).unwrap_or_default();
            if column.required && value.is_empty() {
                return RowOutcome::Rejected {
                    row_index,
                    reason: RejectionReason::MissingField(column.field),
                };
            }
            value.clone_into(record.field_mut(column.field));
        }

        RowOutcome::Accepted(record)
    }
}
