//! Canonical record schema
//!
//! The column layout is a data table, not code: each entry says which CSV
//! column feeds which record attribute and whether the value may be blank.
//! Adding a column means adding a row here and a field to
//! [`EmployeeRecord`](crate::models::EmployeeRecord).
//!
//! Only the seven-column employee layout is supported. The older two-column
//! `filename`/`bucket` layout is superseded.

use serde::Serialize;

/// Revision of the column layout below
pub const SCHEMA_VERSION: u32 = 2;

/// Attributes of an employee record that come from CSV columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    EmployeeId,
    FirstName,
    MiddleName,
    LastName,
    Email,
    DocumentName,
    ExternalStorageRef,
}

impl Field {
    /// Attribute name as stored and reported
    pub fn name(self) -> &'static str {
        match self {
            Field::EmployeeId => "employeeId",
            Field::FirstName => "firstName",
            Field::MiddleName => "middleName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::DocumentName => "documentName",
            Field::ExternalStorageRef => "externalStorageRef",
        }
    }
}

/// One `(column_index, field, required)` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub index: usize,
    pub field: Field,
    /// Required columns must be non-empty
    pub required: bool,
}

impl ColumnSpec {
    const fn new(index: usize, field: Field, required: bool) -> Self {
        Self {
            index,
            field,
            required,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub version: u32,
    pub columns: &'static [ColumnSpec],
    /// Field used as the store key
    pub key: Field,
}

impl Schema {
    /// Minimum number of fields a row needs to be mapped
    pub fn required_column_count(&self) -> usize {
        self.columns.iter().map(|c| c.index + 1).max().unwrap_or(0)
    }

    pub fn column(&self, field: Field) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }
}

pub const CANONICAL_SCHEMA: Schema = Schema {
    version: SCHEMA_VERSION,
    columns: &[
        ColumnSpec::new(0, Field::EmployeeId, true),
        ColumnSpec::new(1, Field::FirstName, false),
        ColumnSpec::new(2, Field::MiddleName, false),
        ColumnSpec::new(3, Field::LastName, false),
        ColumnSpec::new(4, Field::Email, false),
        ColumnSpec::new(5, Field::DocumentName, false),
        ColumnSpec::new(6, Field::ExternalStorageRef, false),
    ],
    key: Field::EmployeeId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_requires_seven_columns() {
        assert_eq!(CANONICAL_SCHEMA.required_column_count(), 7);
    }

    #[test]
    fn test_only_key_is_required() {
        let required: Vec<Field> = CANONICAL_SCHEMA
            .columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.field)
            .collect();
        assert_eq!(required, vec![Field::EmployeeId]);
        assert_eq!(CANONICAL_SCHEMA.key, Field::EmployeeId);
    }

    #[test]
    fn test_column_indexes_are_dense_and_ordered() {
        for (position, column) in CANONICAL_SCHEMA.columns.iter().enumerate() {
            assert_eq!(column.index, position);
        }
    }

    #[test]
    fn test_column_lookup() {
        let column = CANONICAL_SCHEMA.column(Field::Email);
        assert_eq!(column.map(|c| c.index), Some(4));
        assert_eq!(Field::ExternalStorageRef.name(), "externalStorageRef");
    }
}
