//! Record writer
//!
//! One record, one upsert keyed by employee id. Writing the same record twice
//! leaves the table as writing it once, so the whole file can be replayed.

use std::sync::Arc;
use tracing::debug;

use crate::error::WriteError;
use crate::models::EmployeeRecord;
use crate::ports::RecordStore;

#[derive(Clone)]
pub struct RecordWriter {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn write(&self, row_index: usize, record: &EmployeeRecord) -> Result<(), WriteError> {
        self.store
            .upsert(&self.table, &record.employee_id, record)
            .await
            .map_err(|source| WriteError {
                employee_id: record.employee_id.clone(),
                row_index,
                source,
            })?;

        debug!(
            table = %self.table,
            employee_id = %record.employee_id,
            row_index,
            "Record upserted"
        );
        Ok(())
    }
}
