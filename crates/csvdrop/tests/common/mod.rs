//! Shared harness for orchestrator integration tests
//!
//! Wires an [`Orchestrator`] to in-memory collaborators, a fixed clock and
//! a map-backed environment so every run is reproducible.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use csvdrop::config::{
    EnvLookup, NOTIFICATION_TARGET_VAR, SECRET_REFERENCE_VAR, TABLE_VAR,
};
use csvdrop::memory::{
    MemoryNotificationSink, MemoryObjectStore, MemoryRecordStore, MemorySecretStore,
};
use csvdrop::models::EmployeeRecord;
use csvdrop::ports::{RecordStore, StoreError};
use csvdrop::{Collaborators, IngestSettings, Orchestrator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const BUCKET: &str = "uploads";
pub const TABLE: &str = "employees";
pub const TOPIC: &str = "arn:aws:sns:eu-west-1:123456789012:csv-uploads";
pub const SECRET_NAME: &str = "csv/recipient";

pub const HEADER: &str = "id,first,middle,last,email,doc,ext";

/// Build a CSV body from a header line and data rows
pub fn csv(rows: &[&str]) -> String {
    let mut body = format!("{}\n", HEADER);
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    body
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub struct Harness {
    pub secrets: Arc<MemorySecretStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub records: Arc<MemoryRecordStore>,
    pub notifications: Arc<MemoryNotificationSink>,
    pub vars: HashMap<String, String>,
    pub settings: IngestSettings,
    record_store: Option<Arc<dyn RecordStore>>,
}

impl Harness {
    pub fn new() -> Self {
        let vars = [
            (SECRET_REFERENCE_VAR, SECRET_NAME),
            (NOTIFICATION_TARGET_VAR, TOPIC),
            (TABLE_VAR, TABLE),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            secrets: Arc::new(MemorySecretStore::new().with_secret(SECRET_NAME, "ops@example.com")),
            objects: Arc::new(MemoryObjectStore::new()),
            records: Arc::new(MemoryRecordStore::new()),
            notifications: Arc::new(MemoryNotificationSink::new()),
            vars,
            settings: IngestSettings::default(),
            record_store: None,
        }
    }

    pub fn put(&self, key: &str, body: impl Into<Vec<u8>>) {
        self.objects.put(BUCKET, key, body);
    }

    pub fn without_var(mut self, name: &str) -> Self {
        self.vars.remove(name);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.settings = self.settings.with_time_budget(budget);
        self
    }

    /// Put `store` in front of the memory record store
    pub fn with_record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let vars = self.vars.clone();
        let lookup: EnvLookup = Arc::new(move |name| vars.get(name).cloned());

        let collaborators = Collaborators {
            secrets: self.secrets.clone(),
            objects: self.objects.clone(),
            records: self
                .record_store
                .clone()
                .unwrap_or_else(|| self.records.clone() as Arc<dyn RecordStore>),
            notifications: self.notifications.clone(),
        };

        Orchestrator::new(collaborators, self.settings.clone())
            .with_env_lookup(lookup)
            .with_clock(Arc::new(fixed_time))
    }
}

/// Record store that takes `delay` per write before delegating
pub struct SlowRecordStore {
    pub inner: Arc<MemoryRecordStore>,
    pub delay: Duration,
}

#[async_trait]
impl RecordStore for SlowRecordStore {
    async fn upsert(
        &self,
        table: &str,
        key: &str,
        record: &EmployeeRecord,
    ) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert(table, key, record).await
    }
}
