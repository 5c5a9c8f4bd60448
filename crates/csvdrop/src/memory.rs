//! In-process collaborators
//!
//! Drop-in replacements for the cloud adapters. Each one counts its calls so
//! callers can assert what was (and was not) touched.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::EmployeeRecord;
use crate::ports::{
    NotificationError, NotificationSink, ObjectBody, ObjectError, ObjectStore, RecordStore,
    SecretError, SecretStore, StoreError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
    lookups: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, reference: impl Into<String>, value: impl Into<String>) -> Self {
        lock(&self.secrets).insert(reference.into(), value.into());
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, reference: &str) -> Result<String, SecretError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        lock(&self.secrets)
            .get(reference)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(reference.to_string()))
    }
}

type ObjectId = (String, String);

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<ObjectId, Vec<u8>>>,
    denied: Mutex<HashSet<ObjectId>>,
    opens: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, location: &str, key: &str, data: impl Into<Vec<u8>>) {
        lock(&self.objects).insert((location.to_string(), key.to_string()), data.into());
    }

    /// Make opening this object fail with `AccessDenied`
    pub fn deny(&self, location: &str, key: &str) {
        lock(&self.denied).insert((location.to_string(), key.to_string()));
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn open_object(&self, location: &str, key: &str) -> Result<ObjectBody, ObjectError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let id = (location.to_string(), key.to_string());

        if lock(&self.denied).contains(&id) {
            return Err(ObjectError::AccessDenied {
                location: id.0,
                key: id.1,
            });
        }

        match lock(&self.objects).get(&id) {
            Some(data) => Ok(Box::pin(std::io::Cursor::new(data.clone()))),
            None => Err(ObjectError::NotFound {
                location: id.0,
                key: id.1,
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<String, BTreeMap<String, EmployeeRecord>>>,
    failing_keys: Mutex<HashMap<String, StoreError>>,
    unreachable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of `key` fail with `error`
    pub fn fail_key(&self, key: &str, error: StoreError) {
        lock(&self.failing_keys).insert(key.to_string(), error);
    }

    /// Make every write fail as if the store were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn get(&self, table: &str, key: &str) -> Option<EmployeeRecord> {
        lock(&self.tables).get(table).and_then(|t| t.get(key)).cloned()
    }

    /// All records of a table, ordered by key
    pub fn records(&self, table: &str) -> Vec<EmployeeRecord> {
        lock(&self.tables)
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Attempted writes, successful or not
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(
        &self,
        table: &str,
        key: &str,
        record: &EmployeeRecord,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::unreachable("connection refused"));
        }
        if let Some(error) = lock(&self.failing_keys).get(key) {
            return Err(error.clone());
        }

        lock(&self.tables)
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), record.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub target: String,
    pub subject: String,
    pub message: String,
}

#[derive(Default)]
pub struct MemoryNotificationSink {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn send(
        &self,
        target: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError {
                target: target.to_string(),
                message: "topic does not exist".to_string(),
            });
        }

        lock(&self.sent).push(SentNotification {
            target: target.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
