//! Configuration resolution
//!
//! Two kinds of configuration exist:
//!
//! - [`IngestSettings`]: how files are read (delimiter, time budget). Optional
//!   variables with defaults, read once at startup.
//! - [`ResolvedConfig`]: where records and notifications go. Required
//!   variables plus a secret, resolved at the start of every invocation by
//!   [`ConfigResolver`].
//!
//! Blank values count as missing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::ports::SecretStore;

/// Reference of the secret holding the notification recipient
pub const SECRET_REFERENCE_VAR: &str = "SNS_SECRET_NAME";

/// Opaque destination for the per-file notification
pub const NOTIFICATION_TARGET_VAR: &str = "SNS_TOPIC_ARN";

/// Destination table for employee records
pub const TABLE_VAR: &str = "DDB_TABLE_NAME";

pub const DELIMITER_VAR: &str = "CSV_DELIMITER";

pub const TIME_BUDGET_VAR: &str = "INGEST_TIME_BUDGET_SECS";

pub const DEFAULT_DELIMITER: u8 = b',';

/// Variable lookup; the process environment in production
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by `std::env`
pub fn process_env() -> EnvLookup {
    Arc::new(|name| std::env::var(name).ok())
}

fn non_blank(lookup: &EnvLookup, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Settings that shape how files are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub delimiter: u8,
    /// Wall-clock budget for one invocation; unbounded when `None`
    pub time_budget: Option<Duration>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            time_budget: None,
        }
    }
}

impl IngestSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env())
    }

    pub fn from_lookup(lookup: &EnvLookup) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(raw) = non_blank(lookup, DELIMITER_VAR) {
            settings.delimiter = parse_delimiter(&raw)?;
        }

        if let Some(raw) = non_blank(lookup, TIME_BUDGET_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeBudget(raw.clone()))?;
            settings.time_budget = Some(Duration::from_secs(secs));
        }

        Ok(settings)
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    if matches!(raw, "\\t" | "tab") {
        return Ok(b'\t');
    }

    let mut bytes = raw.bytes();
    match (bytes.next(), bytes.next()) {
        (Some(b), None) if b.is_ascii() => Ok(b),
        _ => Err(ConfigError::InvalidDelimiter(raw.to_string())),
    }
}

/// Destinations for one invocation
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub table: String,
    pub notification_target: String,
    pub secret_reference: String,
    /// Notification recipient read from the secret
    pub recipient: String,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("table", &self.table)
            .field("notification_target", &self.notification_target)
            .field("secret_reference", &self.secret_reference)
            .field("recipient", &"<redacted>")
            .finish()
    }
}

/// Resolves destinations: required variables first, then the secret
#[derive(Clone)]
pub struct ConfigResolver {
    lookup: EnvLookup,
    secrets: Arc<dyn SecretStore>,
}

impl ConfigResolver {
    pub fn new(lookup: EnvLookup, secrets: Arc<dyn SecretStore>) -> Self {
        Self { lookup, secrets }
    }

    pub fn from_env(secrets: Arc<dyn SecretStore>) -> Self {
        Self::new(process_env(), secrets)
    }

    /// Fails without contacting any collaborator when a variable is missing
    pub async fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let secret_reference = self.required(SECRET_REFERENCE_VAR)?;
        let notification_target = self.required(NOTIFICATION_TARGET_VAR)?;
        let table = self.required(TABLE_VAR)?;

        let recipient = self.secrets.get_secret(&secret_reference).await?;
        debug!(secret_reference = %secret_reference, "Notification recipient resolved");

        Ok(ResolvedConfig {
            table,
            notification_target,
            secret_reference,
            recipient,
        })
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        non_blank(&self.lookup, name).ok_or(ConfigError::Missing(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::memory::MemorySecretStore;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> EnvLookup {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(move |name| map.get(name).cloned())
    }

    const FULL: &[(&str, &str)] = &[
        (SECRET_REFERENCE_VAR, "csv/recipient"),
        (NOTIFICATION_TARGET_VAR, "arn:aws:sns:eu-west-1:123:csv"),
        (TABLE_VAR, "employees"),
    ];

    #[test]
    fn test_settings_defaults() {
        let settings = IngestSettings::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(settings, IngestSettings::default());
        assert_eq!(settings.delimiter, b',');
        assert!(settings.time_budget.is_none());
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = IngestSettings::from_lookup(&lookup(&[
            (DELIMITER_VAR, ";"),
            (TIME_BUDGET_VAR, "840"),
        ]))
        .unwrap();
        assert_eq!(settings.delimiter, b';');
        assert_eq!(settings.time_budget, Some(Duration::from_secs(840)));
    }

    #[test]
    fn test_tab_delimiter_alias() {
        let settings = IngestSettings::from_lookup(&lookup(&[(DELIMITER_VAR, "\\t")])).unwrap();
        assert_eq!(settings.delimiter, b'\t');
    }

    #[test]
    fn test_invalid_settings() {
        let err = IngestSettings::from_lookup(&lookup(&[(DELIMITER_VAR, ";;")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter(_)));

        let err = IngestSettings::from_lookup(&lookup(&[(TIME_BUDGET_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeBudget(_)));
    }

    #[tokio::test]
    async fn test_resolve_reads_secret() {
        let secrets = Arc::new(MemorySecretStore::new().with_secret("csv/recipient", "ops@x.com"));
        let resolver = ConfigResolver::new(lookup(FULL), secrets.clone());

        let config = resolver.resolve().await.unwrap();
        assert_eq!(config.table, "employees");
        assert_eq!(config.notification_target, "arn:aws:sns:eu-west-1:123:csv");
        assert_eq!(config.recipient, "ops@x.com");
        assert_eq!(secrets.lookup_count(), 1);
        assert!(!format!("{:?}", config).contains("ops@x.com"));
    }

    #[tokio::test]
    async fn test_each_missing_variable_fails_before_secret_lookup() {
        for missing in [SECRET_REFERENCE_VAR, NOTIFICATION_TARGET_VAR, TABLE_VAR] {
            let vars: Vec<(&str, &str)> =
                FULL.iter().copied().filter(|(k, _)| *k != missing).collect();
            let secrets =
                Arc::new(MemorySecretStore::new().with_secret("csv/recipient", "ops@x.com"));
            let resolver = ConfigResolver::new(lookup(&vars), secrets.clone());

            let err = resolver.resolve().await.unwrap_err();
            assert!(matches!(err, ConfigError::Missing(name) if name == missing));
            assert_eq!(secrets.lookup_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_blank_value_counts_as_missing() {
        let mut vars = FULL.to_vec();
        vars[2] = (TABLE_VAR, "   ");
        let resolver = ConfigResolver::new(lookup(&vars), Arc::new(MemorySecretStore::new()));

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, ConfigError::Missing(TABLE_VAR)));
    }

    #[tokio::test]
    async fn test_unknown_secret_is_config_error() {
        let resolver = ConfigResolver::new(lookup(FULL), Arc::new(MemorySecretStore::new()));
        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, ConfigError::Secret(_)));
    }
}
