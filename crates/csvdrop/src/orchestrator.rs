//! Ingestion orchestrator
//!
//! Drives one invocation: resolve destinations, then for every file in
//! order open → parse → map → write → notify.
//!
//! # Failure isolation
//!
//! | failure | effect |
//! |---|---|
//! | missing configuration / secret | invocation aborts, no file touched |
//! | object cannot be opened or decoded | file skipped, batch continues |
//! | row fails validation | row rejected, file continues |
//! | store refuses a record | row rejected, file continues |
//! | store unreachable | rest of the file abandoned, batch continues |
//! | notification fails | logged, writes stay |
//! | time budget exhausted | current file interrupted, later files not started |
//!
//! Everything runs sequentially; rows are handled in file order so rejection
//! reports are reproducible.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;
use tracing::{error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::config::{process_env, ConfigResolver, EnvLookup, IngestSettings, ResolvedConfig};
use crate::error::{FileError, Result};
use crate::mapper::RowMapper;
use crate::models::{BatchReport, FileArrival, FileOutcome, FileSummary, RejectionReason, RowOutcome};
use crate::notifier::Notifier;
use crate::parser::CsvRowParser;
use crate::ports::{NotificationSink, ObjectError, ObjectStore, RecordStore, SecretStore};
use crate::writer::RecordWriter;

/// Source of processing timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The four external capabilities the pipeline needs
#[derive(Clone)]
pub struct Collaborators {
    pub secrets: Arc<dyn SecretStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub records: Arc<dyn RecordStore>,
    pub notifications: Arc<dyn NotificationSink>,
}

pub struct Orchestrator {
    collaborators: Collaborators,
    settings: IngestSettings,
    env: EnvLookup,
    mapper: RowMapper,
    clock: Clock,
}

/// Per-invocation handles built from the resolved configuration
struct Run {
    parser: CsvRowParser,
    writer: RecordWriter,
    notifier: Notifier,
    deadline: Option<Instant>,
}

impl Run {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, settings: IngestSettings) -> Self {
        Self {
            collaborators,
            settings,
            env: process_env(),
            mapper: RowMapper::default(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Resolve destinations through `lookup` instead of the process environment
    pub fn with_env_lookup(mut self, lookup: EnvLookup) -> Self {
        self.env = lookup;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Process a batch of file arrivals.
    ///
    /// Only configuration failures are returned as errors; everything below
    /// the file boundary is reported in the [`BatchReport`].
    pub async fn run(&self, arrivals: &[FileArrival]) -> Result<BatchReport> {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("invocation", %invocation_id, files = arrivals.len());
        self.run_invocation(invocation_id, arrivals).instrument(span).await
    }

    async fn run_invocation(&self, invocation_id: Uuid, arrivals: &[FileArrival]) -> Result<BatchReport> {
        let started = Instant::now();

        let resolver = ConfigResolver::new(self.env.clone(), self.collaborators.secrets.clone());
        let config = match resolver.resolve().await {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Configuration could not be resolved, aborting invocation");
                return Err(e.into());
            },
        };
        info!(table = %config.table, "Configuration resolved");

        let run = self.prepare(&config, started);
        let mut report = BatchReport::new(invocation_id);

        for (position, arrival) in arrivals.iter().enumerate() {
            if run.expired() {
                report.not_started.extend(arrivals[position..].iter().cloned());
                warn!(
                    not_started = report.not_started.len(),
                    "Time budget exhausted before all files were started"
                );
                break;
            }

            let outcome = self.process_file(&run, arrival).await;
            let interrupted = matches!(outcome, FileOutcome::Interrupted { .. });
            report.files.push(outcome);

            if interrupted {
                report.not_started.extend(arrivals[position + 1..].iter().cloned());
                break;
            }
        }

        info!(
            files = report.files.len(),
            accepted = report.total_accepted(),
            rejected = report.total_rejected(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Invocation finished"
        );

        Ok(report)
    }

    fn prepare(&self, config: &ResolvedConfig, started: Instant) -> Run {
        Run {
            parser: CsvRowParser::new(self.settings.delimiter),
            writer: RecordWriter::new(self.collaborators.records.clone(), config.table.clone()),
            notifier: Notifier::new(
                self.collaborators.notifications.clone(),
                config.notification_target.clone(),
            ),
            deadline: self.settings.time_budget.map(|budget| started + budget),
        }
    }

    #[instrument(name = "file", skip(self, run, arrival), fields(file = %arrival))]
    async fn process_file(&self, run: &Run, arrival: &FileArrival) -> FileOutcome {
        info!("Processing file");

        let data = match self.fetch(arrival).await {
            Ok(data) => data,
            Err(e) => return skipped(arrival, e.into()),
        };

        let rows = match run.parser.parse(&data) {
            Ok(rows) => rows,
            Err(e) => return skipped(arrival, e.into()),
        };

        let mut summary = FileSummary::new(arrival.clone());

        for (row_index, row) in rows.enumerate() {
            if run.expired() {
                warn!(
                    row_index,
                    accepted = summary.accepted_count,
                    "Time budget exhausted mid-file, summary withheld"
                );
                return FileOutcome::Interrupted {
                    file_arrival: arrival.clone(),
                };
            }

            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error!(row_index, error = %e, "CSV stream broke off, abandoning remaining rows");
                    summary.abort(format!("parse error at row {}: {}", row_index, e));
                    break;
                },
            };

            match self.mapper.map(row_index, &row, (self.clock)()) {
                RowOutcome::Rejected { row_index, reason } => {
                    warn!(row_index, reason = %reason, "Row rejected");
                    summary.record_rejected(row_index, reason);
                },
                RowOutcome::Accepted(record) => match run.writer.write(row_index, &record).await {
                    Ok(()) => summary.record_accepted(),
                    Err(e) if e.is_store_unreachable() => {
                        error!(
                            row_index,
                            employee_id = %e.employee_id,
                            error = %e.source,
                            "Record store unreachable, abandoning remaining rows"
                        );
                        summary.record_rejected(row_index, RejectionReason::WriteFailed(e.source.message.clone()));
                        summary.abort(format!("record store unreachable: {}", e.source.message));
                        break;
                    },
                    Err(e) => {
                        warn!(
                            row_index,
                            employee_id = %e.employee_id,
                            error = %e.source,
                            "Record write failed"
                        );
                        summary.record_rejected(row_index, RejectionReason::WriteFailed(e.source.message.clone()));
                    },
                },
            }
        }

        info!(
            accepted = summary.accepted_count,
            rejected = summary.rejected_count,
            aborted = summary.is_aborted(),
            "File processed"
        );

        let notified = match run.notifier.notify(&summary).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Notification failed, records remain written");
                false
            },
        };

        FileOutcome::Completed { summary, notified }
    }

    /// Read the whole object; the body is released when this returns
    async fn fetch(&self, arrival: &FileArrival) -> std::result::Result<Vec<u8>, ObjectError> {
        let mut body = self
            .collaborators
            .objects
            .open_object(&arrival.storage_location_id, &arrival.object_key)
            .await?;

        let mut data = Vec::new();
        body.read_to_end(&mut data)
            .await
            .map_err(|e| ObjectError::Unavailable {
                location: arrival.storage_location_id.clone(),
                key: arrival.object_key.clone(),
                message: e.to_string(),
            })?;

        Ok(data)
    }
}

fn skipped(arrival: &FileArrival, error: FileError) -> FileOutcome {
    error!(error = %error, "Skipping file");
    FileOutcome::Skipped {
        file_arrival: arrival.clone(),
        error,
    }
}
