//! Repair pipeline
//!
//! Per record, strictly in scan order:
//!
//! ```text
//! Fetched --decode--> Decoded --healthy--> Skipped
//!    |                   |
//!    | error             +--pending--> repair --> encode --> update --> Repaired
//!    v                                              |           |
//!  Failed <-----------------------------------------+-----------+
//! ```
//!
//! `Failed` aborts the run. A corrupt record is an integrity problem, and
//! stopping is preferable to finishing a repair pass over a damaged dataset.

use std::time::Duration;

use super::deadline::{Clock, Deadline, SystemClock};
use super::errors::{PipelineError, PipelineResult};
use super::report::{RecordOutcome, RunReport};
use crate::envelope::EnvelopeCodec;
use crate::kv::{KvStore, Record, Selector};
use crate::observability::{bool_field, log_event, Event, Timer};
use crate::policy::MutationPolicy;
use crate::schema::SchemaDescriptor;

/// Default run timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-run settings, passed in explicitly
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Keys to visit
    pub selector: Selector,
    /// Budget for the whole run, starting when the run starts
    pub timeout: Duration,
    /// Decide and encode, but never write
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            selector: Selector::default(),
            timeout: DEFAULT_TIMEOUT,
            dry_run: false,
        }
    }
}

/// Scan, decode, repair and write back, one record at a time
pub struct RepairPipeline<'s, S: KvStore, P: MutationPolicy> {
    store: &'s S,
    codec: EnvelopeCodec,
    descriptor: SchemaDescriptor,
    policy: P,
    config: PipelineConfig,
}

impl<'s, S: KvStore, P: MutationPolicy> RepairPipeline<'s, S, P> {
    pub fn new(
        store: &'s S,
        codec: EnvelopeCodec,
        descriptor: SchemaDescriptor,
        policy: P,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            codec,
            descriptor,
            policy,
            config,
        }
    }

    /// Run against the system clock
    pub fn run(&self) -> PipelineResult<RunReport> {
        self.run_with_clock(&SystemClock)
    }

    /// Run with an explicit time source.
    ///
    /// The deadline is fixed before the scan starts.
    pub fn run_with_clock<C: Clock + ?Sized>(&self, clock: &C) -> PipelineResult<RunReport> {
        let timer = Timer::new();
        let deadline = Deadline::after(clock, self.config.timeout);
        let timeout_ms = self.config.timeout.as_millis().to_string();
        let kind = self.descriptor.identity().to_string();

        log_event(
            Event::RunBegin,
            &[
                ("dry_run", bool_field(self.config.dry_run)),
                ("kind", kind.as_str()),
                ("policy", self.policy.name()),
                ("selector", self.config.selector.pattern()),
                ("timeout_ms", timeout_ms.as_str()),
            ],
        );

        let result = self.process(clock, &deadline);

        let elapsed = timer.elapsed_ms();
        match &result {
            Ok(report) => {
                let repaired = report.repaired().to_string();
                let scanned = report.scanned().to_string();
                let skipped = report.skipped().to_string();
                let would_repair = report.would_repair().to_string();
                log_event(
                    Event::RunComplete,
                    &[
                        ("elapsed_ms", elapsed.as_str()),
                        ("repaired", repaired.as_str()),
                        ("scanned", scanned.as_str()),
                        ("skipped", skipped.as_str()),
                        ("would_repair", would_repair.as_str()),
                    ],
                );
            }
            Err(PipelineError::DeadlineExceeded { processed, repaired }) => {
                let processed = processed.to_string();
                let repaired = repaired.to_string();
                log_event(
                    Event::DeadlineExceeded,
                    &[
                        ("elapsed_ms", elapsed.as_str()),
                        ("processed", processed.as_str()),
                        ("repaired", repaired.as_str()),
                    ],
                );
            }
            Err(e) => {
                let message = e.to_string();
                log_event(
                    Event::RecordFailed,
                    &[("error", message.as_str()), ("key", e.key().unwrap_or(""))],
                );
                log_event(Event::RunFailed, &[("elapsed_ms", elapsed.as_str())]);
            }
        }

        result
    }

    fn process<C: Clock + ?Sized>(
        &self,
        clock: &C,
        deadline: &Deadline,
    ) -> PipelineResult<RunReport> {
        let mut report = RunReport::new();
        let cursor = self
            .store
            .scan(&self.config.selector)
            .map_err(PipelineError::Scan)?;

        for record in cursor {
            let record = record.map_err(PipelineError::Scan)?;
            if deadline.is_expired(clock) {
                return Err(PipelineError::DeadlineExceeded {
                    processed: report.scanned(),
                    repaired: report.repaired(),
                });
            }
            let outcome = self.process_record(&record)?;
            report.push(record.row_id, &record.key, outcome);
        }

        Ok(report)
    }

    fn process_record(&self, record: &Record) -> PipelineResult<RecordOutcome> {
        let object = self
            .codec
            .decode(&record.value, &self.descriptor)
            .map_err(|source| PipelineError::Decode {
                key: record.key.clone(),
                source,
            })?;

        if !self.policy.needs_repair(&object) {
            log_event(
                Event::RecordSkipped,
                &[("key", record.key.as_str()), ("name", object.name())],
            );
            return Ok(RecordOutcome::Skipped);
        }

        let deletion = object
            .deletion_timestamp()
            .map(|ts| ts.to_string())
            .unwrap_or_default();
        let grace = object
            .deletion_grace_period_seconds()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let name = object.name().to_string();

        let repaired = self.policy.repair(object);
        debug_assert!(!self.policy.needs_repair(&repaired));

        let bytes = self
            .codec
            .encode(&repaired, &self.descriptor)
            .map_err(|source| PipelineError::Encode {
                key: record.key.clone(),
                source,
            })?;

        let fields = [
            ("deletion_grace_period_seconds", grace.as_str()),
            ("deletion_timestamp", deletion.as_str()),
            ("key", record.key.as_str()),
            ("name", name.as_str()),
        ];

        if self.config.dry_run {
            log_event(Event::RecordWouldRepair, &fields);
            return Ok(RecordOutcome::WouldRepair);
        }

        let rows = self
            .store
            .update(&record.key, &bytes)
            .map_err(|source| PipelineError::Write {
                key: record.key.clone(),
                source,
            })?;

        let rows = rows.to_string();
        let mut logged = fields.to_vec();
        logged.push(("rows", rows.as_str()));
        log_event(Event::RecordRepaired, &logged);

        Ok(RecordOutcome::Repaired)
    }
}
