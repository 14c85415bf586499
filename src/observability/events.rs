//! Observable events of a repair run

use std::fmt;

use super::logger::Severity;

/// Events a repair run emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration resolved from file and flags
    ConfigLoaded,
    /// Database opened
    StoreOpened,
    /// Scan about to start
    RunBegin,
    /// Record is healthy, nothing written
    RecordSkipped,
    /// Record rewritten with its deletion cleared
    RecordRepaired,
    /// Dry run: record would have been rewritten
    RecordWouldRepair,
    /// Record could not be decoded, encoded or written
    RecordFailed,
    /// Deadline passed between records
    DeadlineExceeded,
    /// Scan exhausted
    RunComplete,
    /// Run aborted
    RunFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::RunBegin => "REPAIR_RUN_BEGIN",
            Event::RecordSkipped => "RECORD_SKIPPED",
            Event::RecordRepaired => "RECORD_REPAIRED",
            Event::RecordWouldRepair => "RECORD_WOULD_REPAIR",
            Event::RecordFailed => "RECORD_FAILED",
            Event::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Event::RunComplete => "REPAIR_RUN_COMPLETE",
            Event::RunFailed => "REPAIR_RUN_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RecordFailed | Event::RunFailed => Severity::Error,
            Event::DeadlineExceeded => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_unique() {
        let events = [
            Event::ConfigLoaded,
            Event::StoreOpened,
            Event::RunBegin,
            Event::RecordSkipped,
            Event::RecordRepaired,
            Event::RecordWouldRepair,
            Event::RecordFailed,
            Event::DeadlineExceeded,
            Event::RunComplete,
            Event::RunFailed,
        ];
        let mut names: Vec<&str> = events.iter().map(Event::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), events.len());
    }

    #[test]
    fn test_failures_log_as_errors() {
        assert_eq!(Event::RunFailed.severity(), Severity::Error);
        assert_eq!(Event::RecordFailed.severity(), Severity::Error);
        assert_eq!(Event::DeadlineExceeded.severity(), Severity::Warn);
        assert_eq!(Event::RecordSkipped.severity(), Severity::Info);
    }
}
