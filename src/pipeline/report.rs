//! Run reports

use std::fmt;

/// Terminal state of one record in a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Healthy; nothing written
    Skipped,
    /// Deletion cleared and written back
    Repaired,
    /// Dry run; would have been repaired
    WouldRepair,
}

impl RecordOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOutcome::Skipped => "skipped",
            RecordOutcome::Repaired => "repaired",
            RecordOutcome::WouldRepair => "would-repair",
        }
    }
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One visited record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResult {
    pub row_id: i64,
    pub key: String,
    pub outcome: RecordOutcome,
}

/// Everything a completed run visited, in scan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    records: Vec<RecordResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, row_id: i64, key: &str, outcome: RecordOutcome) {
        self.records.push(RecordResult {
            row_id,
            key: key.to_string(),
            outcome,
        });
    }

    pub fn records(&self) -> &[RecordResult] {
        &self.records
    }

    /// Records visited
    pub fn scanned(&self) -> usize {
        self.records.len()
    }

    pub fn repaired(&self) -> usize {
        self.count(RecordOutcome::Repaired)
    }

    pub fn skipped(&self) -> usize {
        self.count(RecordOutcome::Skipped)
    }

    pub fn would_repair(&self) -> usize {
        self.count(RecordOutcome::WouldRepair)
    }

    /// Keys with the given outcome, in scan order
    pub fn keys_with(&self, outcome: RecordOutcome) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.outcome == outcome)
            .map(|r| r.key.as_str())
            .collect()
    }

    fn count(&self, outcome: RecordOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report = RunReport::new();
        report.push(1, "/pv/a", RecordOutcome::Skipped);
        report.push(2, "/pv/b", RecordOutcome::Repaired);
        report.push(3, "/pv/c", RecordOutcome::Repaired);

        assert_eq!(report.scanned(), 3);
        assert_eq!(report.repaired(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.would_repair(), 0);
        assert_eq!(report.keys_with(RecordOutcome::Repaired), vec!["/pv/b", "/pv/c"]);
    }
}
