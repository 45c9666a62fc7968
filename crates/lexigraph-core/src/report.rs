//! Ingestion reporting types shared by the pipeline and the CLI.

use crate::store::MaterializedEntry;
use std::time::Duration;

/// Terminal state of one entry's ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Entry was parsed and persisted.
    Ingested(MaterializedEntry),
    /// Entry carried no usable headword and was skipped without error.
    NoHeadword,
    /// Entry failed; the batch continues with the next one.
    Failed { error: String },
}

impl IngestOutcome {
    pub fn is_ingested(&self) -> bool {
        matches!(self, IngestOutcome::Ingested(_))
    }
}

/// Per-entry result with diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    /// Headword when known, otherwise a positional label like "entry 3"
    pub label: String,
    pub outcome: IngestOutcome,
    /// Parse defects recovered while reading the document
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

/// Aggregate over one batch of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub entries: Vec<EntryReport>,
}

impl BatchReport {
    pub fn push(&mut self, report: EntryReport) {
        self.entries.push(report);
    }

    pub fn ingested(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_ingested())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IngestOutcome::NoHeadword))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IngestOutcome::Failed { .. }))
            .count()
    }
}
