//! Drives acquisition one identifier at a time.
//!
//! Each [`Controller::step`] advances the cursor, pulls the document through the source,
//! extractor and parser, and stores the result under its year. A run ends when
//! `failure_threshold` consecutive identifiers fail, or when the cursor reaches `end_id`.
//! The controller does not try to tell the end of the archive apart from an outage.

use crate::config::RunConfig;
use crate::extract::TextExtractor;
use crate::parser::{self, Mismatch};
use crate::source::DocumentSource;
use crate::store::{self, YearStore};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source had no document for the identifier.
    Unavailable,
    /// The document held no extractable text.
    NoText,
    /// The parsed record had no date, or one that does not parse.
    MissingDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Stored {
        id: u64,
        year: i32,
        mismatches: Vec<Mismatch>,
        persisted: bool,
    },
    Failed {
        id: u64,
        kind: FailureKind,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub final_cursor: u64,
    pub stored: u32,
    pub unavailable: u32,
    pub no_text: u32,
    pub missing_date: u32,
    pub mismatched: u32,     // stored acts with at least one reconciliation mismatch
    pub persist_faults: u32,
}

pub struct Controller<S, E> {
    source: S,
    extractor: E,
    store: YearStore,
    cursor: u64,
    consecutive_failures: u32,
    failure_threshold: u32,
    end_id: Option<u64>,
    summary: RunSummary,
}

impl<S: DocumentSource, E: TextExtractor> Controller<S, E> {
    /// The cursor starts just below `start_id`, or at the highest stored act when
    /// resuming past it.
    pub fn new(source: S, extractor: E, store: YearStore, run: &RunConfig) -> Self {
        let mut cursor = run.start_id.saturating_sub(1);
        if run.resume {
            if let Some(last_stored) = store.max_act_id() {
                cursor = cursor.max(last_stored);
            }
        }
        Self {
            source,
            extractor,
            store,
            cursor,
            consecutive_failures: 0,
            failure_threshold: run.failure_threshold.max(1),
            end_id: run.end_id,
            summary: RunSummary::default(),
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn store(&self) -> &YearStore {
        &self.store
    }

    pub fn into_store(self) -> YearStore {
        self.store
    }

    pub fn is_halted(&self) -> bool {
        self.consecutive_failures >= self.failure_threshold
            || self.end_id.is_some_and(|end_id| self.cursor >= end_id)
    }

    /// Attempts the next identifier.
    pub fn step(&mut self) -> StepOutcome {
        self.cursor += 1;
        let id = self.cursor;

        let outcome = self.acquire(id);
        match &outcome {
            StepOutcome::Stored {
                mismatches,
                persisted,
                ..
            } => {
                self.consecutive_failures = 0;
                self.summary.stored += 1;
                if !mismatches.is_empty() {
                    self.summary.mismatched += 1;
                }
                if !persisted {
                    self.summary.persist_faults += 1;
                }
            }
            StepOutcome::Failed { kind, .. } => {
                self.consecutive_failures += 1;
                match kind {
                    FailureKind::Unavailable => self.summary.unavailable += 1,
                    FailureKind::NoText => self.summary.no_text += 1,
                    FailureKind::MissingDate => self.summary.missing_date += 1,
                }
            }
        }
        self.summary.final_cursor = self.cursor;
        outcome
    }

    fn acquire(&mut self, id: u64) -> StepOutcome {
        let bytes = match self.source.fetch(id) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(id, error = %err, "document unavailable");
                return StepOutcome::Failed {
                    id,
                    kind: FailureKind::Unavailable,
                };
            }
        };

        let text = match self.extractor.extract(&bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!(id, error = %err, "no usable text");
                return StepOutcome::Failed {
                    id,
                    kind: FailureKind::NoText,
                };
            }
        };

        let mut act = parser::parse(&text);
        let year = match act.date.as_deref().map(store::year_key) {
            Some(Ok(year)) => year,
            Some(Err(err)) => {
                warn!(id, error = %err, "discarding record with unusable date");
                return StepOutcome::Failed {
                    id,
                    kind: FailureKind::MissingDate,
                };
            }
            None => {
                warn!(id, "discarding record without date");
                return StepOutcome::Failed {
                    id,
                    kind: FailureKind::MissingDate,
                };
            }
        };

        let mismatches = parser::reconcile(&act);
        for mismatch in &mismatches {
            warn!(id, %mismatch, "reconciliation mismatch");
        }

        act.act_id = id;
        let votes = act.votes.len();
        self.store.append(year, act);

        let persisted = match self.store.persist(year) {
            Ok(path) => {
                info!(id, year, votes, path = %path.display(), "stored voting act");
                true
            }
            Err(err) => {
                error!(id, year, error = %err, "could not persist year collection");
                false
            }
        };

        StepOutcome::Stored {
            id,
            year,
            mismatches,
            persisted,
        }
    }

    /// Steps until halted and reports where the cursor stopped.
    pub fn run(&mut self) -> RunSummary {
        info!(
            next_id = self.cursor + 1,
            threshold = self.failure_threshold,
            "starting acquisition"
        );
        while !self.is_halted() {
            self.step();
        }
        self.summary.final_cursor = self.cursor;
        info!(
            final_cursor = self.cursor,
            stored = self.summary.stored,
            "acquisition halted"
        );
        self.summary.clone()
    }
}
