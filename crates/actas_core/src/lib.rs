//! Extraction and year-partitioned storage of legislative voting records.

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod parser;
pub mod schema;
pub mod source;
pub mod store;

pub use config::Config;
pub use controller::{Controller, FailureKind, RunSummary, StepOutcome};
pub use parser::{Mismatch, parse, reconcile};
pub use schema::{Seat, VoteEntry, VoteValue, VotingAct};
pub use store::YearStore;
