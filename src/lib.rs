//! dailydraft: Resilient Daily Content Drafts
//!
//! Generates a fixed number of short-form content ideas per day through a generative
//! text service and records them in a spreadsheet calendar. Backend failures never
//! leave a day unaccounted for: every run ends with drafts, placeholder mocks, or a
//! single blocked audit row.

pub mod cli;
pub mod config;
pub mod context;
pub mod daily;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod logging;
pub mod provider;
pub mod record;
pub mod run;
pub mod store;

pub use error::{DraftError, FailureKind, GenerationError};
pub use record::{IdeaRecord, OutputRow, RowStatus};
pub use run::{Orchestrator, RunOutcome, RunReport, RunSettings};
