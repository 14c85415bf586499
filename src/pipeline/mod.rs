//! Repair pipeline orchestration
//!
//! Composes the store, the codec, the schema descriptor and a mutation
//! policy into one sequential pass over the selected records.
//!
//! # Guarantees
//!
//! - Records are processed one at a time, in the order the store yields them
//! - The first decode, encode or write failure aborts the run
//! - Each repair is committed on its own; an aborted run keeps earlier repairs
//! - Running twice gives the same store contents as running once

mod deadline;
mod errors;
mod orchestrator;
mod report;

pub use deadline::{Clock, Deadline, SystemClock};
pub use errors::{ErrorKind, PipelineError, PipelineResult};
pub use orchestrator::{PipelineConfig, RepairPipeline, DEFAULT_TIMEOUT};
pub use report::{RecordOutcome, RecordResult, RunReport};
