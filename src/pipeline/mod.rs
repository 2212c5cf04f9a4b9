//! Processing run entry points.
//!
//! - [`Processor`]: read, extract, parse and optionally save one PDF
//! - [`Persister`]: batched backend writes used by the processor
//! - [`print_report`]: final console report
//! - [`execute`]: one full CLI run, from PDF lookup to exit code

#[cfg(test)]
mod fake;
mod persist;
mod process;
mod report;
mod run;

pub use persist::{BatchOutcome, PersistSummary, Persister, Stage, build_assignments};
pub use process::{ProcessingResult, Processor};
pub use report::{print_report, summary_items, warnings};
pub use run::{Confirmation, RunOutcome, RunRequest, execute, resolve_pdf};
