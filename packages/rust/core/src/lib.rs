//! Pipeline orchestration for the ESG monitor.
//!
//! One externally invoked entry point, [`run_period`], sequences the
//! collector, analyzer, digest synthesizer, and store for a single
//! reporting period.

pub mod pipeline;

pub use pipeline::{
    ProgressReporter, RunConfig, RunReport, RunStatus, SilentProgress, run_period,
};
