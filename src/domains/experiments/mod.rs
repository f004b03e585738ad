//! Experiments domain module.
//!
//! An experiment calls one tool on one registered server a fixed number of
//! times with fixed arguments, timing every call, and persists the result.
//!
//! ## Architecture
//!
//! - `model.rs` - Request, record, summary and rejection types
//! - `iteration.rs` - Timing of a single call and the mean
//! - `runner.rs` - `ExperimentRunner`: validate, run, persist, fetch
//! - `error.rs` - Experiment-specific error types

mod error;
mod iteration;
mod model;
mod runner;

pub use error::{ExperimentError, ExperimentResult};
pub use iteration::{IterationSample, mean, measure};
pub use model::{
    ExperimentOutcome, ExperimentRecord, ExperimentRequest, ExperimentSummary, IterationRejection,
};
pub use runner::{DEFAULT_LIST_LIMIT, ExperimentRunner};
