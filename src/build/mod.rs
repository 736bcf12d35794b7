//! Variant builds.
//!
//! - `job`: token-namespaced paths for one build
//! - `orchestrator`: validate, write expression, run engine, stage output
//! - `staging`: move engine output into place, retrying while files are busy
//! - `state`: build progress states and their transitions
//!
//! ```text
//! config.xml --resolve--> [Base, Caesar] --write--> features/variant-<token>.expression
//!            --engine--> features/variant-<token>/ --stage--> <output_dir>/
//! ```

mod error;
pub mod job;
pub mod orchestrator;
pub mod staging;
pub mod state;

pub use error::{BuildError, PrepError};
pub use job::BuildJob;
pub use orchestrator::{BuildReport, Orchestrator};
pub use staging::{stage, EntryMover, FsMover, RetryPolicy, StagingFailure, StagingReport};
pub use state::BuildState;
