//! Composition engine contract.
//!
//! The engine takes an expression file and a base directory holding one
//! sub-directory per feature, and produces the composed source tree. It is
//! opaque to this crate. Two implementations share the contract:
//!
//! - [`ProcessEngine`]: spawns `java -jar FeatureHouse.jar ...`
//! - [`FnEngine`]: calls a function in-process
//!
//! Engines that cannot be pointed at an output directory write to
//! [`CompositionEngine::implicit_output`]; the orchestrator stages that
//! directory afterwards.

mod external;
mod in_process;

pub use external::ProcessEngine;
pub use in_process::FnEngine;

use std::path::PathBuf;

/// One engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// Expression file listing features in composition order.
    pub expression: PathBuf,
    /// Directory containing one sub-directory per feature.
    pub base_dir: PathBuf,
    /// Where to write output; `None` when the engine picks the location.
    pub output_dir: Option<PathBuf>,
}

impl EngineRequest {
    /// Directory an engine writes to when no output directory is given:
    /// next to the expression file, named after its stem.
    pub fn default_output(&self) -> PathBuf {
        self.expression.with_extension("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine ran and reported that composition failed.
    #[error("Engine reported failure: {detail}")]
    Reported { code: Option<i32>, detail: String },

    /// The engine could not be run, or failed in an unexpected way.
    #[error("Engine crashed: {detail}")]
    Crash { detail: String },
}

/// Something that composes feature directories into a variant.
pub trait CompositionEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Whether [`EngineRequest::output_dir`] is honoured.
    fn supports_output_dir(&self) -> bool;

    /// Where output lands when the request has no output directory.
    fn implicit_output(&self, request: &EngineRequest) -> PathBuf {
        request.default_output()
    }

    /// Run one composition. Blocks until the engine is done.
    fn compose(&self, request: &EngineRequest) -> Result<(), EngineError>;
}

impl<E: CompositionEngine + ?Sized> CompositionEngine for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports_output_dir(&self) -> bool {
        (**self).supports_output_dir()
    }

    fn implicit_output(&self, request: &EngineRequest) -> PathBuf {
        (**self).implicit_output(request)
    }

    fn compose(&self, request: &EngineRequest) -> Result<(), EngineError> {
        (**self).compose(request)
    }
}

impl<E: CompositionEngine + ?Sized> CompositionEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports_output_dir(&self) -> bool {
        (**self).supports_output_dir()
    }

    fn implicit_output(&self, request: &EngineRequest) -> PathBuf {
        (**self).implicit_output(request)
    }

    fn compose(&self, request: &EngineRequest) -> Result<(), EngineError> {
        (**self).compose(request)
    }
}
