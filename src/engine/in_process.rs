//! In-process engine backed by a function.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::{CompositionEngine, EngineError, EngineRequest};

/// Engine that calls `compose` directly.
///
/// An `Err` from the function is passed through unchanged; a panic is caught
/// and reported as [`EngineError::Crash`].
pub struct FnEngine<F> {
    name: String,
    output_dir: bool,
    compose: F,
}

impl<F> FnEngine<F>
where
    F: Fn(&EngineRequest) -> Result<(), EngineError> + Send + Sync,
{
    /// Engine that writes straight into the requested output directory.
    pub fn new(name: impl Into<String>, compose: F) -> Self {
        Self {
            name: name.into(),
            output_dir: true,
            compose,
        }
    }

    /// Engine that ignores the output directory and writes to
    /// [`EngineRequest::default_output`] instead.
    pub fn without_output_dir(mut self) -> Self {
        self.output_dir = false;
        self
    }
}

impl<F> CompositionEngine for FnEngine<F>
where
    F: Fn(&EngineRequest) -> Result<(), EngineError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_output_dir(&self) -> bool {
        self.output_dir
    }

    fn compose(&self, request: &EngineRequest) -> Result<(), EngineError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.compose)(request))) {
            Ok(result) => result,
            Err(payload) => Err(EngineError::Crash {
                detail: panic_message(payload.as_ref()),
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "engine panicked".to_string()
    }
}
