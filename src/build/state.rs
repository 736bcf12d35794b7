//! Build progress states.

use serde::Serialize;
use std::fmt;

/// Where a variant build is.
///
/// ```text
/// Init -> Validated -> ExpressionWritten -> EngineInvoked -> EngineSucceeded -> Staging -> Staged
///                                                                          \-> Staged (engine wrote output directly)
///                      ExpressionWritten -> Staged (empty variant)
/// ```
///
/// Failures end in `ValidationFailed`, `PrepIoError`, `EngineFailed` or
/// `StagingFailedPartial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Init,
    Validated,
    ExpressionWritten,
    EngineInvoked,
    EngineSucceeded,
    Staging,
    Staged,
    StagingFailedPartial,
    EngineFailed,
    ValidationFailed,
    PrepIoError,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Staged
                | Self::StagingFailedPartial
                | Self::EngineFailed
                | Self::ValidationFailed
                | Self::PrepIoError
        )
    }

    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: BuildState) -> bool {
        use BuildState::*;
        matches!(
            (self, next),
            (Init, Validated)
                | (Init, ValidationFailed)
                | (Validated, ExpressionWritten)
                | (Validated, PrepIoError)
                | (ExpressionWritten, EngineInvoked)
                | (ExpressionWritten, Staged)
                | (ExpressionWritten, StagingFailedPartial)
                | (EngineInvoked, EngineSucceeded)
                | (EngineInvoked, EngineFailed)
                | (EngineSucceeded, Staging)
                | (EngineSucceeded, Staged)
                | (Staging, Staged)
                | (Staging, StagingFailedPartial)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Validated => "validated",
            Self::ExpressionWritten => "expression_written",
            Self::EngineInvoked => "engine_invoked",
            Self::EngineSucceeded => "engine_succeeded",
            Self::Staging => "staging",
            Self::Staged => "staged",
            Self::StagingFailedPartial => "staging_failed_partial",
            Self::EngineFailed => "engine_failed",
            Self::ValidationFailed => "validation_failed",
            Self::PrepIoError => "prep_io_error",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the state of one build and logs every transition.
#[derive(Debug)]
pub struct StateMachine {
    token: String,
    history: Vec<BuildState>,
}

impl StateMachine {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            history: vec![BuildState::Init],
        }
    }

    pub fn state(&self) -> BuildState {
        *self.history.last().unwrap_or(&BuildState::Init)
    }

    /// Every state visited so far, starting with `Init`.
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    pub fn advance(&mut self, next: BuildState) {
        let current = self.state();
        if !current.can_advance_to(next) {
            tracing::warn!(
                "[{}] unexpected transition {} -> {}",
                self.token,
                current,
                next
            );
        }
        tracing::debug!("[{}] {} -> {}", self.token, current, next);
        self.history.push(next);
    }
}
