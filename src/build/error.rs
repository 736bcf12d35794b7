use std::io;
use std::path::PathBuf;

use super::staging::StagingFailure;
use super::BuildState;
use crate::selection::SelectionError;

/// Failure while producing the expression file.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Config file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("Features directory not found: {}", .0.display())]
    FeaturesDirMissing(PathBuf),

    #[error("Failed to write expression file {}: {source}", .path.display())]
    ExpressionWrite {
        path: PathBuf,
        #[source]
        source: PrepError,
    },

    #[error("Engine reported failure{}: {detail}", exit_suffix(.code))]
    EngineFailure { code: Option<i32>, detail: String },

    #[error("Engine crashed: {detail}")]
    EngineCrash { detail: String },

    #[error("Cannot stage into {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stage {}", describe_failures(.failed))]
    StagingPartial {
        staged: Vec<String>,
        failed: Vec<StagingFailure>,
    },
}

impl BuildError {
    /// Stable identifier for JSON payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) => "config_missing",
            Self::FeaturesDirMissing(_) => "features_dir_missing",
            Self::ExpressionWrite { .. } => "expression_write",
            Self::EngineFailure { .. } => "engine_failure",
            Self::EngineCrash { .. } => "engine_crash",
            Self::Staging { .. } => "staging_io",
            Self::StagingPartial { .. } => "staging_partial",
        }
    }

    /// Terminal state a build ends in with this error.
    pub fn state(&self) -> BuildState {
        match self {
            Self::ConfigMissing(_) | Self::FeaturesDirMissing(_) => BuildState::ValidationFailed,
            Self::ExpressionWrite { .. } => BuildState::PrepIoError,
            Self::EngineFailure { .. } | Self::EngineCrash { .. } => BuildState::EngineFailed,
            Self::Staging { .. } | Self::StagingPartial { .. } => BuildState::StagingFailedPartial,
        }
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (exit code {})", c)).unwrap_or_default()
}

fn describe_failures(failed: &[StagingFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{} ({} attempts: {})", f.entry, f.attempts, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
