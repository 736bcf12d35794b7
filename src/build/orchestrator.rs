//! Variant build pipeline.
//!
//! Validate inputs, write a token-named expression file into the features
//! directory, run the engine, then stage its output into the requested
//! directory. Each call owns its own token, so one [`Orchestrator`] can serve
//! concurrent builds against the same features directory.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{BuildError, PrepError};
use super::job::BuildJob;
use super::staging::{self, EntryMover, FsMover, RetryPolicy};
use super::state::{BuildState, StateMachine};
use crate::engine::{CompositionEngine, EngineError, EngineRequest};
use crate::expression;
use crate::selection;

/// Result of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub token: String,
    /// Selected features in composition order.
    pub features: Vec<String>,
    pub output_dir: PathBuf,
    /// Entries moved into `output_dir`. Empty when the engine wrote there directly.
    pub staged: Vec<String>,
    /// No feature was selected; the engine was not run.
    pub empty: bool,
    pub state: BuildState,
    pub history: Vec<BuildState>,
}

pub struct Orchestrator<E> {
    engine: E,
    retry: RetryPolicy,
    mover: Box<dyn EntryMover>,
}

impl<E: CompositionEngine> Orchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            retry: RetryPolicy::default(),
            mover: Box::new(FsMover),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_mover(mut self, mover: impl EntryMover + 'static) -> Self {
        self.mover = Box::new(mover);
        self
    }

    /// Build the variant selected in `config_path` from the feature modules in
    /// `features_dir` into `output_dir`.
    ///
    /// Blocks until the engine and staging are done. Nothing is written when
    /// validation fails.
    pub fn build_variant(
        &self,
        config_path: &Path,
        features_dir: &Path,
        output_dir: &Path,
    ) -> Result<BuildReport, BuildError> {
        let job = BuildJob::new(config_path, features_dir, output_dir);
        let mut machine = StateMachine::new(&job.token);

        tracing::info!(
            "[{}] Building variant from {} with {} into {}",
            job.token,
            config_path.display(),
            self.engine.name(),
            output_dir.display()
        );

        let result = self.run(&job, &mut machine);
        match result {
            Ok(ref report) => tracing::info!(
                "[{}] Variant built ({} features, {} staged)",
                job.token,
                report.features.len(),
                report.staged.len()
            ),
            Err(ref e) => {
                machine.advance(e.state());
                tracing::warn!("[{}] Build failed: {}", job.token, e);
            }
        }
        result
    }

    fn run(&self, job: &BuildJob, machine: &mut StateMachine) -> Result<BuildReport, BuildError> {
        validate(job)?;
        machine.advance(BuildState::Validated);

        let expression_path = job.expression_path();
        let features = write_expression(&job.config_path, &expression_path)?;
        machine.advance(BuildState::ExpressionWritten);
        tracing::debug!("[{}] Composition order: {:?}", job.token, features);

        if features.is_empty() {
            tracing::info!("[{}] No features selected, producing an empty variant", job.token);
            remove_file_quietly(&expression_path);
            fs::create_dir_all(&job.output_dir).map_err(|source| BuildError::Staging {
                path: job.output_dir.clone(),
                source,
            })?;
            machine.advance(BuildState::Staged);
            return Ok(report(job, features, Vec::new(), true, machine));
        }

        let direct = self.engine.supports_output_dir();
        let request = EngineRequest {
            expression: expression_path.clone(),
            base_dir: job.features_dir.clone(),
            output_dir: direct.then(|| job.output_dir.clone()),
        };
        let intermediate = (!direct).then(|| self.engine.implicit_output(&request));

        machine.advance(BuildState::EngineInvoked);
        let outcome = self.engine.compose(&request);
        remove_file_quietly(&expression_path);

        if let Err(e) = outcome {
            if let Some(ref dir) = intermediate {
                remove_dir_quietly(dir);
            }
            return Err(match e {
                EngineError::Reported { code, detail } => BuildError::EngineFailure { code, detail },
                EngineError::Crash { detail } => BuildError::EngineCrash { detail },
            });
        }
        machine.advance(BuildState::EngineSucceeded);

        let staged = match intermediate {
            None => Vec::new(),
            Some(dir) => {
                machine.advance(BuildState::Staging);
                let staging =
                    match staging::stage(&dir, &job.output_dir, &self.retry, self.mover.as_ref()) {
                        Ok(staging) => staging,
                        Err(source) => {
                            tracing::warn!(
                                "[{}] Could not stage into {}, discarding engine output at {}",
                                job.token,
                                job.output_dir.display(),
                                dir.display()
                            );
                            remove_dir_quietly(&dir);
                            return Err(BuildError::Staging {
                                path: job.output_dir.clone(),
                                source,
                            });
                        }
                    };
                if !staging.is_complete() {
                    tracing::warn!(
                        "[{}] Unstaged entries remain in {}",
                        job.token,
                        dir.display()
                    );
                    return Err(BuildError::StagingPartial {
                        staged: staging.staged,
                        failed: staging.failed,
                    });
                }
                staging.staged
            }
        };
        machine.advance(BuildState::Staged);

        Ok(report(job, features, staged, false, machine))
    }
}

fn validate(job: &BuildJob) -> Result<(), BuildError> {
    if !job.config_path.is_file() {
        return Err(BuildError::ConfigMissing(job.config_path.clone()));
    }
    if !job.features_dir.is_dir() {
        return Err(BuildError::FeaturesDirMissing(job.features_dir.clone()));
    }
    Ok(())
}

fn write_expression(config_path: &Path, expression_path: &Path) -> Result<Vec<String>, BuildError> {
    let prepare = || -> Result<Vec<String>, PrepError> {
        let features = selection::resolve_selected_file(config_path)?;
        expression::write(&features, expression_path)?;
        Ok(features)
    };

    prepare().map_err(|source| {
        remove_file_quietly(expression_path);
        BuildError::ExpressionWrite {
            path: expression_path.to_path_buf(),
            source,
        }
    })
}

fn report(
    job: &BuildJob,
    features: Vec<String>,
    staged: Vec<String>,
    empty: bool,
    machine: &StateMachine,
) -> BuildReport {
    BuildReport {
        token: job.token.clone(),
        features,
        output_dir: job.output_dir.clone(),
        staged,
        empty,
        state: machine.state(),
        history: machine.history().to_vec(),
    }
}

fn remove_file_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

fn remove_dir_quietly(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FnEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const CONFIG: &str = r#"<configuration>
    <feature automatic="selected" name="Base"/>
    <feature name="Logging"/>
    <feature manual="selected" name="Caesar"/>
</configuration>"#;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new(config: &str) -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("features/Base")).unwrap();
            fs::create_dir_all(dir.path().join("features/Caesar")).unwrap();
            fs::write(dir.path().join("config.xml"), config).unwrap();
            Self { dir }
        }

        fn config(&self) -> PathBuf {
            self.dir.path().join("config.xml")
        }

        fn features(&self) -> PathBuf {
            self.dir.path().join("features")
        }

        fn output(&self) -> PathBuf {
            self.dir.path().join("out")
        }

        fn leftovers(&self) -> Vec<String> {
            fs::read_dir(self.features())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with(crate::build::job::VARIANT_PREFIX))
                .collect()
        }
    }

    /// Writes one file per composed feature at the implicit location.
    fn implicit_engine() -> impl CompositionEngine {
        FnEngine::new("implicit", |req: &EngineRequest| {
            let out = req.default_output();
            fs::create_dir_all(&out).unwrap();
            for feature in expression::read(&req.expression).unwrap() {
                fs::write(out.join(format!("{}.java", feature)), &feature).unwrap();
            }
            Ok(())
        })
        .without_output_dir()
    }

    #[test]
    fn test_staged_build() {
        let fx = Fixture::new(CONFIG);
        let orchestrator = Orchestrator::new(implicit_engine());

        let report = orchestrator
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap();

        assert_eq!(report.features, vec!["Base", "Caesar"]);
        assert_eq!(report.staged, vec!["Base.java", "Caesar.java"]);
        assert_eq!(report.state, BuildState::Staged);
        assert!(!report.empty);
        assert!(fx.output().join("Caesar.java").is_file());
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn test_direct_output_skips_staging() {
        let fx = Fixture::new(CONFIG);
        let engine = FnEngine::new("direct", |req: &EngineRequest| {
            let out = req.output_dir.as_ref().unwrap();
            fs::create_dir_all(out).unwrap();
            fs::write(out.join("Main.java"), "class Main {}").unwrap();
            Ok(())
        });

        let report = Orchestrator::new(engine)
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap();

        assert!(report.staged.is_empty());
        assert!(!report.history.contains(&BuildState::Staging));
        assert!(fx.output().join("Main.java").is_file());
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn test_missing_config_has_no_side_effects() {
        let fx = Fixture::new(CONFIG);
        let calls = AtomicUsize::new(0);
        let engine = FnEngine::new("counting", |_: &EngineRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = Orchestrator::new(engine)
            .build_variant(&fx.dir.path().join("nope.xml"), &fx.features(), &fx.output())
            .unwrap_err();

        assert!(matches!(err, BuildError::ConfigMissing(_)));
        assert_eq!(err.state(), BuildState::ValidationFailed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(fx.leftovers().is_empty());
        assert!(!fx.output().exists());
    }

    #[test]
    fn test_missing_features_dir() {
        let fx = Fixture::new(CONFIG);
        let err = Orchestrator::new(implicit_engine())
            .build_variant(&fx.config(), &fx.dir.path().join("nope"), &fx.output())
            .unwrap_err();
        assert_eq!(err.kind(), "features_dir_missing");
    }

    #[test]
    fn test_malformed_config_is_expression_write_error() {
        let fx = Fixture::new("<configuration><feature");
        let calls = AtomicUsize::new(0);
        let engine = FnEngine::new("counting", |_: &EngineRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = Orchestrator::new(engine)
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::ExpressionWrite {
                source: PrepError::Selection(_),
                ..
            }
        ));
        assert_eq!(err.state(), BuildState::PrepIoError);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn test_engine_failure_leaves_output_untouched() {
        let fx = Fixture::new(CONFIG);
        let engine = FnEngine::new("failing", |req: &EngineRequest| {
            fs::create_dir_all(req.default_output()).unwrap();
            Err(EngineError::Reported {
                code: Some(1),
                detail: "Caesar does not compose".into(),
            })
        })
        .without_output_dir();

        let err = Orchestrator::new(engine)
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap_err();

        assert!(matches!(err, BuildError::EngineFailure { code: Some(1), .. }));
        assert!(!fx.output().exists());
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn test_engine_panic_is_crash() {
        let fx = Fixture::new(CONFIG);
        let engine = FnEngine::new("panicking", |_: &EngineRequest| -> Result<(), EngineError> {
            panic!("stack overflow in superimposition")
        });

        let err = Orchestrator::new(engine)
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap_err();

        assert!(matches!(err, BuildError::EngineCrash { ref detail } if detail.contains("superimposition")));
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn test_unusable_output_dir_is_staging_io_and_cleans_up() {
        let fx = Fixture::new(CONFIG);
        fs::write(fx.output(), "not a directory").unwrap();

        let err = Orchestrator::new(implicit_engine())
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap_err();

        assert!(matches!(err, BuildError::Staging { .. }));
        assert_eq!(err.kind(), "staging_io");
        assert_eq!(err.state(), BuildState::StagingFailedPartial);
        assert!(fx.leftovers().is_empty());
        assert_eq!(fs::read_to_string(fx.output()).unwrap(), "not a directory");
    }

    #[test]
    fn test_empty_selection_skips_engine() {
        let fx = Fixture::new("<configuration><feature name=\"Base\"/></configuration>");
        let calls = AtomicUsize::new(0);
        let engine = FnEngine::new("counting", |_: &EngineRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = Orchestrator::new(engine)
            .build_variant(&fx.config(), &fx.features(), &fx.output())
            .unwrap();

        assert!(report.empty);
        assert!(report.features.is_empty());
        assert_eq!(report.state, BuildState::Staged);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(fx.output().is_dir());
        assert!(fx.leftovers().is_empty());
    }
}
