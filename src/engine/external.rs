//! FeatureHouse as a child process.

use std::path::{Path, PathBuf};

use super::{CompositionEngine, EngineError, EngineRequest};
use crate::config::Config;
use crate::process::Cmd;

/// Number of trailing output lines kept as failure detail.
const DETAIL_LINES: usize = 20;

/// Runs `java -jar <jar> --expression <file> --base-dir <dir> [--output-dir <dir>]`.
///
/// Exit code 0 is success, 1 is a failure reported by the engine, anything
/// else (including death by signal) is treated as a crash.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    java: String,
    jar: PathBuf,
    output_dir_flag: bool,
}

impl ProcessEngine {
    pub fn new(java: impl Into<String>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
            output_dir_flag: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.java.clone(), config.engine_jar.clone())
            .with_output_dir_flag(config.engine_output_dir)
    }

    /// Pass `--output-dir` instead of relying on the engine's default location.
    pub fn with_output_dir_flag(mut self, enabled: bool) -> Self {
        self.output_dir_flag = enabled;
        self
    }

    pub fn jar(&self) -> &Path {
        &self.jar
    }

    fn command(&self, request: &EngineRequest) -> Cmd {
        let mut cmd = Cmd::new(&self.java)
            .arg("-jar")
            .arg_path(&self.jar)
            .arg("--expression")
            .arg_path(&request.expression)
            .arg("--base-dir")
            .arg_path(&request.base_dir);
        if let Some(ref output_dir) = request.output_dir {
            cmd = cmd.arg("--output-dir").arg_path(output_dir);
        }
        cmd
    }
}

impl CompositionEngine for ProcessEngine {
    fn name(&self) -> &str {
        "featurehouse"
    }

    fn supports_output_dir(&self) -> bool {
        self.output_dir_flag
    }

    fn compose(&self, request: &EngineRequest) -> Result<(), EngineError> {
        let output = self
            .command(request)
            .run_forwarding(DETAIL_LINES)
            .map_err(|e| EngineError::Crash {
                detail: format!("failed to run '{}': {}", self.java, e),
            })?;

        match output.code() {
            Some(0) => Ok(()),
            Some(1) => Err(EngineError::Reported {
                code: Some(1),
                detail: output.tail(DETAIL_LINES),
            }),
            Some(code) => Err(EngineError::Crash {
                detail: format!("unknown exit code {}: {}", code, output.tail(DETAIL_LINES)),
            }),
            None => Err(EngineError::Crash {
                detail: format!("terminated by signal: {}", output.tail(DETAIL_LINES)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable script standing in for `java`.
    fn fake_java(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-java");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn request(dir: &Path, output_dir: Option<PathBuf>) -> EngineRequest {
        EngineRequest {
            expression: dir.join("variant-t.expression"),
            base_dir: dir.to_path_buf(),
            output_dir,
        }
    }

    #[test]
    fn test_arguments_without_output_dir() {
        let dir = TempDir::new().unwrap();
        let args_file = dir.path().join("args");
        let java = fake_java(
            dir.path(),
            &format!("echo \"$@\" > {}", args_file.display()),
        );

        let engine = ProcessEngine::new(java, "lib/FeatureHouse.jar");
        engine.compose(&request(dir.path(), None)).unwrap();

        let args = fs::read_to_string(&args_file).unwrap();
        assert_eq!(
            args.trim(),
            format!(
                "-jar lib/FeatureHouse.jar --expression {}/variant-t.expression --base-dir {}",
                dir.path().display(),
                dir.path().display()
            )
        );
    }

    #[test]
    fn test_arguments_with_output_dir() {
        let dir = TempDir::new().unwrap();
        let args_file = dir.path().join("args");
        let java = fake_java(
            dir.path(),
            &format!("echo \"$@\" > {}", args_file.display()),
        );

        let engine = ProcessEngine::new(java, "fh.jar").with_output_dir_flag(true);
        assert!(engine.supports_output_dir());
        engine
            .compose(&request(dir.path(), Some(PathBuf::from("/out"))))
            .unwrap();

        let args = fs::read_to_string(&args_file).unwrap();
        assert!(args.trim().ends_with("--output-dir /out"));
    }

    #[test]
    fn test_exit_one_is_reported_failure() {
        let dir = TempDir::new().unwrap();
        let java = fake_java(dir.path(), "echo 'Feature Foo not found' >&2; exit 1");

        let err = ProcessEngine::new(java, "fh.jar")
            .compose(&request(dir.path(), None))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Reported {
                code: Some(1),
                detail: "Feature Foo not found".into()
            }
        );
    }

    #[test]
    fn test_failure_detail_is_last_lines_only() {
        let dir = TempDir::new().unwrap();
        let java = fake_java(
            dir.path(),
            "i=0; while [ $i -lt 1000 ]; do i=$((i+1)); echo composing $i; done; exit 1",
        );

        let err = ProcessEngine::new(java, "fh.jar")
            .compose(&request(dir.path(), None))
            .unwrap_err();
        let EngineError::Reported { detail, .. } = err else {
            panic!("expected a reported failure, got {:?}", err);
        };
        assert_eq!(detail.lines().count(), DETAIL_LINES);
        assert!(detail.starts_with("composing 981\n"));
        assert!(detail.ends_with("composing 1000"));
    }

    #[test]
    fn test_other_exit_code_is_crash() {
        let dir = TempDir::new().unwrap();
        let java = fake_java(dir.path(), "exit 3");

        let err = ProcessEngine::new(java, "fh.jar")
            .compose(&request(dir.path(), None))
            .unwrap_err();
        assert!(matches!(err, EngineError::Crash { ref detail } if detail.contains("unknown exit code 3")));
    }

    #[test]
    fn test_missing_java_is_crash() {
        let dir = TempDir::new().unwrap();
        let err = ProcessEngine::new("/nonexistent/java-12345", "fh.jar")
            .compose(&request(dir.path(), None))
            .unwrap_err();
        assert!(matches!(err, EngineError::Crash { .. }));
    }
}
