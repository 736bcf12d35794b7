//! Java runtime checks.

use crate::config::Config;
use crate::process::Cmd;

use super::types::CheckResult;

pub const JAVA_CHECK: &str = "java";
pub const JAVA_VERSION_CHECK: &str = "java version";

/// Check the configured Java launcher resolves and runs.
pub fn check_java(config: &Config) -> Vec<CheckResult> {
    let path = match which::which(&config.java) {
        Ok(path) => path,
        Err(_) => {
            return vec![CheckResult::fail(
                JAVA_CHECK,
                &format!(
                    "'{}' not found on PATH. Install a JRE or set FOP_JAVA.",
                    config.java
                ),
            )]
        }
    };

    let mut results = vec![CheckResult::pass_with(JAVA_CHECK, &path.display().to_string())];

    // `java -version` prints to stderr
    match Cmd::new(path.to_string_lossy()).arg("-version").allow_fail().run() {
        Ok(result) if result.success() => {
            let version = result
                .stderr_trimmed()
                .lines()
                .chain(result.stdout_trimmed().lines())
                .next()
                .unwrap_or("unknown");
            results.push(CheckResult::pass_with(JAVA_VERSION_CHECK, version));
        }
        Ok(result) => results.push(CheckResult::warn(
            JAVA_VERSION_CHECK,
            &format!("`{} -version` exited with {}", config.java, result.code()),
        )),
        Err(e) => results.push(CheckResult::warn(JAVA_VERSION_CHECK, &e.to_string())),
    }

    results
}
