//! Configuration management for fopctl.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::build::RetryPolicy;

/// Default location of the FeatureHouse jar, relative to the base directory.
pub const DEFAULT_ENGINE_JAR: &str = "lib/FeatureHouse.jar";

/// Default Java launcher.
pub const DEFAULT_JAVA: &str = "java";

/// fopctl configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to the FeatureHouse jar (FOP_ENGINE_JAR)
    pub engine_jar: PathBuf,
    /// Java launcher (FOP_JAVA)
    pub java: String,
    /// Pass --output-dir to the engine instead of staging (FOP_ENGINE_OUTPUT_DIR)
    pub engine_output_dir: bool,
    /// Staging retry policy (FOP_STAGING_ATTEMPTS, FOP_STAGING_DELAY_MS)
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from `<base_dir>/.env` and the environment.
    pub fn load(base_dir: &Path) -> Self {
        let mut vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            match dotenvy::from_path_iter(&env_path) {
                Ok(iter) => {
                    for item in iter {
                        match item {
                            Ok((key, value)) => {
                                vars.insert(key, value);
                            }
                            Err(e) => {
                                tracing::warn!("Skipping bad line in {}: {}", env_path.display(), e)
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("Could not read {}: {}", env_path.display(), e),
            }
        }

        // Environment variables override .env file
        vars.extend(std::env::vars());

        Self::from_vars(base_dir, &vars)
    }

    /// Build configuration from a variable map, applying defaults.
    pub fn from_vars(base_dir: &Path, vars: &HashMap<String, String>) -> Self {
        let engine_jar = vars
            .get("FOP_ENGINE_JAR")
            .map(|s| {
                let path = PathBuf::from(s);
                if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                }
            })
            .unwrap_or_else(|| base_dir.join(DEFAULT_ENGINE_JAR));

        let java = vars
            .get("FOP_JAVA")
            .cloned()
            .unwrap_or_else(|| DEFAULT_JAVA.to_string());

        let engine_output_dir = vars
            .get("FOP_ENGINE_OUTPUT_DIR")
            .map(|v| parse_bool(v))
            .unwrap_or(false);

        let defaults = RetryPolicy::default();
        let attempts = parse_or(vars, "FOP_STAGING_ATTEMPTS", defaults.attempts);
        let delay_ms = parse_or(
            vars,
            "FOP_STAGING_DELAY_MS",
            defaults.delay.as_millis() as u64,
        );

        Self {
            engine_jar,
            java,
            engine_output_dir,
            retry: RetryPolicy::new(attempts, Duration::from_millis(delay_ms)),
        }
    }

    /// Check if the engine jar is available.
    pub fn has_engine_jar(&self) -> bool {
        self.engine_jar.is_file()
    }

    /// Configuration summary for `fopctl show config`.
    pub fn render(&self) -> String {
        let jar_status = if self.has_engine_jar() {
            "FOUND"
        } else {
            "NOT FOUND (set FOP_ENGINE_JAR)"
        };
        format!(
            "Configuration:\n  FOP_ENGINE_JAR: {}\n  FOP_JAVA: {}\n  FOP_ENGINE_OUTPUT_DIR: {}\n  FOP_STAGING_ATTEMPTS: {}\n  FOP_STAGING_DELAY_MS: {}\n  Engine jar: {}\n",
            self.engine_jar.display(),
            self.java,
            self.engine_output_dir,
            self.retry.attempts,
            self.retry.delay.as_millis(),
            jar_status
        )
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> T {
    match vars.get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
