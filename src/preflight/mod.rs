//! Preflight checks for variant builds.
//!
//! Validates the Java runtime and the composition engine before building.
//! Run with `fopctl preflight` to check everything is ready.

mod environment;
mod host_tools;
mod types;

use anyhow::{bail, Result};

use crate::config::Config;

pub use environment::{ENGINE_JAR_CHECK, ENGINE_MODE_CHECK};
pub use host_tools::{JAVA_CHECK, JAVA_VERSION_CHECK};
pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    tracing::info!("Checking Java runtime...");
    checks.extend(host_tools::check_java(config));

    tracing::info!("Checking composition engine...");
    checks.extend(environment::check_engine(config));

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config) -> Result<PreflightReport> {
    let report = run_preflight(config);
    eprint!("{}", report.render());

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }
    Ok(report)
}
