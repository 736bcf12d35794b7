//! Preflight command - runs preflight checks.

use anyhow::Result;
use serde_json::json;

use fopctl::config::Config;
use fopctl::preflight;

use super::Output;

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config, strict: bool) -> Result<Output> {
    if strict {
        let report = preflight::run_preflight_or_fail(config)?;
        return Ok(Output::ok(json!({ "checks": report.checks })));
    }

    let report = preflight::run_preflight(config);
    eprint!("{}", report.render());
    if !report.all_passed() {
        eprintln!("Some checks failed. Use --strict to fail with exit code 1.");
    }
    Ok(Output::ok(json!({
        "passed": report.all_passed(),
        "checks": report.checks,
    })))
}
