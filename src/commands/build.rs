//! Build command - composes a variant.

use anyhow::Result;
use serde_json::json;
use std::path::Path;

use fopctl::build::Orchestrator;
use fopctl::config::Config;
use fopctl::engine::ProcessEngine;

use super::Output;

/// Build the variant selected in `config_path`.
pub fn cmd_build_variant(
    config_path: &Path,
    features_dir: &Path,
    output_dir: &Path,
    config: &Config,
) -> Result<Output> {
    if !config.has_engine_jar() {
        tracing::warn!(
            "Engine jar {} not found, the build will likely fail. Run 'fopctl preflight'.",
            config.engine_jar.display()
        );
    }

    let orchestrator =
        Orchestrator::new(ProcessEngine::from_config(config)).with_retry(config.retry);
    let report = orchestrator.build_variant(config_path, features_dir, output_dir)?;

    Ok(Output::ok(json!({ "variant": report })))
}
