//! Engine and workspace checks.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::Config;

use super::types::CheckResult;

pub const ENGINE_JAR_CHECK: &str = "engine jar";
pub const ENGINE_MODE_CHECK: &str = "engine output";

/// Zip local file header, which every jar starts with.
const JAR_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Check the engine jar exists and looks like a jar.
pub fn check_engine(config: &Config) -> Vec<CheckResult> {
    let mut results = vec![check_jar(&config.engine_jar)];

    if config.engine_output_dir {
        results.push(CheckResult::pass_with(
            ENGINE_MODE_CHECK,
            "engine writes to the output directory (--output-dir)",
        ));
    } else {
        results.push(CheckResult::pass_with(
            ENGINE_MODE_CHECK,
            &format!(
                "staged from the features directory ({} attempts, {} ms apart)",
                config.retry.attempts,
                config.retry.delay.as_millis()
            ),
        ));
    }

    results
}

fn check_jar(jar: &Path) -> CheckResult {
    if !jar.is_file() {
        return CheckResult::fail(
            ENGINE_JAR_CHECK,
            &format!("{} not found. Set FOP_ENGINE_JAR.", jar.display()),
        );
    }

    let mut magic = [0u8; 4];
    match File::open(jar).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) if &magic == JAR_MAGIC => {
            CheckResult::pass_with(ENGINE_JAR_CHECK, &jar.display().to_string())
        }
        Ok(()) => CheckResult::warn(
            ENGINE_JAR_CHECK,
            &format!("{} does not look like a jar", jar.display()),
        ),
        Err(e) => CheckResult::fail(
            ENGINE_JAR_CHECK,
            &format!("Cannot read {}: {}", jar.display(), e),
        ),
    }
}
