//! Per-call build namespace.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::expression;

/// Prefix of every per-build file placed in the features directory.
pub const VARIANT_PREFIX: &str = "variant-";

/// Paths of one `build_variant` call.
///
/// Everything the build writes into the shared features directory is named
/// after `token`, so concurrent builds never touch each other's files.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub config_path: PathBuf,
    pub features_dir: PathBuf,
    pub output_dir: PathBuf,
    pub token: String,
}

impl BuildJob {
    pub fn new(config_path: &Path, features_dir: &Path, output_dir: &Path) -> Self {
        Self {
            config_path: config_path.to_path_buf(),
            features_dir: features_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            token: new_token(),
        }
    }

    /// `<features_dir>/variant-<token>.expression`
    pub fn expression_path(&self) -> PathBuf {
        self.features_dir.join(format!(
            "{}{}.{}",
            VARIANT_PREFIX,
            self.token,
            expression::EXTENSION
        ))
    }
}

/// Nanosecond timestamp plus random bits, both hex.
pub fn new_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let random = Uuid::new_v4().simple().to_string();
    format!("{:x}-{}", nanos, &random[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| new_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_expression_path_is_namespaced() {
        let job = BuildJob::new(
            Path::new("/p/config.xml"),
            Path::new("/p/features"),
            Path::new("/p/out"),
        );
        let path = job.expression_path();
        assert_eq!(path.parent(), Some(Path::new("/p/features")));
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("variant-{}.expression", job.token)
        );
    }

    #[test]
    fn test_token_is_path_safe() {
        let token = new_token();
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() || c == '-'));
    }
}
