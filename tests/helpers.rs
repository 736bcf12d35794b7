//! Shared test utilities for fopctl tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Chat product line used across tests.
pub const CHAT_MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<featureModel>
    <properties/>
    <struct>
        <and abstract="true" mandatory="true" name="Chat">
            <description>Chat client product line</description>
            <feature mandatory="true" name="Base"/>
            <alt name="Encryption">
                <feature name="Caesar"/>
                <feature name="RotateRight"/>
            </alt>
            <feature name="Logging"/>
        </and>
    </struct>
    <constraints>
        <rule>
            <imp>
                <var>Logging</var>
                <var>Base</var>
            </imp>
        </rule>
    </constraints>
</featureModel>
"#;

/// Test environment with a features directory, an output directory and a
/// configuration file location.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Project root simulation
    pub base_dir: PathBuf,
    /// One sub-directory per feature module
    pub features: PathBuf,
    /// Build destination (not created)
    pub output: PathBuf,
    /// Configuration document location (not created)
    pub config: PathBuf,
    /// Feature model location (not created)
    pub model: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_dir = temp_dir.path().to_path_buf();

        let features = base_dir.join("features");
        fs::create_dir_all(&features).expect("Failed to create features dir");

        Self {
            output: base_dir.join("out/src"),
            config: base_dir.join("config.xml"),
            model: base_dir.join("model.xml"),
            features,
            base_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Add a feature module containing one Java file per `(name, body)`.
    pub fn feature(&self, feature: &str, files: &[(&str, &str)]) -> &Self {
        let dir = self.features.join(feature);
        fs::create_dir_all(&dir).expect("Failed to create feature dir");
        for (name, body) in files {
            fs::write(dir.join(name), body).expect("Failed to write feature file");
        }
        self
    }

    pub fn write_config(&self, content: &str) -> &Self {
        fs::write(&self.config, content).expect("Failed to write config");
        self
    }

    pub fn write_model(&self, content: &str) -> &Self {
        fs::write(&self.model, content).expect("Failed to write model");
        self
    }

    /// Per-build files left in the features directory.
    pub fn leftovers(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.features)
            .expect("Failed to list features dir")
            .map(|e| e.expect("Bad dir entry").file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("variant-"))
            .collect();
        names.sort();
        names
    }

    /// Write an executable script standing in for `java`.
    pub fn fake_java(&self, body: &str) -> PathBuf {
        let path = self.base_dir.join("fake-java");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write fake java");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake java");
        path
    }

    /// Fake `java -jar FeatureHouse.jar` that "composes" by copying every
    /// file of each listed feature into the expression's stem directory,
    /// later features overriding earlier ones.
    pub fn fake_composer(&self) -> PathBuf {
        self.fake_java(
            r#"
while [ $# -gt 0 ]; do
    case "$1" in
        --expression) expr="$2"; shift ;;
        --base-dir) base="$2"; shift ;;
        --output-dir) out="$2"; shift ;;
    esac
    shift
done
[ -n "$out" ] || out="${expr%.expression}"
mkdir -p "$out"
while IFS= read -r feature; do
    if [ ! -d "$base/$feature" ]; then
        echo "Feature $feature not found in $base" >&2
        exit 1
    fi
    echo "composing $feature"
    cp -R "$base/$feature/." "$out/"
done < "$expr"
"#,
        )
    }
}

/// Configuration document marking `selected` as selected, others not.
pub fn config_selecting(all: &[&str], selected: &[&str]) -> String {
    let mut xml = String::from("<configuration>\n");
    for name in all {
        if selected.contains(name) {
            xml.push_str(&format!("    <feature manual=\"selected\" name=\"{}\"/>\n", name));
        } else {
            xml.push_str(&format!("    <feature name=\"{}\"/>\n", name));
        }
    }
    xml.push_str("</configuration>\n");
    xml
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.is_file(), "Expected file to exist: {}", path.display());
}

/// Assert that a path does not exist.
pub fn assert_not_exists(path: &Path) {
    assert!(!path.exists(), "Expected path not to exist: {}", path.display());
}

/// Assert that a file contains a specific string.
pub fn assert_file_contains(path: &Path, needle: &str) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    assert!(
        content.contains(needle),
        "File {} does not contain '{}'. Content:\n{}",
        path.display(),
        needle,
        content
    );
}
