//! Model commands - load, save and default configuration.

use anyhow::{Context, Result};
use serde_json::json;
use std::io::Read;
use std::path::Path;

use fopctl::model::{self, subtree, FeatureNode, ModelView};
use fopctl::selection;

use super::Output;

fn load(path: &Path, expand: bool) -> Result<FeatureNode> {
    let tree = if expand {
        subtree::load_expanded(path)?
    } else {
        model::load(path)?
    };
    Ok(tree)
}

/// Print the model view of `path`. A model that cannot be loaded is an
/// error view, not a command failure.
pub fn cmd_load_model(path: &Path, expand: bool) -> Result<Output> {
    let view = if expand {
        ModelView::from(subtree::load_expanded(path))
    } else {
        model::load_view(path)
    };
    match view {
        ModelView::Ok { ref root } => {
            tracing::debug!("Loaded {} features from {}", root.count(), path.display())
        }
        ModelView::Error { ref message } => {
            tracing::debug!("Could not load {}: {}", path.display(), message)
        }
    }
    Ok(Output::Json(serde_json::to_value(view)?))
}

/// Replace the feature tree in `path` with `payload` (`-` reads stdin).
pub fn cmd_save_model(path: &Path, payload: &str) -> Result<Output> {
    let json = if payload == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read model payload from stdin")?;
        buf
    } else {
        payload.to_string()
    };

    let tree = model::parse_payload(&json)?;
    model::save(path, &tree)?;
    tracing::info!("Saved {} features to {}", tree.count(), path.display());
    Ok(Output::ok(json!({})))
}

/// Write a configuration selecting every mandatory feature of `model_path`.
pub fn cmd_init_config(model_path: &Path, config_path: &Path, expand: bool) -> Result<Output> {
    let root = load(model_path, expand)?;
    let selections = selection::default_selection(&root);
    selection::write_configuration(&selections, config_path)?;

    let selected: Vec<&str> = selections
        .iter()
        .filter(|s| s.is_selected())
        .map(|s| s.name.as_str())
        .collect();
    tracing::info!(
        "Wrote {} ({} of {} features selected)",
        config_path.display(),
        selected.len(),
        selections.len()
    );
    Ok(Output::ok(json!({ "selected": selected })))
}
