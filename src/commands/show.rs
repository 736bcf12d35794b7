//! Show command - displays information.

use anyhow::Result;
use std::path::PathBuf;

use fopctl::config::Config;
use fopctl::model::{self, render, subtree};

use super::Output;

/// Show target for the show command.
pub enum ShowTarget {
    /// Render a feature model as a tree
    Model { path: PathBuf, expand: bool },
    /// Show configuration
    Config,
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<Output> {
    match target {
        ShowTarget::Model { path, expand } => {
            let root = if expand {
                subtree::load_expanded(&path)?
            } else {
                model::load(&path)?
            };
            Ok(Output::Text(render::render_tree(&root)))
        }
        ShowTarget::Config => Ok(Output::Text(config.render())),
    }
}
