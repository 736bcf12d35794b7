//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `model` - `load-model`, `save-model` and `init-config`
//! - `build` - `build-variant`
//! - `show` - display a model or the configuration
//! - `preflight` - run preflight checks
//!
//! Handlers return the payload to print. Anything that goes wrong is returned
//! as an error and printed by `main` as an error payload.

pub mod build;
pub mod model;
mod preflight;
pub mod show;

pub use build::cmd_build_variant;
pub use model::{cmd_init_config, cmd_load_model, cmd_save_model};
pub use preflight::cmd_preflight;
pub use show::cmd_show;

use serde_json::{json, Value};

use fopctl::build::BuildError;

/// What a command prints on stdout.
pub enum Output {
    /// Single-line JSON payload.
    Json(Value),
    /// Text for humans.
    Text(String),
}

impl Output {
    pub fn ok(mut fields: Value) -> Self {
        if let Value::Object(ref mut map) = fields {
            map.insert("status".to_string(), json!("ok"));
        }
        Output::Json(fields)
    }

    /// Whether the payload reports an error.
    pub fn is_error(&self) -> bool {
        match self {
            Output::Json(value) => value.get("status").and_then(Value::as_str) == Some("error"),
            Output::Text(_) => false,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Output::Json(value) => value.to_string(),
            Output::Text(text) => text.trim_end().to_string(),
        }
    }
}

/// Error payload for a failed command.
pub fn error_payload(err: &anyhow::Error) -> Value {
    match err.downcast_ref::<BuildError>() {
        Some(build) => json!({
            "status": "error",
            "kind": build.kind(),
            "message": build.to_string(),
        }),
        None => json!({
            "status": "error",
            "message": format!("{:#}", err),
        }),
    }
}
