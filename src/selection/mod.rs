//! Selection (configuration) documents.
//!
//! A configuration has the same node shape as a feature model. A node counts
//! as selected when any of its attributes, whatever the attribute is called,
//! holds [`SELECTED`].
//!
//! ```text
//! <configuration>
//!     <feature automatic="selected" name="Base"/>
//!     <feature manual="selected" name="Caesar"/>
//!     <feature automatic="unselected" name="RotateRight"/>
//!     <feature name="Logging"/>
//! </configuration>
//! ```

pub mod configuration;
pub mod resolve;

pub use configuration::{default_selection, read_configuration, write_configuration, Selection};
pub use resolve::{resolve_selected, resolve_selected_file};

use crate::document::DocumentError;

/// Attribute value marking a node as selected.
pub const SELECTED: &str = "selected";

/// Attribute value marking a node as explicitly deselected.
pub const UNSELECTED: &str = "unselected";

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Document(#[from] DocumentError),
}
