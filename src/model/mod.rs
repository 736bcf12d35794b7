//! Feature model handling.
//!
//! # Document shape
//!
//! ```text
//! <featureModel>
//!     <properties/>
//!     <struct>
//!         <and abstract="true" name="Chat">
//!             <feature mandatory="true" name="Base"/>
//!             <alt name="Encryption">
//!                 <feature name="Caesar"/>
//!                 <feature name="RotateRight"/>
//!             </alt>
//!         </and>
//!     </struct>
//!     <constraints/>
//! </featureModel>
//! ```
//!
//! - [`store`]: load a `<struct>` section into a [`FeatureNode`] tree and save
//!   a tree back without disturbing the other sections.
//! - [`subtree`]: inline `<subtree name="X"/>` references to sibling models.
//! - [`render`]: ASCII rendering for the CLI.

mod node;
pub mod render;
pub mod store;
pub mod subtree;

pub use node::*;
pub use store::{load, load_view, save};

use std::path::PathBuf;

use crate::document::DocumentError;

/// Name of the element holding the feature tree.
pub const STRUCT_TAG: &str = "struct";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("No struct element found")]
    NoStructureFound,

    #[error("No root feature found")]
    NoRootFeature,

    #[error("Unknown feature kind '{0}'")]
    UnknownKind(String),

    #[error("<{kind}> element has no name")]
    MissingName { kind: String },

    #[error("Feature '{parent}' has more than one child named '{name}'")]
    DuplicateSibling { parent: String, name: String },

    #[error("Invalid model payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("SubTree \"{name}\" not found at {}", .path.display())]
    SubtreeNotFound { name: String, path: PathBuf },

    #[error("SubTree \"{name}\" has no <struct> section")]
    SubtreeWithoutStruct { name: String },

    #[error("SubTree \"{name}\" references itself")]
    SubtreeCycle { name: String },
}
