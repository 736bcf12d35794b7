//! fopctl library exports.
//!
//! - [`model`]: feature-model documents and the in-memory tree
//! - [`selection`]: configuration documents and selected-feature order
//! - [`expression`]: the composition-order file handed to the engine
//! - [`engine`]: composition engine contract and implementations
//! - [`build`]: variant build orchestration and staging
//!
//! See `tests/` for integration tests exercising these together.

pub mod build;
pub mod config;
pub mod document;
pub mod engine;
pub mod expression;
pub mod model;
pub mod preflight;
pub mod process;
pub mod selection;
