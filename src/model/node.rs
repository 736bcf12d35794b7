//! In-memory feature tree.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ModelError;

/// Kind of a feature-model node, as written in the document's tag name.
///
/// - `Feature`: plain leaf or concrete feature
/// - `And`: all children combine (mandatory children are always present)
/// - `Or`: at least one child
/// - `Alt`: exactly one child
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Feature,
    And,
    Or,
    Alt,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::And => "and",
            Self::Or => "or",
            Self::Alt => "alt",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "feature" => Some(Self::Feature),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }
}

/// A node of the feature tree.
///
/// Children keep document order; that order is the composition order later
/// handed to the engine, so it is never sorted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub children: Vec<FeatureNode>,
}

impl FeatureNode {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mandatory: false,
            is_abstract: false,
            children: Vec::new(),
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_child(mut self, child: FeatureNode) -> Self {
        self.children.push(child);
        self
    }

    /// Check tree invariants: non-empty names, unique names per sibling set.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.is_empty() {
            return Err(ModelError::MissingName {
                kind: self.kind.as_str().to_string(),
            });
        }

        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.name.as_str()) {
                return Err(ModelError::DuplicateSibling {
                    parent: self.name.clone(),
                    name: child.name.clone(),
                });
            }
            child.validate()?;
        }
        Ok(())
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Find the first node with the given name (pre-order).
    pub fn find(&self, name: &str) -> Option<&FeatureNode> {
        self.iter().find(|n| n.name == name)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// JSON view of a load result handed to callers.
///
/// ```text
/// {"status":"ok","root":{...}}
/// {"status":"error","message":"..."}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModelView {
    Ok { root: FeatureNode },
    Error { message: String },
}

impl From<Result<FeatureNode, ModelError>> for ModelView {
    fn from(result: Result<FeatureNode, ModelError>) -> Self {
        match result {
            Ok(root) => Self::Ok { root },
            Err(e) => Self::Error {
                message: e.to_string(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SavePayload {
    View { root: FeatureNode },
    Node(FeatureNode),
}

/// Parse a save payload: either a bare node object or a full `ModelView`.
pub fn parse_payload(json: &str) -> Result<FeatureNode, ModelError> {
    let payload: SavePayload = serde_json::from_str(json)?;
    Ok(match payload {
        SavePayload::View { root } => root,
        SavePayload::Node(node) => node,
    })
}
