//! Loading and saving feature-model documents.
//!
//! `save` rewrites only the `<struct>` section. Everything else in the
//! original document (properties, constraints, comments) is carried over, and
//! whitespace-only text is stripped first so repeated saves produce identical
//! bytes.

use std::path::Path;
use xmltree::{Element, XMLNode};

use super::{FeatureKind, FeatureNode, ModelError, ModelView, STRUCT_TAG};
use crate::document::{self, find_first, find_first_mut, strip_whitespace};

/// Document element used when saving to a path that does not exist yet.
const DEFAULT_ROOT_TAG: &str = "featureModel";

/// Load the feature tree from a model document.
pub fn load(path: impl AsRef<Path>) -> Result<FeatureNode, ModelError> {
    let path = path.as_ref();
    let doc = document::read(path)?;
    let root = load_document(&doc)?;
    tracing::debug!(
        "Loaded model {} ({} features, root '{}')",
        path.display(),
        root.count(),
        root.name
    );
    Ok(root)
}

/// Load a model and wrap the outcome in the JSON view handed to callers.
pub fn load_view(path: impl AsRef<Path>) -> ModelView {
    ModelView::from(load(path))
}

/// Extract the feature tree from an already parsed document.
pub fn load_document(doc: &Element) -> Result<FeatureNode, ModelError> {
    let container = find_first(doc, STRUCT_TAG).ok_or(ModelError::NoStructureFound)?;
    let root = container
        .children
        .iter()
        .find_map(XMLNode::as_element)
        .ok_or(ModelError::NoRootFeature)?;

    let tree = element_to_node(root)?;
    tree.validate()?;
    Ok(tree)
}

/// Save `tree` into the `<struct>` section of the document at `path`.
///
/// The tree is validated before the file is touched.
pub fn save(path: impl AsRef<Path>, tree: &FeatureNode) -> Result<(), ModelError> {
    let path = path.as_ref();
    tree.validate()?;

    let mut doc = if path.exists() {
        document::read(path)?
    } else {
        tracing::info!("{} does not exist, creating a new model", path.display());
        Element::new(DEFAULT_ROOT_TAG)
    };

    strip_whitespace(&mut doc);

    if find_first(&doc, STRUCT_TAG).is_none() {
        doc.children
            .push(XMLNode::Element(Element::new(STRUCT_TAG)));
    }
    let container =
        find_first_mut(&mut doc, STRUCT_TAG).ok_or(ModelError::NoStructureFound)?;
    container.children.clear();
    container
        .children
        .push(XMLNode::Element(node_to_element(tree)));

    document::write(path, &doc)?;
    tracing::debug!(
        "Saved model {} ({} features)",
        path.display(),
        tree.count()
    );
    Ok(())
}

fn element_to_node(element: &Element) -> Result<FeatureNode, ModelError> {
    let kind = FeatureKind::from_tag(&element.name)
        .ok_or_else(|| ModelError::UnknownKind(element.name.clone()))?;

    let name = element
        .attributes
        .get("name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ModelError::MissingName {
            kind: element.name.clone(),
        })?
        .clone();

    // <description>, <graphics> and friends are not part of the tree
    let children = element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|child| FeatureKind::from_tag(&child.name).is_some())
        .map(element_to_node)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureNode {
        name,
        kind,
        mandatory: is_true(element, "mandatory"),
        is_abstract: is_true(element, "abstract"),
        children,
    })
}

fn node_to_element(node: &FeatureNode) -> Element {
    let mut element = Element::new(node.kind.as_str());
    element
        .attributes
        .insert("name".to_string(), node.name.clone());
    // false is written as absence
    if node.mandatory {
        element
            .attributes
            .insert("mandatory".to_string(), "true".to_string());
    }
    if node.is_abstract {
        element
            .attributes
            .insert("abstract".to_string(), "true".to_string());
    }
    element.children = node
        .children
        .iter()
        .map(|child| XMLNode::Element(node_to_element(child)))
        .collect();
    element
}

fn is_true(element: &Element, attribute: &str) -> bool {
    element
        .attributes
        .get(attribute)
        .is_some_and(|value| value == "true")
}
