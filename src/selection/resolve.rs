//! Composition order from a selection document.

use std::path::Path;
use xmltree::{Element, XMLNode};

use super::{SelectionError, SELECTED};
use crate::document;
use crate::model::FeatureKind;

/// Names of selected features in pre-order document order.
///
/// Every `feature`/`and`/`or`/`alt` element is inspected, however deeply
/// nested. Duplicates are kept as they appear.
pub fn resolve_selected(doc: &Element) -> Vec<String> {
    let mut selected = Vec::new();
    collect(doc, &mut selected);
    selected
}

/// Parse `path` and resolve its selected features.
pub fn resolve_selected_file(path: impl AsRef<Path>) -> Result<Vec<String>, SelectionError> {
    let path = path.as_ref();
    let doc = document::read(path)?;
    let selected = resolve_selected(&doc);
    tracing::debug!(
        "Resolved {} selected feature(s) from {}",
        selected.len(),
        path.display()
    );
    Ok(selected)
}

fn collect(element: &Element, selected: &mut Vec<String>) {
    if FeatureKind::from_tag(&element.name).is_some() && is_selected(element) {
        match element.attributes.get("name") {
            Some(name) => selected.push(name.clone()),
            None => tracing::warn!("Selected <{}> element has no name, skipping", element.name),
        }
    }

    for child in element.children.iter().filter_map(XMLNode::as_element) {
        collect(child, selected);
    }
}

fn is_selected(element: &Element) -> bool {
    element.attributes.values().any(|value| value == SELECTED)
}
