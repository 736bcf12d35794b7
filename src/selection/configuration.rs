//! Reading and writing configuration documents.

use std::path::Path;
use xmltree::{Element, XMLNode};

use super::{SelectionError, SELECTED, UNSELECTED};
use crate::document;
use crate::model::{FeatureKind, FeatureNode};

const CONFIGURATION_TAG: &str = "configuration";

/// Selection state of one feature in a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    /// Chosen by the user (`manual="selected"`).
    pub manual: bool,
    /// Implied by the model (`automatic="selected"`).
    pub automatic: bool,
    /// Excluded by the model (`automatic="unselected"`).
    pub automatic_unselected: bool,
}

impl Selection {
    pub fn unselected(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_selected(&self) -> bool {
        self.manual || self.automatic
    }
}

/// Default selection for a model: every mandatory feature automatically
/// selected, everything else left open. Entries follow pre-order.
pub fn default_selection(root: &FeatureNode) -> Vec<Selection> {
    root.iter()
        .map(|node| Selection {
            name: node.name.clone(),
            automatic: node.mandatory,
            ..Selection::default()
        })
        .collect()
}

/// Read the `manual`/`automatic` markers of every named feature element.
pub fn read_configuration(path: impl AsRef<Path>) -> Result<Vec<Selection>, SelectionError> {
    let doc = document::read(path.as_ref())?;
    let mut selections = Vec::new();
    collect(&doc, &mut selections);
    Ok(selections)
}

/// Write a configuration document listing `selections` in order.
pub fn write_configuration(
    selections: &[Selection],
    path: impl AsRef<Path>,
) -> Result<(), SelectionError> {
    let path = path.as_ref();
    let mut root = Element::new(CONFIGURATION_TAG);

    for selection in selections {
        let mut feature = Element::new(FeatureKind::Feature.as_str());
        feature
            .attributes
            .insert("name".to_string(), selection.name.clone());
        if selection.automatic_unselected {
            feature
                .attributes
                .insert("automatic".to_string(), UNSELECTED.to_string());
        } else {
            if selection.manual {
                feature
                    .attributes
                    .insert("manual".to_string(), SELECTED.to_string());
            }
            if selection.automatic {
                feature
                    .attributes
                    .insert("automatic".to_string(), SELECTED.to_string());
            }
        }
        root.children.push(XMLNode::Element(feature));
    }

    document::write(path, &root)?;
    tracing::debug!(
        "Wrote configuration {} ({} selected of {})",
        path.display(),
        selections.iter().filter(|s| s.is_selected()).count(),
        selections.len()
    );
    Ok(())
}

fn collect(element: &Element, selections: &mut Vec<Selection>) {
    if FeatureKind::from_tag(&element.name).is_some() {
        if let Some(name) = element.attributes.get("name") {
            let attr = |key: &str| element.attributes.get(key).map(String::as_str);
            selections.push(Selection {
                name: name.clone(),
                manual: attr("manual") == Some(SELECTED),
                automatic: attr("automatic") == Some(SELECTED),
                automatic_unselected: attr("automatic") == Some(UNSELECTED),
            });
        }
    }
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        collect(child, selections);
    }
}
