//! Inline `<subtree name="X"/>` references.
//!
//! A subtree reference is replaced by the contents of the `<struct>` section
//! of `<model dir>/X/model.xml`. Expanded features are appended after the
//! parent's own children. References inside an expanded subtree resolve
//! against the same model directory.

use std::path::{Path, PathBuf};
use xmltree::{Element, XMLNode};

use super::store::load_document;
use super::{FeatureNode, ModelError, STRUCT_TAG};
use crate::document::{self, find_first};

pub const SUBTREE_TAG: &str = "subtree";

/// File name of a model inside a subtree directory.
pub const MODEL_FILE: &str = "model.xml";

/// Path of the model referenced by `<subtree name="..."/>`.
pub fn subtree_path(model_dir: &Path, name: &str) -> PathBuf {
    model_dir.join(name).join(MODEL_FILE)
}

/// Expand every subtree reference below `element`, in place.
pub fn expand(element: &mut Element, model_dir: &Path) -> Result<(), ModelError> {
    expand_with_stack(element, model_dir, &mut Vec::new())
}

/// Load a model after expanding its subtree references.
pub fn load_expanded(path: impl AsRef<Path>) -> Result<FeatureNode, ModelError> {
    let path = path.as_ref();
    let model_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut doc = document::read(path)?;
    expand(&mut doc, model_dir)?;
    load_document(&doc)
}

fn expand_with_stack(
    element: &mut Element,
    model_dir: &Path,
    stack: &mut Vec<String>,
) -> Result<(), ModelError> {
    let (references, mut kept): (Vec<XMLNode>, Vec<XMLNode>) = element
        .children
        .drain(..)
        .partition(|node| matches!(node, XMLNode::Element(e) if e.name == SUBTREE_TAG));

    for child in kept.iter_mut() {
        if let XMLNode::Element(child) = child {
            expand_with_stack(child, model_dir, stack)?;
        }
    }

    for reference in references {
        let XMLNode::Element(reference) = reference else {
            continue;
        };
        let name = reference
            .attributes
            .get("name")
            .cloned()
            .ok_or_else(|| ModelError::MissingName {
                kind: SUBTREE_TAG.to_string(),
            })?;

        if stack.contains(&name) {
            return Err(ModelError::SubtreeCycle { name });
        }

        let mut features = load_subtree(model_dir, &name)?;
        stack.push(name);
        for feature in features.iter_mut() {
            expand_with_stack(feature, model_dir, stack)?;
        }
        stack.pop();

        kept.extend(features.into_iter().map(XMLNode::Element));
    }

    element.children = kept;
    Ok(())
}

/// Element children of the referenced model's `<struct>` section.
fn load_subtree(model_dir: &Path, name: &str) -> Result<Vec<Element>, ModelError> {
    let path = subtree_path(model_dir, name);
    if !path.is_file() {
        return Err(ModelError::SubtreeNotFound {
            name: name.to_string(),
            path,
        });
    }

    let doc = document::read(&path)?;
    let container = find_first(&doc, STRUCT_TAG).ok_or_else(|| {
        ModelError::SubtreeWithoutStruct {
            name: name.to_string(),
        }
    })?;

    tracing::debug!("Expanding subtree '{}' from {}", name, path.display());
    Ok(container
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureKind;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_subtree_is_inlined_after_existing_children() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.xml");
        write(
            &model,
            r#"<featureModel><struct>
                <and name="App">
                    <subtree name="Crypto"/>
                    <feature name="Base" mandatory="true"/>
                </and>
            </struct></featureModel>"#,
        );
        write(
            &subtree_path(dir.path(), "Crypto"),
            r#"<featureModel><struct>
                <alt name="Encryption">
                    <feature name="Caesar"/>
                    <feature name="RotateRight"/>
                </alt>
            </struct></featureModel>"#,
        );

        let root = load_expanded(&model).unwrap();
        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Base", "Encryption"]);
        assert_eq!(root.children[1].kind, FeatureKind::Alt);
        assert_eq!(root.children[1].children.len(), 2);
    }

    #[test]
    fn test_nested_subtrees_resolve_against_model_dir() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.xml");
        write(
            &model,
            r#"<featureModel><struct><and name="App"><subtree name="Outer"/></and></struct></featureModel>"#,
        );
        write(
            &subtree_path(dir.path(), "Outer"),
            r#"<featureModel><struct><or name="Outer"><subtree name="Inner"/></or></struct></featureModel>"#,
        );
        write(
            &subtree_path(dir.path(), "Inner"),
            r#"<featureModel><struct><feature name="Inner"/></struct></featureModel>"#,
        );

        let root = load_expanded(&model).unwrap();
        assert_eq!(root.find("Outer").unwrap().children[0].name, "Inner");
    }

    #[test]
    fn test_missing_subtree() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.xml");
        write(
            &model,
            r#"<featureModel><struct><and name="App"><subtree name="Ghost"/></and></struct></featureModel>"#,
        );

        let err = load_expanded(&model).unwrap_err();
        assert!(matches!(err, ModelError::SubtreeNotFound { ref name, .. } if name == "Ghost"));
    }

    #[test]
    fn test_subtree_without_struct() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.xml");
        write(
            &model,
            r#"<featureModel><struct><and name="App"><subtree name="Bare"/></and></struct></featureModel>"#,
        );
        write(&subtree_path(dir.path(), "Bare"), "<featureModel/>");

        assert!(matches!(
            load_expanded(&model),
            Err(ModelError::SubtreeWithoutStruct { .. })
        ));
    }

    #[test]
    fn test_self_referencing_subtree_is_a_cycle() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.xml");
        write(
            &model,
            r#"<featureModel><struct><and name="App"><subtree name="Loop"/></and></struct></featureModel>"#,
        );
        write(
            &subtree_path(dir.path(), "Loop"),
            r#"<featureModel><struct><and name="Loop"><subtree name="Loop"/></and></struct></featureModel>"#,
        );

        assert!(matches!(
            load_expanded(&model),
            Err(ModelError::SubtreeCycle { ref name }) if name == "Loop"
        ));
    }
}
