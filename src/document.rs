//! XML document I/O shared by model and configuration files.

use std::fs;
use std::path::{Path, PathBuf};
use xmltree::{Element, EmitterConfig, XMLNode};

/// Indentation used when writing documents.
const INDENT: &str = "    ";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: xmltree::ParseError,
    },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: xmltree::Error,
    },
}

/// Parse an XML document from a file.
pub fn read(path: &Path) -> Result<Element, DocumentError> {
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Element::parse(content.as_bytes()).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write an XML document with a declaration and fixed 4-space indentation,
/// creating parent directories as needed.
pub fn write(path: &Path, document: &Element) -> Result<(), DocumentError> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .perform_indent(true)
        .indent_string(INDENT);
    document
        .write_with_config(&mut buf, config)
        .map_err(|source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    buf.push(b'\n');

    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, buf).map_err(io_err)
}

/// First element named `tag` in document pre-order, including `element` itself.
pub fn find_first<'a>(element: &'a Element, tag: &str) -> Option<&'a Element> {
    if element.name == tag {
        return Some(element);
    }
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .find_map(|child| find_first(child, tag))
}

pub fn find_first_mut<'a>(element: &'a mut Element, tag: &str) -> Option<&'a mut Element> {
    if element.name == tag {
        return Some(element);
    }
    for child in element.children.iter_mut() {
        if let XMLNode::Element(child) = child {
            if let Some(found) = find_first_mut(child, tag) {
                return Some(found);
            }
        }
    }
    None
}

/// Remove whitespace-only text nodes, recursively.
pub fn strip_whitespace(element: &mut Element) {
    element
        .children
        .retain(|node| !matches!(node, XMLNode::Text(text) if text.trim().is_empty()));
    for child in element.children.iter_mut() {
        if let XMLNode::Element(child) = child {
            strip_whitespace(child);
        }
    }
}
