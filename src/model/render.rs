//! ASCII tree rendering for feature models.

use super::{FeatureKind, FeatureNode};

const MANDATORY: char = '●';
const OPTIONAL: char = '○';

/// Render a feature tree as ASCII art.
///
/// Mandatory features are marked `●`, optional ones `○`. Group kinds and the
/// abstract flag are shown after the name.
///
/// ```text
/// Chat [and] (abstract)
/// ├── ● Base
/// ├── ○ Encryption [alt]
/// │   ├── ○ Caesar
/// │   └── ○ RotateRight
/// └── ○ Logging
/// ```
pub fn render_tree(root: &FeatureNode) -> String {
    let mut output = String::new();
    render_node(&mut output, root, "", true, true);
    output
}

fn label(node: &FeatureNode) -> String {
    let mut label = node.name.clone();
    if node.kind != FeatureKind::Feature {
        label.push_str(&format!(" [{}]", node.kind.as_str()));
    }
    if node.is_abstract {
        label.push_str(" (abstract)");
    }
    label
}

fn render_node(output: &mut String, node: &FeatureNode, prefix: &str, is_last: bool, is_root: bool) {
    if is_root {
        output.push_str(&label(node));
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        let symbol = if node.mandatory { MANDATORY } else { OPTIONAL };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(symbol);
        output.push(' ');
        output.push_str(&label(node));
    }
    output.push('\n');

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}
