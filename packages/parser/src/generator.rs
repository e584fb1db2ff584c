//! Source generation: document tree + bindings contract back to view-file
//! text.
//!
//! Generation goes through the `js_ast` output tree so the result can be
//! structurally validated before printing. Output is deterministic; parsing
//! generated output yields an equivalent tree (`Empty` roots come back as
//! childless fragments, which generate identically from then on).

use crate::annotations;
use crate::ast::{Bindings, DocumentNode, NodeKind, PropEntry, PropValue};
use crate::error::GeneratorError;
use crate::js_ast::{literal_from_json, JsNode, JsxAttr, JsxAttrValue, Printer};

/// Component names re-exported by the core package, imported unconditionally
/// so edits can introduce any of them without touching imports
const CORE_COMPONENTS: [&str; 11] = [
    "Screen", "Stack", "HStack", "Grid", "Text", "Button", "Input", "Card", "Avatar", "Image",
    "Divider",
];

const CORE_PACKAGE: &str = "@visual-rn/core";

/// Generate view-file source with the default component name
pub fn generate(tree: &DocumentNode, bindings: &Bindings) -> Result<String, GeneratorError> {
    Generator::new().generate(tree, bindings)
}

pub struct Generator {
    component_name: String,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            component_name: "ComponentView".to_string(),
        }
    }

    pub fn with_component_name(name: impl Into<String>) -> Self {
        Self {
            component_name: name.into(),
        }
    }

    pub fn generate(
        &self,
        tree: &DocumentNode,
        bindings: &Bindings,
    ) -> Result<String, GeneratorError> {
        let program = JsNode::Program {
            body: vec![
                JsNode::ImportDefault {
                    local: "React".to_string(),
                    source: "react".to_string(),
                },
                JsNode::ImportNamed {
                    names: CORE_COMPONENTS.iter().map(|s| s.to_string()).collect(),
                    source: CORE_PACKAGE.to_string(),
                },
                JsNode::Blank,
                JsNode::BlockComment {
                    text: annotations::render_bindings_comment(bindings),
                },
                JsNode::Blank,
                JsNode::ExportDefaultFunction {
                    name: self.component_name.clone(),
                    params: vec!["state".to_string(), "actions".to_string()],
                    body: Box::new(JsNode::Return {
                        argument: Box::new(node_to_jsx(tree)),
                    }),
                },
            ],
        };

        program.validate()?;
        Ok(Printer::new().print(&program))
    }
}

/// Lower a document node into the JSX output tree
fn node_to_jsx(node: &DocumentNode) -> JsNode {
    let children: Vec<JsNode> = node
        .children
        .iter()
        .filter(|child| child.kind != NodeKind::Empty)
        .map(|child| node_to_jsx(child))
        .collect();

    match node.kind {
        NodeKind::Empty | NodeKind::Fragment => JsNode::JsxFragment { children },
        NodeKind::Element => {
            let self_closing = children.is_empty();
            JsNode::JsxElement {
                name: node.name.clone(),
                attributes: node.props.iter().map(prop_to_attr).collect(),
                children,
                self_closing,
            }
        }
    }
}

/// Lower one prop into a JSX attribute. Every `PropValue` variant is handled;
/// `true` values collapse to the bare-attribute shorthand.
fn prop_to_attr(entry: &PropEntry) -> JsxAttr {
    let value = match &entry.value {
        PropValue::StringLiteral { value } => Some(JsxAttrValue::StringLiteral(value.clone())),
        PropValue::BooleanShorthand | PropValue::BooleanLiteral { value: true } => None,
        PropValue::BooleanLiteral { value: false } => {
            Some(JsxAttrValue::Expression(JsNode::BooleanLiteral(false)))
        }
        PropValue::NumberLiteral { value } => {
            Some(JsxAttrValue::Expression(JsNode::NumberLiteral(*value)))
        }
        PropValue::NullLiteral => Some(JsxAttrValue::Expression(JsNode::NullLiteral)),
        PropValue::BindingExpression { path } => {
            Some(JsxAttrValue::Expression(JsNode::Identifier(path.clone())))
        }
        PropValue::RawExpression { source } => Some(JsxAttrValue::Expression(raw_value(source))),
    };

    JsxAttr {
        name: entry.name.clone(),
        value,
    }
}

/// Re-detect structured literals inside raw expression text so arrays and
/// objects print canonically instead of byte-for-byte
fn raw_value(source: &str) -> JsNode {
    match serde_json::from_str::<serde_json::Value>(source) {
        Ok(value) if value.is_array() || value.is_object() => literal_from_json(&value),
        _ => JsNode::Raw(source.to_string()),
    }
}
