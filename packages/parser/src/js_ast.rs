//! Generic JS/JSX output tree.
//!
//! The generator lowers a document tree into these nodes, validates the
//! structure, and prints it. Printing is deterministic: the same tree always
//! yields the same text.

use crate::error::GeneratorError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum JsNode {
    Program {
        body: Vec<JsNode>,
    },
    ImportDefault {
        local: String,
        source: String,
    },
    ImportNamed {
        names: Vec<String>,
        source: String,
    },
    /// Verbatim block comment text, delimiters included
    BlockComment {
        text: String,
    },
    Blank,
    ExportDefaultFunction {
        name: String,
        /// Destructured object-pattern parameter names
        params: Vec<String>,
        body: Box<JsNode>,
    },
    Return {
        argument: Box<JsNode>,
    },
    JsxElement {
        name: String,
        attributes: Vec<JsxAttr>,
        children: Vec<JsNode>,
        self_closing: bool,
    },
    JsxFragment {
        children: Vec<JsNode>,
    },
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    NullLiteral,
    Identifier(String),
    Array(Vec<JsNode>),
    ObjectLiteral(Vec<(String, JsNode)>),
    /// Verbatim expression text
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttr {
    pub name: String,
    pub value: Option<JsxAttrValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    StringLiteral(String),
    Expression(JsNode),
}

impl JsNode {
    /// Check structural invariants before printing. A violation is a bug in
    /// whatever built the tree, never bad user input.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        match self {
            JsNode::Program { body } => {
                for stmt in body {
                    match stmt {
                        JsNode::ImportDefault { .. }
                        | JsNode::ImportNamed { .. }
                        | JsNode::BlockComment { .. }
                        | JsNode::Blank
                        | JsNode::ExportDefaultFunction { .. } => stmt.validate()?,
                        other => {
                            return Err(GeneratorError::InvariantViolation(format!(
                                "{:?} is not a valid top-level statement",
                                node_label(other)
                            )))
                        }
                    }
                }
                Ok(())
            }
            JsNode::ExportDefaultFunction { name, body, .. } => {
                if name.is_empty() {
                    return Err(GeneratorError::InvariantViolation(
                        "exported function has no name".to_string(),
                    ));
                }
                match body.as_ref() {
                    JsNode::Return { .. } => body.validate(),
                    _ => Err(GeneratorError::InvariantViolation(
                        "function body must be a return statement".to_string(),
                    )),
                }
            }
            JsNode::Return { argument } => argument.validate(),
            JsNode::JsxElement {
                name,
                attributes,
                children,
                self_closing,
            } => {
                if name.is_empty() {
                    return Err(GeneratorError::InvariantViolation(
                        "element has no tag name".to_string(),
                    ));
                }
                if *self_closing && !children.is_empty() {
                    return Err(GeneratorError::InvariantViolation(format!(
                        "self-closing <{}> has children",
                        name
                    )));
                }
                for attr in attributes {
                    if attr.name.is_empty() {
                        return Err(GeneratorError::InvariantViolation(format!(
                            "attribute on <{}> has no name",
                            name
                        )));
                    }
                    if let Some(JsxAttrValue::Expression(expr)) = &attr.value {
                        expr.validate()?;
                    }
                }
                for child in children {
                    child.validate()?;
                }
                Ok(())
            }
            JsNode::JsxFragment { children } => {
                for child in children {
                    child.validate()?;
                }
                Ok(())
            }
            JsNode::Array(items) => {
                for item in items {
                    item.validate()?;
                }
                Ok(())
            }
            JsNode::ObjectLiteral(entries) => {
                for (_, value) in entries {
                    value.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn node_label(node: &JsNode) -> &'static str {
    match node {
        JsNode::Program { .. } => "Program",
        JsNode::ImportDefault { .. } => "ImportDefault",
        JsNode::ImportNamed { .. } => "ImportNamed",
        JsNode::BlockComment { .. } => "BlockComment",
        JsNode::Blank => "Blank",
        JsNode::ExportDefaultFunction { .. } => "ExportDefaultFunction",
        JsNode::Return { .. } => "Return",
        JsNode::JsxElement { .. } => "JsxElement",
        JsNode::JsxFragment { .. } => "JsxFragment",
        JsNode::StringLiteral(_) => "StringLiteral",
        JsNode::NumberLiteral(_) => "NumberLiteral",
        JsNode::BooleanLiteral(_) => "BooleanLiteral",
        JsNode::NullLiteral => "NullLiteral",
        JsNode::Identifier(_) => "Identifier",
        JsNode::Array(_) => "Array",
        JsNode::ObjectLiteral(_) => "ObjectLiteral",
        JsNode::Raw(_) => "Raw",
    }
}

/// Build a literal node from a JSON value. Anything without a literal form
/// becomes the `undefined` identifier.
pub fn literal_from_json(value: &Value) -> JsNode {
    match value {
        Value::Null => JsNode::NullLiteral,
        Value::Bool(b) => JsNode::BooleanLiteral(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => JsNode::NumberLiteral(f),
            None => JsNode::Identifier("undefined".to_string()),
        },
        Value::String(s) => JsNode::StringLiteral(s.clone()),
        Value::Array(items) => JsNode::Array(items.iter().map(literal_from_json).collect()),
        Value::Object(map) => JsNode::ObjectLiteral(
            map.iter()
                .map(|(key, value)| (key.clone(), literal_from_json(value)))
                .collect(),
        ),
    }
}

pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Printer walking a `JsNode` tree into source text
pub struct Printer {
    indent_level: usize,
    indent_string: String,
    buffer: String,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "  ".to_string(),
            buffer: String::new(),
        }
    }

    pub fn print(mut self, node: &JsNode) -> String {
        self.print_node(node);
        self.buffer
    }

    fn print_node(&mut self, node: &JsNode) {
        match node {
            JsNode::Program { body } => {
                for stmt in body {
                    if let JsNode::Blank = stmt {
                        self.buffer.push('\n');
                        continue;
                    }
                    self.print_node(stmt);
                    self.buffer.push('\n');
                }
            }
            JsNode::ImportDefault { local, source } => {
                self.buffer
                    .push_str(&format!("import {} from '{}';", local, source));
            }
            JsNode::ImportNamed { names, source } => {
                self.buffer.push_str(&format!(
                    "import {{ {} }} from '{}';",
                    names.join(", "),
                    source
                ));
            }
            JsNode::BlockComment { text } => {
                self.buffer.push_str(text);
            }
            JsNode::ExportDefaultFunction { name, params, body } => {
                self.buffer.push_str(&format!(
                    "export default function {}({{ {} }}) {{\n",
                    name,
                    params.join(", ")
                ));
                self.indent_level += 1;
                self.print_node(body);
                self.indent_level -= 1;
                self.buffer.push_str("}");
            }
            JsNode::Return { argument } => {
                self.push_indent();
                self.buffer.push_str("return (\n");
                self.indent_level += 1;
                self.push_indent();
                self.print_node(argument);
                self.buffer.push('\n');
                self.indent_level -= 1;
                self.push_indent();
                self.buffer.push_str(");\n");
            }
            JsNode::JsxElement {
                name,
                attributes,
                children,
                self_closing,
            } => {
                self.buffer.push('<');
                self.buffer.push_str(name);
                for attr in attributes {
                    self.buffer.push(' ');
                    self.print_attr(attr);
                }
                if *self_closing {
                    self.buffer.push_str(" />");
                    return;
                }
                self.buffer.push('>');
                self.print_jsx_children(children);
                self.buffer.push_str(&format!("</{}>", name));
            }
            JsNode::JsxFragment { children } => {
                self.buffer.push_str("<>");
                self.print_jsx_children(children);
                self.buffer.push_str("</>");
            }
            JsNode::StringLiteral(s) => {
                self.buffer.push('"');
                self.buffer.push_str(&escape_string(s));
                self.buffer.push('"');
            }
            JsNode::NumberLiteral(n) => {
                self.buffer.push_str(&format_number(*n));
            }
            JsNode::BooleanLiteral(b) => {
                self.buffer.push_str(if *b { "true" } else { "false" });
            }
            JsNode::NullLiteral => {
                self.buffer.push_str("null");
            }
            JsNode::Identifier(name) => {
                self.buffer.push_str(name);
            }
            JsNode::Array(items) => {
                self.buffer.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buffer.push_str(", ");
                    }
                    self.print_node(item);
                }
                self.buffer.push(']');
            }
            JsNode::ObjectLiteral(entries) => {
                if entries.is_empty() {
                    self.buffer.push_str("{}");
                    return;
                }
                self.buffer.push_str("{ ");
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.buffer.push_str(", ");
                    }
                    if is_identifier(key) {
                        self.buffer.push_str(key);
                    } else {
                        self.buffer.push('"');
                        self.buffer.push_str(&escape_string(key));
                        self.buffer.push('"');
                    }
                    self.buffer.push_str(": ");
                    self.print_node(value);
                }
                self.buffer.push_str(" }");
            }
            JsNode::Raw(source) => {
                self.buffer.push_str(source);
            }
            JsNode::Blank => {}
        }
    }

    fn print_jsx_children(&mut self, children: &[JsNode]) {
        if children.is_empty() {
            return;
        }
        self.buffer.push('\n');
        self.indent_level += 1;
        for child in children {
            self.push_indent();
            self.print_node(child);
            self.buffer.push('\n');
        }
        self.indent_level -= 1;
        self.push_indent();
    }

    fn print_attr(&mut self, attr: &JsxAttr) {
        self.buffer.push_str(&attr.name);
        match &attr.value {
            None => {}
            Some(JsxAttrValue::StringLiteral(s)) => {
                self.buffer.push_str(&format!("=\"{}\"", escape_string(s)));
            }
            Some(JsxAttrValue::Expression(expr)) => {
                self.buffer.push_str("={");
                self.print_node(expr);
                self.buffer.push('}');
            }
        }
    }

    fn push_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(&self.indent_string);
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_self_closing_element() {
        let node = JsNode::JsxElement {
            name: "Text".to_string(),
            attributes: vec![
                JsxAttr {
                    name: "color".to_string(),
                    value: Some(JsxAttrValue::StringLiteral("primary".to_string())),
                },
                JsxAttr {
                    name: "bold".to_string(),
                    value: None,
                },
            ],
            children: vec![],
            self_closing: true,
        };
        assert_eq!(Printer::new().print(&node), "<Text color=\"primary\" bold />");
    }

    #[test]
    fn test_print_nested_elements_indent() {
        let node = JsNode::JsxElement {
            name: "Stack".to_string(),
            attributes: vec![],
            children: vec![JsNode::JsxElement {
                name: "Text".to_string(),
                attributes: vec![],
                children: vec![],
                self_closing: true,
            }],
            self_closing: false,
        };
        assert_eq!(
            Printer::new().print(&node),
            "<Stack>\n  <Text />\n</Stack>"
        );
    }

    #[test]
    fn test_print_expression_attr() {
        let node = JsNode::JsxElement {
            name: "Button".to_string(),
            attributes: vec![JsxAttr {
                name: "onPress".to_string(),
                value: Some(JsxAttrValue::Expression(JsNode::Identifier(
                    "actions.handlePress".to_string(),
                ))),
            }],
            children: vec![],
            self_closing: true,
        };
        assert_eq!(
            Printer::new().print(&node),
            "<Button onPress={actions.handlePress} />"
        );
    }

    #[test]
    fn test_literal_from_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, true, null], "b c": "x"}"#).unwrap();
        let node = literal_from_json(&value);
        assert_eq!(
            Printer::new().print(&node),
            r#"{ a: [1, true, null], "b c": "x" }"#
        );
    }

    #[test]
    fn test_format_number_drops_integer_decimal() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(4.5), "4.5");
        assert_eq!(format_number(-2.0), "-2");
    }

    #[test]
    fn test_validate_rejects_self_closing_with_children() {
        let node = JsNode::JsxElement {
            name: "Stack".to_string(),
            attributes: vec![],
            children: vec![JsNode::NullLiteral],
            self_closing: true,
        };
        assert!(node.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_top_level() {
        let program = JsNode::Program {
            body: vec![JsNode::NumberLiteral(1.0)],
        };
        assert!(program.validate().is_err());
    }
}
