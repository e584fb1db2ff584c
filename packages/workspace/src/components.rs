//! Built-in component schemas.
//!
//! Mirrors the palette the visual editor offers: per-component prop types,
//! defaults, allowed option sets, and which props accept bindings. Updates
//! that rename a node are validated against these schemas before they are
//! applied.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use vrn_parser::{PropEntry, PropValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub name: String,
    pub category: String,
    pub props: BTreeMap<String, PropDefinition>,
    /// Props that may carry a `state.*` / `actions.*` binding
    pub bindable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    #[serde(rename = "type")]
    pub ty: PropType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
}

const SPACING: [i64; 11] = [0, 1, 2, 3, 4, 5, 6, 8, 10, 12, 16];
const COLORS: [&str; 12] = [
    "primary",
    "primaryDark",
    "secondary",
    "success",
    "warning",
    "danger",
    "info",
    "text",
    "textLight",
    "surface",
    "background",
    "border",
];
const COLS: [i64; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// All built-in component definitions
pub fn definitions() -> &'static [ComponentDefinition] {
    static DEFINITIONS: OnceLock<Vec<ComponentDefinition>> = OnceLock::new();
    DEFINITIONS.get_or_init(build_definitions)
}

pub fn find(name: &str) -> Option<&'static ComponentDefinition> {
    definitions().iter().find(|def| def.name == name)
}

/// Validate a prop set against a component's schema.
///
/// Unknown components pass (custom components are out of schema scope);
/// `RawExpression` values pass as recognized-but-unverifiable. Everything
/// else must match the declared type, option set, and bindability.
pub fn validate_props(component: &str, props: &[PropEntry]) -> Result<(), Vec<String>> {
    let def = match find(component) {
        Some(def) => def,
        None => return Ok(()),
    };

    let mut violations = Vec::new();

    for entry in props {
        // Event props carry handlers, which schemas don't model
        if entry.name.starts_with("on") {
            match &entry.value {
                PropValue::BindingExpression { .. } | PropValue::RawExpression { .. } => {}
                _ => violations.push(format!(
                    "event prop '{}' on <{}> must be an expression",
                    entry.name, component
                )),
            }
            continue;
        }

        let prop_def = match def.props.get(&entry.name) {
            Some(prop_def) => prop_def,
            None => {
                violations.push(format!(
                    "unknown prop '{}' on <{}>",
                    entry.name, component
                ));
                continue;
            }
        };

        match &entry.value {
            PropValue::BindingExpression { .. } => {
                if !def.bindable.iter().any(|name| name == &entry.name) {
                    violations.push(format!(
                        "prop '{}' on <{}> is not bindable",
                        entry.name, component
                    ));
                }
            }
            PropValue::RawExpression { .. } => {}
            PropValue::StringLiteral { value } => {
                check_literal(component, entry, prop_def, PropType::String, &json!(value), &mut violations);
            }
            PropValue::NumberLiteral { value } => {
                check_literal(component, entry, prop_def, PropType::Number, &json!(value), &mut violations);
            }
            PropValue::BooleanLiteral { value } => {
                check_literal(component, entry, prop_def, PropType::Boolean, &json!(value), &mut violations);
            }
            PropValue::BooleanShorthand => {
                check_literal(component, entry, prop_def, PropType::Boolean, &json!(true), &mut violations);
            }
            PropValue::NullLiteral => {
                violations.push(format!(
                    "prop '{}' on <{}> cannot be null",
                    entry.name, component
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check_literal(
    component: &str,
    entry: &PropEntry,
    prop_def: &PropDefinition,
    actual: PropType,
    value: &Value,
    violations: &mut Vec<String>,
) {
    if prop_def.ty != actual {
        violations.push(format!(
            "prop '{}' on <{}> expects {:?}",
            entry.name, component, prop_def.ty
        ));
        return;
    }

    if let Some(options) = &prop_def.options {
        let matches = options.iter().any(|option| match (option, value) {
            (Value::Number(a), Value::Number(b)) => {
                a.as_f64() == b.as_f64()
            }
            (a, b) => a == b,
        });
        if !matches {
            violations.push(format!(
                "prop '{}' on <{}> does not allow value {}",
                entry.name, component, value
            ));
        }
    }
}

// Schema construction helpers

fn string_prop(default: Option<&str>, required: bool, options: Option<&[&str]>) -> PropDefinition {
    PropDefinition {
        ty: PropType::String,
        default: default.map(|s| json!(s)),
        required,
        options: options.map(|opts| opts.iter().map(|o| json!(o)).collect()),
    }
}

fn number_prop(default: Option<i64>, required: bool, options: Option<&[i64]>) -> PropDefinition {
    PropDefinition {
        ty: PropType::Number,
        default: default.map(|n| json!(n)),
        required,
        options: options.map(|opts| opts.iter().map(|o| json!(o)).collect()),
    }
}

fn bool_prop(default: bool) -> PropDefinition {
    PropDefinition {
        ty: PropType::Boolean,
        default: Some(json!(default)),
        required: false,
        options: None,
    }
}

fn component(
    name: &str,
    category: &str,
    props: Vec<(&str, PropDefinition)>,
    bindable: &[&str],
) -> ComponentDefinition {
    ComponentDefinition {
        name: name.to_string(),
        category: category.to_string(),
        props: props
            .into_iter()
            .map(|(prop_name, def)| (prop_name.to_string(), def))
            .collect(),
        bindable: bindable.iter().map(|s| s.to_string()).collect(),
    }
}

fn build_definitions() -> Vec<ComponentDefinition> {
    vec![
        component(
            "Screen",
            "Layout",
            vec![
                ("safe", bool_prop(false)),
                ("scroll", bool_prop(false)),
                ("bg", string_prop(Some("transparent"), false, Some(&COLORS))),
                ("p", number_prop(Some(0), false, Some(&SPACING))),
            ],
            &["bg"],
        ),
        component(
            "Stack",
            "Layout",
            vec![
                ("spacing", number_prop(Some(0), false, Some(&SPACING))),
                (
                    "align",
                    string_prop(
                        Some("stretch"),
                        false,
                        Some(&["stretch", "flex-start", "flex-end", "center", "baseline"]),
                    ),
                ),
                (
                    "justify",
                    string_prop(
                        Some("flex-start"),
                        false,
                        Some(&[
                            "flex-start",
                            "flex-end",
                            "center",
                            "space-between",
                            "space-around",
                            "space-evenly",
                        ]),
                    ),
                ),
                ("p", number_prop(Some(0), false, Some(&SPACING))),
                ("dividers", bool_prop(false)),
            ],
            &["spacing", "align", "justify"],
        ),
        component(
            "HStack",
            "Layout",
            vec![
                ("spacing", number_prop(Some(0), false, Some(&SPACING))),
                (
                    "align",
                    string_prop(
                        Some("center"),
                        false,
                        Some(&["stretch", "flex-start", "flex-end", "center", "baseline"]),
                    ),
                ),
                (
                    "justify",
                    string_prop(
                        Some("flex-start"),
                        false,
                        Some(&[
                            "flex-start",
                            "flex-end",
                            "center",
                            "space-between",
                            "space-around",
                            "space-evenly",
                        ]),
                    ),
                ),
                ("wrap", bool_prop(false)),
            ],
            &["spacing", "align", "justify"],
        ),
        component(
            "Grid",
            "Layout",
            vec![
                ("cols", number_prop(Some(2), true, Some(&COLS))),
                ("gap", number_prop(Some(4), false, Some(&SPACING))),
                ("colsMd", number_prop(None, false, Some(&COLS))),
                ("colsLg", number_prop(None, false, Some(&COLS))),
            ],
            &["cols", "gap"],
        ),
        component(
            "Text",
            "Typography",
            vec![
                ("children", string_prop(Some("Text Content"), true, None)),
                (
                    "variant",
                    string_prop(
                        Some("body"),
                        false,
                        Some(&["h1", "h2", "h3", "body", "caption", "label"]),
                    ),
                ),
                ("color", string_prop(Some("text"), false, Some(&COLORS))),
                (
                    "align",
                    string_prop(
                        Some("left"),
                        false,
                        Some(&["left", "center", "right", "justify"]),
                    ),
                ),
                (
                    "weight",
                    string_prop(
                        Some("normal"),
                        false,
                        Some(&["normal", "medium", "semibold", "bold"]),
                    ),
                ),
                ("numberOfLines", number_prop(None, false, None)),
            ],
            &["children", "color", "variant"],
        ),
        component(
            "Button",
            "Inputs",
            vec![
                ("children", string_prop(Some("Button"), true, None)),
                (
                    "variant",
                    string_prop(
                        Some("primary"),
                        false,
                        Some(&["primary", "secondary", "ghost", "danger"]),
                    ),
                ),
                ("size", string_prop(Some("md"), false, Some(&["sm", "md", "lg"]))),
                ("fullWidth", bool_prop(false)),
                ("disabled", bool_prop(false)),
                ("loading", bool_prop(false)),
            ],
            &["children", "disabled", "loading"],
        ),
        component(
            "Input",
            "Inputs",
            vec![
                ("placeholder", string_prop(Some("Enter text..."), false, None)),
                (
                    "type",
                    string_prop(
                        Some("text"),
                        false,
                        Some(&["text", "email", "password", "number", "phone"]),
                    ),
                ),
                ("size", string_prop(Some("md"), false, Some(&["sm", "md", "lg"]))),
                (
                    "variant",
                    string_prop(
                        Some("outline"),
                        false,
                        Some(&["outline", "filled", "underline"]),
                    ),
                ),
                ("error", bool_prop(false)),
                ("disabled", bool_prop(false)),
            ],
            &["placeholder", "disabled", "error"],
        ),
        component(
            "Image",
            "Media",
            vec![
                (
                    "source",
                    string_prop(Some("https://via.placeholder.com/150"), true, None),
                ),
                ("alt", string_prop(Some("Image"), false, None)),
                ("ratio", string_prop(None, false, None)),
                (
                    "fit",
                    string_prop(
                        Some("cover"),
                        false,
                        Some(&["cover", "contain", "stretch", "repeat", "center"]),
                    ),
                ),
                (
                    "rounded",
                    string_prop(
                        Some("none"),
                        false,
                        Some(&["none", "sm", "md", "lg", "xl", "full"]),
                    ),
                ),
                (
                    "loading",
                    string_prop(Some("lazy"), false, Some(&["lazy", "eager"])),
                ),
            ],
            &["source", "alt"],
        ),
        component(
            "Avatar",
            "Media",
            vec![
                ("source", string_prop(None, false, None)),
                (
                    "size",
                    string_prop(Some("md"), false, Some(&["xs", "sm", "md", "lg", "xl"])),
                ),
                ("fallback", string_prop(Some("U"), false, None)),
                (
                    "shape",
                    string_prop(Some("circle"), false, Some(&["circle", "square"])),
                ),
            ],
            &["source", "fallback"],
        ),
        component(
            "Card",
            "Containers",
            vec![
                ("p", number_prop(Some(4), false, Some(&SPACING))),
                (
                    "shadow",
                    string_prop(Some("md"), false, Some(&["none", "sm", "md", "lg"])),
                ),
                (
                    "rounded",
                    string_prop(Some("md"), false, Some(&["none", "sm", "md", "lg", "xl"])),
                ),
                ("border", bool_prop(false)),
            ],
            &["p", "shadow"],
        ),
        component(
            "Divider",
            "Containers",
            vec![
                (
                    "orientation",
                    string_prop(Some("horizontal"), false, Some(&["horizontal", "vertical"])),
                ),
                (
                    "thickness",
                    number_prop(Some(1), false, Some(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])),
                ),
                ("color", string_prop(Some("border"), false, Some(&COLORS))),
                ("spacing", number_prop(Some(2), false, Some(&SPACING))),
            ],
            &["color", "spacing"],
        ),
    ]
}
