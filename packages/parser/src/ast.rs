use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One element, fragment, or empty placeholder in the visual document model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Stable opaque identifier, unique within a tree
    pub id: String,

    pub kind: NodeKind,

    /// Element tag name (possibly dotted, e.g. `Namespace.Member`); empty
    /// for fragments and empty nodes
    pub name: String,

    /// Ordered props; insertion order is preserved for deterministic output
    pub props: Vec<PropEntry>,

    /// Children in rendering order. `Arc` so that an update rebuilds only
    /// the path from root to the target and shares untouched siblings.
    pub children: Vec<Arc<DocumentNode>>,

    /// Derived sets of `state.*` / `actions.*` references; recomputed from
    /// props, never independently authoritative
    pub bindings: NodeBindings,

    pub metadata: NodeMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Element,
    Fragment,
    Empty,
}

/// A single named prop on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropEntry {
    pub name: String,
    pub value: PropValue,
}

/// Classified prop value. Every parser and generator branch covers every
/// variant: unclassified expressions degrade explicitly to `RawExpression`
/// instead of silently losing information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropValue {
    StringLiteral { value: String },
    NumberLiteral { value: f64 },
    BooleanLiteral { value: bool },
    NullLiteral,
    /// Reference into `state.*` or `actions.*`, e.g. `state.user.name`
    BindingExpression { path: String },
    /// Fallback holding the source text of anything not classifiable
    RawExpression { source: String },
    /// Attribute present with no value; implies `true`
    BooleanShorthand,
}

// `disabled` and `disabled={true}` generate identically (a bare attribute),
// so round-trip equality treats the two as the same value.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        use PropValue::*;
        match (self, other) {
            (StringLiteral { value: a }, StringLiteral { value: b }) => a == b,
            (NumberLiteral { value: a }, NumberLiteral { value: b }) => a == b,
            (BooleanLiteral { value: a }, BooleanLiteral { value: b }) => a == b,
            (NullLiteral, NullLiteral) => true,
            (BindingExpression { path: a }, BindingExpression { path: b }) => a == b,
            (RawExpression { source: a }, RawExpression { source: b }) => a == b,
            (BooleanShorthand, BooleanShorthand) => true,
            (BooleanShorthand, BooleanLiteral { value: true })
            | (BooleanLiteral { value: true }, BooleanShorthand) => true,
            _ => false,
        }
    }
}

/// Per-node derived binding references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeBindings {
    pub state: Vec<String>,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub line: u32,
    pub column: u32,
    pub editable: bool,
}

/// Bindings contract extracted from the `@vrn-bindings` comment block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    pub state: Vec<BindingDecl>,
    pub actions: Vec<BindingDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BindingDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
        }
    }
}

impl Bindings {
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.actions.is_empty()
    }
}

/// Partial update applied to a single node. Shallow merge: fields that are
/// present replace the node's wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<PropEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<DocumentNode>>>,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.name.is_none()
            && self.props.is_none()
            && self.children.is_none()
    }
}

impl DocumentNode {
    /// Placeholder node contributing nothing observable
    pub fn empty(id: String) -> Self {
        Self {
            id,
            kind: NodeKind::Empty,
            name: String::new(),
            props: Vec::new(),
            children: Vec::new(),
            bindings: NodeBindings::default(),
            metadata: NodeMetadata::default(),
        }
    }

    pub fn get_prop(&self, name: &str) -> Option<&PropValue> {
        self.props
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    /// Depth-first search by node ID
    pub fn find(&self, node_id: &str) -> Option<&DocumentNode> {
        if self.id == node_id {
            return Some(self);
        }
        for child in &self.children {
            if let Some(found) = child.find(node_id) {
                return Some(found);
            }
        }
        None
    }

    /// Recompute the derived binding references from the given props
    pub fn compute_bindings(props: &[PropEntry]) -> NodeBindings {
        let mut bindings = NodeBindings::default();
        for entry in props {
            if let PropValue::BindingExpression { path } = &entry.value {
                if path.starts_with("state.") {
                    bindings.state.push(path.clone());
                } else if path.starts_with("actions.") {
                    bindings.actions.push(path.clone());
                }
            }
        }
        bindings
    }

    fn apply_update(&self, update: &NodeUpdate) -> DocumentNode {
        let props = update.props.clone().unwrap_or_else(|| self.props.clone());
        let bindings = Self::compute_bindings(&props);

        DocumentNode {
            id: self.id.clone(),
            kind: update.kind.unwrap_or(self.kind),
            name: update.name.clone().unwrap_or_else(|| self.name.clone()),
            children: update
                .children
                .clone()
                .unwrap_or_else(|| self.children.clone()),
            props,
            bindings,
            metadata: self.metadata.clone(),
        }
    }
}

/// Immutably replace the node matching `node_id` by merging `update` into it.
///
/// Rebuilds every node on the path from root to the target; siblings off that
/// path are shared by `Arc` clone. Returns `None` when no node matches.
pub fn update_node(
    root: &Arc<DocumentNode>,
    node_id: &str,
    update: &NodeUpdate,
) -> Option<Arc<DocumentNode>> {
    if root.id == node_id {
        return Some(Arc::new(root.apply_update(update)));
    }

    let mut changed = false;
    let children: Vec<Arc<DocumentNode>> = root
        .children
        .iter()
        .map(|child| match update_node(child, node_id, update) {
            Some(replaced) => {
                changed = true;
                replaced
            }
            None => Arc::clone(child),
        })
        .collect();

    if !changed {
        return None;
    }

    Some(Arc::new(DocumentNode {
        id: root.id.clone(),
        kind: root.kind,
        name: root.name.clone(),
        props: root.props.clone(),
        children,
        bindings: root.bindings.clone(),
        metadata: root.metadata.clone(),
    }))
}
