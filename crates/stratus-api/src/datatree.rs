//! Folding raw interface values into a hierarchical tree.
//!
//! The data plane returns stored values as nested JSON keyed by path
//! segments. The interface definition decides where the structure stops:
//! a path matching a declared mapping endpoint is a leaf, even when its
//! value is itself an object (e.g. a timestamped sample or an
//! object-aggregated row). Everything above the leaves is branch
//! structure keyed by the segment names actually present in the data.

use indexmap::IndexMap;
use serde_json::Value;

use stratus_model::Interface;

/// One node of a folded device data tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DataTreeNode {
    Branch(IndexMap<String, DataTreeNode>),
    Leaf(Value),
}

impl DataTreeNode {
    /// Walk the tree by a slash-separated path.
    pub fn get(&self, path: &str) -> Option<&Self> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match node {
                Self::Branch(children) => node = children.get(segment)?,
                Self::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// The stored value, if this node is a leaf.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Branch(_) => None,
        }
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => children.values().map(Self::leaf_count).sum(),
        }
    }
}

/// Fold the raw values of one interface into a [`DataTreeNode`], keyed by
/// the interface's declared endpoint structure.
pub fn fold_interface_values(interface: &Interface, raw: &Value) -> DataTreeNode {
    descend(interface, raw, "")
}

fn descend(interface: &Interface, value: &Value, path: &str) -> DataTreeNode {
    if !path.is_empty() && interface.mapping_for_path(path).is_some() {
        return DataTreeNode::Leaf(value.clone());
    }

    match value {
        Value::Object(entries) => DataTreeNode::Branch(
            entries
                .iter()
                .map(|(key, child)| {
                    let child_path = format!("{path}/{key}");
                    (key.clone(), descend(interface, child, &child_path))
                })
                .collect(),
        ),
        other => DataTreeNode::Leaf(other.clone()),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
