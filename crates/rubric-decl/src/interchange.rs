//! JSON interchange form of the declaration tree.
//!
//! External parsers emit a nested document whose root is the global
//! namespace:
//!
//! ```json
//! {
//!   "kind": "namespace",
//!   "name": "",
//!   "children": [
//!     { "kind": "namespace", "name": "math", "children": [
//!       { "kind": "class", "name": "Vector", "file": "vector.h", "children": [] }
//!     ] }
//!   ]
//! }
//! ```

use crate::decl::{Access, DeclId, DeclKind};
use crate::error::Result;
use crate::tree::DeclTree;
use serde::{Deserialize, Serialize};

/// One node of the interchange document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclNode {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: DeclKind,
    #[serde(default)]
    pub access: Access,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DeclNode>,
}

impl DeclTree {
    /// Build a tree from an interchange document.
    pub fn from_json(text: &str) -> Result<DeclTree> {
        let root: DeclNode = serde_json::from_str(text)?;
        let mut tree = DeclTree::new();
        for child in root.children {
            tree.insert_node(tree.root(), child);
        }
        Ok(tree)
    }

    /// Graft an interchange node (and its subtree) under `parent`.
    /// Namespaces merge with existing ones of the same name.
    pub fn insert_node(&mut self, parent: DeclId, node: DeclNode) -> DeclId {
        let id = match node.kind {
            DeclKind::Namespace => self.namespace(parent, &node.name),
            kind => self.add(parent, node.name.as_str(), kind),
        };
        if node.access != Access::Public {
            self.set_access(id, node.access);
        }
        if let Some(file) = node.file {
            self.set_file(id, file);
        }
        for child in node.children {
            self.insert_node(id, child);
        }
        id
    }

    /// Snapshot of the subtree rooted at `id`.
    pub fn to_node(&self, id: DeclId) -> DeclNode {
        let decl = self.get(id);
        DeclNode {
            name: decl.name.to_string(),
            kind: decl.kind.clone(),
            access: decl.access,
            file: decl.file.clone(),
            children: decl.children.iter().map(|&c| self.to_node(c)).collect(),
        }
    }

    /// Pretty-printed interchange document for the whole tree.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_node(self.root()))?)
    }
}
