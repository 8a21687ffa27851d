//! DOM Builder - construct arena trees from compact JSON descriptions
//!
//! Input format:
//! ```json
//! {
//!   "tag": "div",
//!   "attrs": { "id": "main", "class": "a b" },
//!   "children": [
//!     "a text node",
//!     { "comment": "a comment node" },
//!     { "tag": "p" }
//!   ]
//! }
//! ```
//!
//! A document wraps either one such object or an array of them.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::*;
use serde_json::Value;

/// Builds trees into an owned arena
pub struct DomBuilder {
    arena: DomArena,
}

impl DomBuilder {
    /// Create a builder for standards-mode HTML
    pub fn new() -> Self {
        Self::with_mode(DocumentMode::Html)
    }

    pub fn with_mode(mode: DocumentMode) -> Self {
        Self {
            arena: DomArena::with_mode(mode),
        }
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Hand the finished arena over
    pub fn into_arena(self) -> DomArena {
        self.arena
    }

    /// Parse a whole document and make it the arena root
    ///
    /// Several documents may be parsed into one builder; each call returns
    /// the new document node and the last one becomes the root.
    pub fn parse_document(&mut self, description: &Value) -> Result<NodeId> {
        let document = self.arena.create_document();
        match description {
            Value::Array(children) => {
                for child in children {
                    let child_id = self.parse_node(child)?;
                    self.arena.append_child(document, child_id)?;
                }
            }
            other => {
                let child_id = self.parse_node(other)?;
                self.arena.append_child(document, child_id)?;
            }
        }
        self.arena.set_root(document)?;
        Ok(document)
    }

    /// Parse a detached subtree
    pub fn parse_fragment(&mut self, description: &Value) -> Result<NodeId> {
        self.parse_node(description)
    }

    /// Parse a JSON document description from text
    pub fn parse_document_str(&mut self, json: &str) -> Result<NodeId> {
        let value: Value = serde_json::from_str(json)?;
        self.parse_document(&value)
    }

    /// Recursively parse one node description
    fn parse_node(&mut self, description: &Value) -> Result<NodeId> {
        if let Some(text) = description.as_str() {
            return Ok(self.arena.create_text(text));
        }

        let object = description.as_object().ok_or_else(|| {
            DomError::InvalidFixture(format!("expected string or object, got {}", description))
        })?;

        if let Some(comment) = object.get("comment") {
            let mut node = DomNode::new(0, NodeType::Comment, "#comment");
            node.node_value = comment.as_str().unwrap_or("").to_string();
            return Ok(self.arena.add_node(node));
        }

        let tag = object
            .get("tag")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DomError::InvalidFixture("element without 'tag'".to_string()))?;
        let node_id = self.arena.create_element(tag);

        if let Some(attrs) = object.get("attrs") {
            let attrs = attrs.as_object().ok_or_else(|| {
                DomError::InvalidFixture(format!("'attrs' of <{}> must be an object", tag))
            })?;
            for (name, value) in attrs {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Bool(true) => String::new(),
                    other => other.to_string(),
                };
                self.arena.set_attribute(node_id, name, &value)?;
            }
        }

        if let Some(children) = object.get("children").and_then(|v| v.as_array()) {
            for child in children {
                let child_id = self.parse_node(child)?;
                self.arena.append_child(node_id, child_id)?;
            }
        }

        Ok(node_id)
    }
}

impl Default for DomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let mut builder = DomBuilder::new();
        let root = builder
            .parse_document(&serde_json::json!({
                "tag": "html",
                "children": [{
                    "tag": "body",
                    "attrs": { "id": "main", "hidden": true },
                    "children": ["Hello", { "comment": "note" }]
                }]
            }))
            .unwrap();

        let arena = builder.arena();
        assert_eq!(arena.root_id(), Some(root));
        assert_eq!(arena.len(), 5);

        let body = arena.find_by_id("main")[0];
        assert_eq!(arena.attribute(body, "hidden").unwrap(), Some(""));
        let children = arena.children(body).unwrap();
        assert!(children[0].is_text());
        assert_eq!(children[1].node_type, NodeType::Comment);
    }

    #[test]
    fn test_parse_rejects_untagged_element() {
        let mut builder = DomBuilder::new();
        let err = builder
            .parse_document(&serde_json::json!({ "attrs": {} }))
            .unwrap_err();
        assert!(matches!(err, DomError::InvalidFixture(_)));
    }

    #[test]
    fn test_parse_document_str() {
        let mut builder = DomBuilder::with_mode(DocumentMode::Xml);
        builder
            .parse_document_str(r#"[{"tag": "a"}, {"tag": "b"}]"#)
            .unwrap();
        assert_eq!(builder.arena().mode(), DocumentMode::Xml);
        assert_eq!(builder.arena().len(), 3);
    }

    #[test]
    fn test_parse_fragment_stays_detached() {
        let mut builder = DomBuilder::new();
        let fragment = builder
            .parse_fragment(&serde_json::json!({ "tag": "li", "children": ["x"] }))
            .unwrap();

        let arena = builder.arena();
        assert_eq!(arena.root_id(), None);
        assert_eq!(arena.get(fragment).unwrap().parent_id, None);
        assert_eq!(arena.children(fragment).unwrap().len(), 1);
    }
}
