//! Arena-based DOM tree storage
//!
//! This arena eliminates:
//! - Rc/Arc overhead (16 bytes per pointer)
//! - Recursive function calls (stack overflow risk)
//! - Cache misses (nodes stored sequentially)
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Several documents may live in one arena; every lookup that takes a
//! `root` only ever reports nodes below that root.

use crate::error::{DomError, Result};
use crate::types::{DocumentMode, DomNode, NodeId, NodeType};
use ahash::AHashMap;
use smallvec::SmallVec;

/// Arena allocator for DOM nodes
///
/// Design:
/// - Single Vec<DomNode> for sequential allocation
/// - HashMap for `id` attribute → NodeId lookup (the fast id path)
/// - No Rc/Arc: use indices everywhere
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// `id` attribute value → every node carrying it, in insertion order
    id_index: AHashMap<String, SmallVec<[NodeId; 1]>>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,

    mode: DocumentMode,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024) // Pre-allocate for typical page
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            id_index: AHashMap::with_capacity(capacity / 8),
            root_id: None,
            mode: DocumentMode::Html,
        }
    }

    /// Create an arena for a document of the given mode
    pub fn with_mode(mode: DocumentMode) -> Self {
        let mut arena = Self::new();
        arena.mode = mode;
        arena
    }

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DocumentMode) {
        self.mode = mode;
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The node's `node_id` is overwritten with its arena slot.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        if let Some(id) = node.attributes.get("id") {
            self.id_index.entry(id.clone()).or_default().push(node_id);
        }
        self.nodes.push(node);
        node_id
    }

    /// Allocate a detached document node
    pub fn create_document(&mut self) -> NodeId {
        self.add_node(DomNode::new(0, NodeType::Document, "#document"))
    }

    /// Allocate a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.add_node(DomNode::new(0, NodeType::Element, tag))
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Text, "#text");
        node.node_value = text.to_string();
        self.add_node(node)
    }

    /// Append `child` as the last child of `parent`, wiring sibling links
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        if self.get(child_id)?.parent_id.is_some() {
            return Err(DomError::AlreadyAttached { child: child_id });
        }
        let last = self.get(parent_id)?.children_ids.last().copied();

        if let Some(last_id) = last {
            self.get_mut(last_id)?.next_sibling_id = Some(child_id);
        }
        let child = self.get_mut(child_id)?;
        child.parent_id = Some(parent_id);
        child.prev_sibling_id = last;
        child.next_sibling_id = None;
        self.get_mut(parent_id)?.children_ids.push(child_id);
        Ok(())
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    ///
    /// Attribute changes must go through [`DomArena::set_attribute`] to keep
    /// the id index current.
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get a single attribute
    pub fn attribute(&self, node_id: NodeId, name: &str) -> Result<Option<&str>> {
        Ok(self.get(node_id)?.attr(name))
    }

    /// Set a single attribute, keeping the id index in sync
    pub fn set_attribute(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.get_mut(node_id)?;
        if !node.is_element() {
            return Err(DomError::InvalidNodeType {
                expected: "Element".to_string(),
                actual: format!("{:?}", node.node_type),
            });
        }
        let previous = node.attributes.insert(name.to_string(), value.to_string());

        if name == "id" {
            if let Some(old) = previous {
                if let Some(ids) = self.id_index.get_mut(&old) {
                    ids.retain(|id| *id != node_id);
                }
            }
            self.id_index
                .entry(value.to_string())
                .or_default()
                .push(node_id);
        }
        Ok(())
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// True when `ancestor` sits strictly above `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(node as usize).and_then(|n| n.parent_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id as usize).and_then(|n| n.parent_id);
        }
        false
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Find nodes below `root` matching predicate, in document order
    pub fn find_in<F>(&self, root: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut found = Vec::new();
        let walked = self.traverse_df(root, |node| {
            if node.node_id != root && predicate(node) {
                found.push(node.node_id);
            }
            Ok(())
        });
        match walked {
            Ok(()) => found,
            // Unknown root: there is no subtree to search
            Err(_) => Vec::new(),
        }
    }

    /// Find all elements below `root` by tag name (`*` matches any element)
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let any = tag == "*";
        let fold = self.mode != DocumentMode::Xml;
        self.find_in(root, |node| {
            node.is_element()
                && (any
                    || if fold {
                        node.node_name.eq_ignore_ascii_case(tag)
                    } else {
                        node.node_name == tag
                    })
        })
    }

    /// Find all elements below `root` carrying every one of `classes`
    pub fn find_by_class<S: AsRef<str>>(&self, root: NodeId, classes: &[S]) -> Vec<NodeId> {
        let fold = self.mode == DocumentMode::Quirks;
        self.find_in(root, |node| {
            node.is_element()
                && classes.iter().all(|wanted| {
                    let wanted = wanted.as_ref();
                    node.class_list().any(|class| {
                        if fold {
                            class.eq_ignore_ascii_case(wanted)
                        } else {
                            class == wanted
                        }
                    })
                })
        })
    }

    /// Every element carrying `id`, in insertion order
    pub fn find_by_id(&self, id: &str) -> &[NodeId] {
        self.id_index.get(id).map(|ids| ids.as_slice()).unwrap_or(&[])
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (DomArena, NodeId, NodeId, NodeId) {
        let mut arena = DomArena::new();
        let root = arena.create_element("div");
        let first = arena.create_element("span");
        let second = arena.create_element("SPAN");
        arena.append_child(root, first).unwrap();
        arena.append_child(root, second).unwrap();
        (arena, root, first, second)
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = arena.create_element("div");
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.node_id, 0);
    }

    #[test]
    fn test_sibling_links() {
        let (arena, root, first, second) = small_tree();

        assert_eq!(arena.get(first).unwrap().next_sibling_id, Some(second));
        assert_eq!(arena.get(second).unwrap().prev_sibling_id, Some(first));
        assert_eq!(arena.get(second).unwrap().parent_id, Some(root));
        assert!(arena.is_ancestor(root, second));
        assert!(!arena.is_ancestor(second, root));
    }

    #[test]
    fn test_append_twice_rejected() {
        let (mut arena, root, first, _) = small_tree();
        assert!(matches!(
            arena.append_child(root, first),
            Err(DomError::AlreadyAttached { .. })
        ));
    }

    #[test]
    fn test_id_index_follows_set_attribute() {
        let (mut arena, _, first, second) = small_tree();

        arena.set_attribute(first, "id", "a").unwrap();
        assert_eq!(arena.find_by_id("a"), &[first]);

        arena.set_attribute(first, "id", "b").unwrap();
        arena.set_attribute(second, "id", "b").unwrap();
        assert!(arena.find_by_id("a").is_empty());
        assert_eq!(arena.find_by_id("b"), &[first, second]);
    }

    #[test]
    fn test_find_by_tag_folds_case_in_html() {
        let (mut arena, root, first, second) = small_tree();
        assert_eq!(arena.find_by_tag(root, "span"), vec![first, second]);

        arena.set_mode(DocumentMode::Xml);
        assert_eq!(arena.find_by_tag(root, "span"), vec![first]);
        assert_eq!(arena.find_by_tag(root, "*"), vec![first, second]);
    }

    #[test]
    fn test_lookups_under_unknown_root_are_empty() {
        let (arena, _, _, _) = small_tree();
        assert!(arena.find_by_tag(999, "*").is_empty());
        assert!(arena.find_in(999, |_| true).is_empty());
    }

    #[test]
    fn test_find_by_class_requires_all() {
        let (mut arena, root, first, second) = small_tree();
        arena.set_attribute(first, "class", "a b").unwrap();
        arena.set_attribute(second, "class", "a").unwrap();

        assert_eq!(arena.find_by_class(root, &["a"]), vec![first, second]);
        assert_eq!(arena.find_by_class(root, &["b", "a"]), vec![first]);
    }

    #[test]
    fn test_traverse_df() {
        let (mut arena, root, first, _) = small_tree();
        let text = arena.create_text("hi");
        arena.append_child(first, text).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["div", "span", "#text", "SPAN"]);
    }
}
