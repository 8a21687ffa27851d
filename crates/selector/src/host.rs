//! [`NodeTree`] for the arena DOM
//!
//! The arena keeps an `id` index and answers tag and class lookups itself, so
//! those primitives bypass the generic tree walks. It has no native selector
//! engine of its own.

use dom::{DocumentMode, DomArena, DomNode, NodeId};
use smallvec::SmallVec;

use crate::tree::{Capabilities, CaseMode, NodeTree};

fn case_of(arena: &DomArena) -> CaseMode {
    match arena.mode() {
        DocumentMode::Html => CaseMode::Html,
        DocumentMode::Quirks => CaseMode::Quirks,
        DocumentMode::Xml => CaseMode::Xml,
    }
}

fn get_node(arena: &DomArena, id: NodeId) -> Option<&DomNode> {
    arena.get(id).ok()
}

impl NodeTree for DomArena {
    type Node = NodeId;

    const CAPABILITIES: Capabilities = Capabilities {
        native_query: false,
        by_class: true,
    };

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        get_node(self, node)?.parent_id
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        get_node(self, node)?.children_ids.first().copied()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        get_node(self, node)?.prev_sibling_id
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        get_node(self, node)?.next_sibling_id
    }

    fn is_element(&self, node: NodeId) -> bool {
        get_node(self, node).is_some_and(DomNode::is_element)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        get_node(self, node)
            .filter(|n| n.is_text())
            .map(|n| n.node_value.as_str())
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        get_node(self, node)?.tag_name()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        get_node(self, node)?.attr(name)
    }

    fn case_mode(&self, _root: NodeId) -> CaseMode {
        case_of(self)
    }

    fn text_content(&self, node: NodeId) -> String {
        dom::utils::get_text_content(self, node).unwrap_or_default()
    }

    fn element_by_id(&self, root: NodeId, id: &str, case: CaseMode) -> Option<NodeId> {
        if case == CaseMode::Quirks {
            // The index is exact; quirks ids need the folding walk
            return self
                .find_in(root, |node| {
                    node.is_element()
                        && node.attr("id").is_some_and(|value| case.name_eq(value, id))
                })
                .first()
                .copied();
        }

        let indexed: SmallVec<[NodeId; 1]> = self
            .find_by_id(id)
            .iter()
            .copied()
            .filter(|&node| self.is_element(node) && self.is_ancestor(root, node))
            .collect();

        match indexed.as_slice() {
            [] => None,
            [only] => Some(*only),
            // The index is in assignment order; the walk gives document order
            _ => self
                .find_in(root, |node| indexed.contains(&node.node_id))
                .first()
                .copied(),
        }
    }

    fn elements_by_tag(&self, root: NodeId, tag: &str, case: CaseMode) -> Vec<NodeId> {
        if case == case_of(self) {
            return self.find_by_tag(root, tag);
        }
        let any = tag == "*";
        self.find_in(root, |node| {
            node.is_element() && (any || case.tag_eq(&node.node_name, tag))
        })
    }

    fn elements_by_class(&self, root: NodeId, classes: &[String], case: CaseMode) -> Vec<NodeId> {
        if case == case_of(self) {
            return self.find_by_class(root, classes);
        }
        self.find_in(root, |node| {
            node.is_element()
                && node.attr("class").is_some_and(|attr| {
                    classes.iter().all(|wanted| case.has_class(attr, wanted))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;
    use dom::DomBuilder;

    #[test]
    fn test_navigation_follows_arena_links() {
        let (arena, doc) = fixture(serde_json::json!({
            "tag": "div", "children": [{ "tag": "a" }, "t", { "tag": "b" }]
        }));
        let div = arena.first_child(doc).unwrap();
        let a = arena.first_child(div).unwrap();
        let text = arena.next_sibling(a).unwrap();
        let b = arena.next_sibling(text).unwrap();

        assert_eq!(NodeTree::parent(&arena, div), Some(doc));
        assert_eq!(arena.previous_sibling(b), Some(text));
        assert_eq!(arena.text(text), Some("t"));
        assert_eq!(arena.text(a), None);
        assert!(!arena.is_element(text));
        assert_eq!(NodeTree::tag_name(&arena, b), Some("b"));
        assert_eq!(NodeTree::parent(&arena, 9999), None);
        assert_eq!(NodeTree::text_content(&arena, div), "t");
    }

    #[test]
    fn test_id_lookup_is_scoped_to_root() {
        let mut builder = DomBuilder::new();
        let first = builder
            .parse_document(&serde_json::json!({ "tag": "p", "attrs": { "id": "x" } }))
            .unwrap();
        let second = builder
            .parse_document(&serde_json::json!({ "tag": "q", "attrs": { "id": "x" } }))
            .unwrap();
        let arena = builder.into_arena();

        let in_first = arena.element_by_id(first, "x", CaseMode::Html).unwrap();
        let in_second = arena.element_by_id(second, "x", CaseMode::Html).unwrap();
        assert_eq!(NodeTree::tag_name(&arena, in_first), Some("p"));
        assert_eq!(NodeTree::tag_name(&arena, in_second), Some("q"));
        assert_eq!(arena.element_by_id(in_first, "x", CaseMode::Html), None);
    }

    #[test]
    fn test_quirks_id_lookup_folds_case() {
        let mut builder = DomBuilder::with_mode(DocumentMode::Quirks);
        let doc = builder
            .parse_document(&serde_json::json!({ "tag": "p", "attrs": { "id": "Main" } }))
            .unwrap();
        let arena = builder.into_arena();

        assert_eq!(arena.case_mode(doc), CaseMode::Quirks);
        assert!(arena.element_by_id(doc, "main", CaseMode::Quirks).is_some());
        assert!(arena.element_by_id(doc, "main", CaseMode::Html).is_none());
    }

    #[test]
    fn test_lookups_honor_requested_case() {
        let (arena, doc) = fixture(serde_json::json!({
            "tag": "DIV", "attrs": { "class": "Wide" }
        }));
        assert_eq!(arena.elements_by_tag(doc, "div", CaseMode::Html).len(), 1);
        assert!(arena.elements_by_tag(doc, "div", CaseMode::Xml).is_empty());
        assert!(arena
            .elements_by_class(doc, &["wide".to_string()], CaseMode::Html)
            .is_empty());
        assert_eq!(
            arena
                .elements_by_class(doc, &["wide".to_string()], CaseMode::Quirks)
                .len(),
            1
        );
    }

    #[test]
    fn test_id_lookup_prefers_document_order() {
        let (mut arena, doc) = fixture(serde_json::json!([
            { "tag": "p", "attrs": { "title": "a" } },
            { "tag": "p", "attrs": { "title": "b" } }
        ]));
        let paragraphs = arena.find_by_tag(doc, "p");
        arena.set_attribute(paragraphs[1], "id", "x").unwrap();
        arena.set_attribute(paragraphs[0], "id", "x").unwrap();
        assert_eq!(arena.find_by_id("x"), &[paragraphs[1], paragraphs[0]]);

        assert_eq!(
            arena.element_by_id(doc, "x", CaseMode::Html),
            Some(paragraphs[0])
        );
        assert_eq!(
            arena.element_by_id(doc, "x", CaseMode::Html),
            arena
                .descendants(doc)
                .find(|&n| NodeTree::attribute(&arena, n, "id") == Some("x"))
        );
    }
}
