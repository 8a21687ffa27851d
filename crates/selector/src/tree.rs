//! Host tree contract
//!
//! The engine never owns nodes. It walks whatever tree the caller hands in
//! through [`NodeTree`], using copyable node handles (arena indices, pointers,
//! anything `Copy + Eq + Hash`).
//!
//! Only navigation, names and attributes are required. The lookup primitives
//! have tree-walk defaults; hosts with indexes override them and advertise the
//! optional ones through [`NodeTree::CAPABILITIES`].

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::UnsupportedSelector;

/// Optional host primitives the engine may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// `native_select` understands whole selectors
    pub native_query: bool,
    /// `elements_by_class` is backed by a real index
    pub by_class: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        native_query: false,
        by_class: false,
    };
}

/// Name comparison rules of the document being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    /// Tag names fold ASCII case
    #[default]
    Html,
    /// Tag names, ids and classes fold ASCII case
    Quirks,
    /// Nothing folds
    Xml,
}

impl CaseMode {
    pub fn tag_eq(self, actual: &str, wanted: &str) -> bool {
        match self {
            CaseMode::Xml => actual == wanted,
            _ => actual.eq_ignore_ascii_case(wanted),
        }
    }

    /// Comparison for ids and class names
    pub fn name_eq(self, actual: &str, wanted: &str) -> bool {
        match self {
            CaseMode::Quirks => actual.eq_ignore_ascii_case(wanted),
            _ => actual == wanted,
        }
    }

    /// Whitespace-bounded class token match
    pub fn has_class(self, class_attr: &str, wanted: &str) -> bool {
        class_attr
            .split_ascii_whitespace()
            .any(|class| self.name_eq(class, wanted))
    }
}

/// A tree the engine can query
pub trait NodeTree {
    type Node: Copy + Eq + Hash + Debug;

    const CAPABILITIES: Capabilities = Capabilities::NONE;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn is_element(&self, node: Self::Node) -> bool;

    /// Character data of a text node, `None` for everything else
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn tag_name(&self, node: Self::Node) -> Option<&str>;
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn class_name(&self, node: Self::Node) -> Option<&str> {
        self.attribute(node, "class")
    }

    /// Case rules of the document `root` belongs to
    fn case_mode(&self, _root: Self::Node) -> CaseMode {
        CaseMode::Html
    }

    fn children(&self, node: Self::Node) -> Children<'_, Self>
    where
        Self: Sized,
    {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }

    /// Pre-order walk below `root`, `root` itself excluded
    fn descendants(&self, root: Self::Node) -> Descendants<'_, Self>
    where
        Self: Sized,
    {
        Descendants {
            tree: self,
            root,
            next: self.first_child(root),
        }
    }

    fn text_content(&self, node: Self::Node) -> String
    where
        Self: Sized,
    {
        self.descendants(node)
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// First element below `root` whose id is `id`
    fn element_by_id(&self, root: Self::Node, id: &str, case: CaseMode) -> Option<Self::Node>
    where
        Self: Sized,
    {
        self.descendants(root).find(|&node| {
            self.is_element(node)
                && self
                    .attribute(node, "id")
                    .is_some_and(|value| case.name_eq(value, id))
        })
    }

    /// Elements below `root` named `tag` (`*` for all), in document order
    fn elements_by_tag(&self, root: Self::Node, tag: &str, case: CaseMode) -> Vec<Self::Node>
    where
        Self: Sized,
    {
        let any = tag == "*";
        self.descendants(root)
            .filter(|&node| {
                self.is_element(node)
                    && (any || self.tag_name(node).is_some_and(|name| case.tag_eq(name, tag)))
            })
            .collect()
    }

    /// Elements below `root` carrying every class in `classes`, in document order
    fn elements_by_class(
        &self,
        root: Self::Node,
        classes: &[String],
        case: CaseMode,
    ) -> Vec<Self::Node>
    where
        Self: Sized,
    {
        self.descendants(root)
            .filter(|&node| {
                self.is_element(node)
                    && self.class_name(node).is_some_and(|attr| {
                        classes.iter().all(|wanted| case.has_class(attr, wanted))
                    })
            })
            .collect()
    }

    /// Whole-selector query performed by the host itself
    fn native_select(
        &self,
        _root: Self::Node,
        selector: &str,
    ) -> Result<Vec<Self::Node>, UnsupportedSelector> {
        Err(UnsupportedSelector::new(
            selector,
            "host has no native selector engine",
        ))
    }
}

/// Child nodes of one parent, in order
pub struct Children<'t, T: NodeTree> {
    tree: &'t T,
    next: Option<T::Node>,
}

impl<T: NodeTree> Iterator for Children<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<T::Node> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Pre-order descendants of a root, driven by sibling links only
pub struct Descendants<'t, T: NodeTree> {
    tree: &'t T,
    root: T::Node,
    next: Option<T::Node>,
}

impl<T: NodeTree> Iterator for Descendants<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<T::Node> {
        let current = self.next?;
        self.next = match self.tree.first_child(current) {
            Some(child) => Some(child),
            None => {
                let mut node = current;
                loop {
                    if let Some(sibling) = self.tree.next_sibling(node) {
                        break Some(sibling);
                    }
                    match self.tree.parent(node) {
                        Some(parent) if parent != self.root => node = parent,
                        _ => break None,
                    }
                }
            }
        };
        Some(current)
    }
}

pub(crate) fn previous_element<T: NodeTree>(tree: &T, node: T::Node) -> Option<T::Node> {
    let mut current = tree.previous_sibling(node);
    while let Some(sibling) = current {
        if tree.is_element(sibling) {
            return Some(sibling);
        }
        current = tree.previous_sibling(sibling);
    }
    None
}

pub(crate) fn next_element<T: NodeTree>(tree: &T, node: T::Node) -> Option<T::Node> {
    let mut current = tree.next_sibling(node);
    while let Some(sibling) = current {
        if tree.is_element(sibling) {
            return Some(sibling);
        }
        current = tree.next_sibling(sibling);
    }
    None
}

/// 1-based position among element siblings
pub(crate) fn element_index<T: NodeTree>(tree: &T, node: T::Node) -> i64 {
    let mut index = 1;
    let mut current = previous_element(tree, node);
    while let Some(sibling) = current {
        index += 1;
        current = previous_element(tree, sibling);
    }
    index
}

/// True when `ancestor` sits strictly above `node`
pub(crate) fn is_descendant<T: NodeTree>(tree: &T, ancestor: T::Node, node: T::Node) -> bool {
    let mut current = tree.parent(node);
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = tree.parent(parent);
    }
    false
}

/// Topmost ancestor of `node`, or `node` itself when detached
pub(crate) fn tree_root<T: NodeTree>(tree: &T, node: T::Node) -> T::Node {
    let mut top = node;
    while let Some(parent) = tree.parent(top) {
        top = parent;
    }
    top
}
