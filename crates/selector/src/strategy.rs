//! Retrieval strategy selection
//!
//! Each simple selector gets the cheapest way of producing its candidates
//! from one context node. The decision list, first match wins:
//!
//! 1. `#id` without combinator: id index, then the rest of the predicate
//! 2. classes and a host class index: class lookup, then the rest
//! 3. bare tag: tag lookup, nothing to filter
//! 4. anything else: tag lookup (or universal walk), then the full predicate
//!
//! Parts joined by `>`, `~` or `+` ignore the list and walk relative to the
//! context node instead.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::parser::{Combinator, SelectorPart};
use crate::predicate::{compile, MatchContext, Predicate, Skip};
use crate::tree::{is_descendant, next_element, Capabilities, NodeTree};

#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    ById { id: String, filter: Predicate },
    ByClass { classes: Vec<String>, filter: Predicate },
    ByTag { tag: String },
    /// Tag lookup (`*` walks every element) followed by the predicate
    Scan { tag: String, filter: Predicate },
    /// `>`
    Children { filter: Predicate },
    /// `+`
    NextSibling { filter: Predicate },
    /// `~`
    FollowingSiblings { filter: Predicate },
}

/// Compiled retrieval for one simple selector
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub retrieval: Retrieval,
}

impl Strategy {
    pub fn choose(
        part: &SelectorPart,
        capabilities: Capabilities,
        config: &EngineConfig,
    ) -> Result<Self> {
        let policy = config.unknown_pseudo;

        let retrieval = match part.combinator {
            // Sibling and child walks only ever yield elements
            Some(combinator) => {
                let filter = compile(part, Skip::NONE.element(), policy)?;
                match combinator {
                    Combinator::Child => Retrieval::Children { filter },
                    Combinator::Adjacent => Retrieval::NextSibling { filter },
                    Combinator::Sibling => Retrieval::FollowingSiblings { filter },
                }
            }
            None => {
                if let Some(id) = &part.id {
                    Retrieval::ById {
                        id: id.clone(),
                        filter: compile(part, Skip::NONE.id(), policy)?,
                    }
                } else if capabilities.by_class
                    && !config.quirks.class_lookup_unreliable
                    && !part.classes.is_empty()
                {
                    Retrieval::ByClass {
                        classes: part.classes.to_vec(),
                        filter: compile(part, Skip::NONE.element().classes().id(), policy)?,
                    }
                } else if !part.is_universal() && !part.has_filters() {
                    Retrieval::ByTag {
                        tag: part.tag.clone(),
                    }
                } else {
                    Retrieval::Scan {
                        tag: part.tag.clone(),
                        filter: compile(part, Skip::NONE.element().tag(), policy)?,
                    }
                }
            }
        };

        tracing::trace!("[Strategy] {} -> {:?}", part, retrieval);
        Ok(Self { retrieval })
    }

    /// Whether the walk can leave the subtree of its context node
    pub fn walks_siblings(&self) -> bool {
        matches!(
            self.retrieval,
            Retrieval::NextSibling { .. } | Retrieval::FollowingSiblings { .. }
        )
    }

    /// Candidates for this part relative to `context`, in document order
    pub fn retrieve<T: NodeTree>(&self, ctx: MatchContext<'_, T>, context: T::Node) -> Vec<T::Node> {
        let tree = ctx.tree;
        match &self.retrieval {
            Retrieval::ById { id, filter } => tree
                .element_by_id(context, id, ctx.case)
                .filter(|&node| is_descendant(tree, context, node) && filter.matches(ctx, node))
                .into_iter()
                .collect(),
            Retrieval::ByClass { classes, filter } => {
                let mut nodes = tree.elements_by_class(context, classes, ctx.case);
                if !filter.is_match_all() {
                    nodes.retain(|&node| filter.matches(ctx, node));
                }
                nodes
            }
            Retrieval::ByTag { tag } => tree.elements_by_tag(context, tag, ctx.case),
            Retrieval::Scan { tag, filter } => {
                let mut nodes = tree.elements_by_tag(context, tag, ctx.case);
                if !filter.is_match_all() {
                    nodes.retain(|&node| filter.matches(ctx, node));
                }
                nodes
            }
            Retrieval::Children { filter } => tree
                .children(context)
                .filter(|&child| tree.is_element(child) && filter.matches(ctx, child))
                .collect(),
            Retrieval::NextSibling { filter } => next_element(tree, context)
                .filter(|&sibling| filter.matches(ctx, sibling))
                .into_iter()
                .collect(),
            Retrieval::FollowingSiblings { filter } => {
                let mut nodes = Vec::new();
                let mut current = next_element(tree, context);
                while let Some(sibling) = current {
                    if filter.matches(ctx, sibling) {
                        nodes.push(sibling);
                    }
                    current = next_element(tree, sibling);
                }
                nodes
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::test_support::{fixture, ids};

    fn choose(selector: &str, capabilities: Capabilities) -> Strategy {
        let parts = parse(selector).unwrap();
        Strategy::choose(parts.last().unwrap(), capabilities, &EngineConfig::default()).unwrap()
    }

    const BY_CLASS: Capabilities = Capabilities {
        native_query: false,
        by_class: true,
    };

    #[test]
    fn test_decision_list() {
        assert!(matches!(
            choose("p#x.a", BY_CLASS).retrieval,
            Retrieval::ById { .. }
        ));
        assert!(matches!(
            choose("p.a", BY_CLASS).retrieval,
            Retrieval::ByClass { .. }
        ));
        assert!(matches!(
            choose("p.a", Capabilities::NONE).retrieval,
            Retrieval::Scan { .. }
        ));
        assert!(matches!(
            choose("p", BY_CLASS).retrieval,
            Retrieval::ByTag { .. }
        ));
        assert!(matches!(
            choose("*", BY_CLASS).retrieval,
            Retrieval::Scan { ref filter, .. } if filter.is_match_all()
        ));
        assert!(matches!(
            choose("div > #x", BY_CLASS).retrieval,
            Retrieval::Children { .. }
        ));
        assert!(matches!(
            choose("a + b", BY_CLASS).retrieval,
            Retrieval::NextSibling { .. }
        ));
        assert!(matches!(
            choose("a ~ b", BY_CLASS).retrieval,
            Retrieval::FollowingSiblings { .. }
        ));
    }

    #[test]
    fn test_class_quirk_disables_class_lookup() {
        let mut config = EngineConfig::default();
        config.quirks.class_lookup_unreliable = true;
        let part = &parse(".a").unwrap()[0];
        let strategy = Strategy::choose(part, BY_CLASS, &config).unwrap();
        assert!(matches!(strategy.retrieval, Retrieval::Scan { .. }));
    }

    #[test]
    fn test_id_lookup_stays_below_context() {
        let (arena, doc) = fixture(serde_json::json!([
            { "tag": "div", "attrs": { "id": "left" } },
            { "tag": "div", "attrs": { "id": "right" }, "children": [
                { "tag": "span", "attrs": { "id": "x" } }
            ]}
        ]));
        let ctx = MatchContext::new(&arena, doc);
        let left = arena.find_by_id("left")[0];
        let right = arena.find_by_id("right")[0];

        let strategy = choose("#x", BY_CLASS);
        assert!(strategy.retrieve(ctx, left).is_empty());
        assert_eq!(ids(&arena, &strategy.retrieve(ctx, right)), vec!["x"]);
        assert!(choose("p#x", BY_CLASS).retrieve(ctx, doc).is_empty());
    }

    #[test]
    fn test_sibling_walks() {
        let (arena, doc) = fixture(serde_json::json!({
            "tag": "div",
            "children": [
                { "tag": "h1", "attrs": { "id": "h" } },
                "text",
                { "tag": "p", "attrs": { "id": "p1" } },
                { "tag": "span", "attrs": { "id": "s" } },
                { "tag": "p", "attrs": { "id": "p2" } }
            ]
        }));
        let ctx = MatchContext::new(&arena, doc);
        let h1 = arena.find_by_id("h")[0];

        assert_eq!(ids(&arena, &choose("x + p", BY_CLASS).retrieve(ctx, h1)), vec!["p1"]);
        assert!(choose("x + span", BY_CLASS).retrieve(ctx, h1).is_empty());
        assert_eq!(
            ids(&arena, &choose("x ~ p", BY_CLASS).retrieve(ctx, h1)),
            vec!["p1", "p2"]
        );

        let div = arena.find_by_tag(doc, "div")[0];
        assert_eq!(
            ids(&arena, &choose("x > *", BY_CLASS).retrieve(ctx, div)),
            vec!["h", "p1", "s", "p2"]
        );
    }
}
