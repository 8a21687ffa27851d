//! Step executor
//!
//! Drives a chain of retrieval strategies across a root. Candidates start as
//! `[root]`; every step expands each candidate and the union becomes the next
//! candidate list. Steps that expand more than one candidate drop repeats as
//! they go (first occurrence wins). An empty step ends the query early.
//!
//! Output never leaves the root's subtree: sibling walks are clipped to it.

use std::sync::Arc;

use crate::dedup::DedupScope;
use crate::predicate::{MatchContext, Predicate};
use crate::strategy::Strategy;
use crate::tree::{is_descendant, NodeTree};

/// Compiled form of one comma-free selector
#[derive(Debug)]
pub struct QueryPlan {
    selector: String,
    steps: Vec<Arc<Strategy>>,
    /// Full test of the first part, when it has no leading combinator
    anchor: Option<Predicate>,
}

impl QueryPlan {
    pub fn new(selector: &str, steps: Vec<Arc<Strategy>>) -> Self {
        Self {
            selector: selector.to_string(),
            steps,
            anchor: None,
        }
    }

    /// Let the root itself satisfy the first part in [`QueryPlan::run_inclusive`]
    pub fn with_anchor(mut self, anchor: Predicate) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn steps(&self) -> &[Arc<Strategy>] {
        &self.steps
    }

    /// Matches strictly below `root`
    pub fn run<T: NodeTree>(&self, ctx: MatchContext<'_, T>, root: T::Node) -> Vec<T::Node> {
        self.execute(ctx, root, false)
    }

    /// Like [`QueryPlan::run`], but `root` may also stand in for the first part
    pub fn run_inclusive<T: NodeTree>(
        &self,
        ctx: MatchContext<'_, T>,
        root: T::Node,
    ) -> Vec<T::Node> {
        self.execute(ctx, root, true)
    }

    fn execute<T: NodeTree>(
        &self,
        ctx: MatchContext<'_, T>,
        root: T::Node,
        inclusive: bool,
    ) -> Vec<T::Node> {
        if self.steps.is_empty() {
            return Vec::new();
        }

        let mut candidates = vec![root];
        let mut seen = DedupScope::new();

        for (depth, step) in self.steps.iter().enumerate() {
            let mut next = match candidates.as_slice() {
                [single] => step.retrieve(ctx, *single),
                many => {
                    seen.begin_pass();
                    let mut next = Vec::new();
                    for &candidate in many {
                        next.extend(
                            step.retrieve(ctx, candidate)
                                .into_iter()
                                .filter(|&node| seen.first_sighting(node)),
                        );
                    }
                    next
                }
            };

            if depth == 0
                && inclusive
                && self
                    .anchor
                    .as_ref()
                    .is_some_and(|anchor| anchor.matches(ctx, root))
            {
                next.insert(0, root);
            }
            if step.walks_siblings() {
                next.retain(|&node| is_descendant(ctx.tree, root, node));
            }

            if next.is_empty() {
                tracing::trace!(
                    "[Executor] {:?} ran dry at step {} of {}",
                    self.selector,
                    depth + 1,
                    self.steps.len()
                );
                return next;
            }
            candidates = next;
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, PseudoPolicy};
    use crate::parser::parse;
    use crate::predicate::{compile, Skip};
    use crate::test_support::{fixture, ids};
    use crate::tree::Capabilities;

    fn plan(selector: &str) -> QueryPlan {
        let steps = parse(selector)
            .unwrap()
            .iter()
            .map(|part| {
                Arc::new(Strategy::choose(part, Capabilities::NONE, &EngineConfig::default()).unwrap())
            })
            .collect();
        QueryPlan::new(selector, steps)
    }

    #[test]
    fn test_nested_contexts_do_not_duplicate() {
        let (arena, doc) = fixture(serde_json::json!({
            "tag": "div", "attrs": { "id": "outer" }, "children": [
                { "tag": "p", "attrs": { "id": "a" } },
                { "tag": "div", "attrs": { "id": "inner" }, "children": [
                    { "tag": "p", "attrs": { "id": "b" } }
                ]},
                { "tag": "p", "attrs": { "id": "c" } }
            ]
        }));
        let ctx = MatchContext::new(&arena, doc);

        let found = plan("div p").run(ctx, doc);
        assert_eq!(ids(&arena, &found), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_step_short_circuits() {
        let (arena, doc) = fixture(serde_json::json!({ "tag": "div" }));
        let ctx = MatchContext::new(&arena, doc);
        assert!(plan("section div").run(ctx, doc).is_empty());
        assert!(QueryPlan::new("", Vec::new()).run(ctx, doc).is_empty());
    }

    #[test]
    fn test_leading_child_combinator_is_relative_to_root() {
        let (arena, doc) = fixture(serde_json::json!({
            "tag": "div", "children": [
                { "tag": "p", "attrs": { "id": "direct" }, "children": [
                    { "tag": "p", "attrs": { "id": "nested" } }
                ]}
            ]
        }));
        let ctx = MatchContext::new(&arena, doc);
        let div = arena.find_by_tag(doc, "div")[0];

        assert_eq!(ids(&arena, &plan("> p").run(ctx, div)), vec!["direct"]);
    }

    #[test]
    fn test_sibling_steps_stay_below_root() {
        let (arena, doc) = fixture(serde_json::json!([
            { "tag": "div", "attrs": { "id": "scope" }, "children": [
                { "tag": "p", "attrs": { "id": "inside" } },
                { "tag": "p", "attrs": { "id": "last" } }
            ]},
            { "tag": "p", "attrs": { "id": "outside" } }
        ]));
        let ctx = MatchContext::new(&arena, doc);
        let scope = arena.find_by_id("scope")[0];

        assert!(plan("~ p").run(ctx, scope).is_empty());
        assert!(plan("+ p").run(ctx, scope).is_empty());
        assert_eq!(ids(&arena, &plan("p ~ p").run(ctx, scope)), vec!["last"]);
        assert_eq!(ids(&arena, &plan("~ p").run(ctx, doc)), Vec::<String>::new());
    }

    #[test]
    fn test_inclusive_run_anchors_on_root() {
        let (arena, doc) = fixture(serde_json::json!({
            "tag": "div", "attrs": { "id": "top" }, "children": [
                { "tag": "p", "attrs": { "id": "child" } }
            ]
        }));
        let ctx = MatchContext::new(&arena, doc);
        let top = arena.find_by_id("top")[0];
        let anchored = |selector: &str| {
            let part = &parse(selector).unwrap()[0];
            let anchor = compile(part, Skip::NONE, PseudoPolicy::Permissive).unwrap();
            plan(selector).with_anchor(anchor)
        };

        assert!(anchored("div").run(ctx, top).is_empty());
        assert_eq!(ids(&arena, &anchored("div").run_inclusive(ctx, top)), vec!["top"]);
        assert_eq!(
            ids(&arena, &anchored("div > p").run_inclusive(ctx, top)),
            vec!["child"]
        );
        assert!(anchored("span").run_inclusive(ctx, top).is_empty());
        // Without an anchor the root is never a candidate
        assert!(plan("div").run_inclusive(ctx, top).is_empty());
    }
}
