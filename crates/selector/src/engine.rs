//! Query Engine - Main entry point for selector queries
//!
//! This handles:
//! - Comma alternation (results concatenated, never merged)
//! - Delegation to the host's native selector engine when it is safe
//! - Fallback to the manual parser + executor pipeline
//! - Memoizing compiled plans by literal selector text
//!
//! Only compiled plans are cached, never results: every call re-runs its plan
//! against the root it was given, and re-reads the root's case rules.

use ahash::{AHashMap, AHashSet};
use dashmap::DashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::dedup::zip;
use crate::error::{Result, UnsupportedSelector};
use crate::executor::QueryPlan;
use crate::parser::{parse, split_alternatives};
use crate::predicate::{compile, MatchContext, Skip};
use crate::strategy::Strategy;
use crate::tree::{tree_root, NodeTree};

/// Selectors the native path is never trusted with
const NATIVE_DENYLIST: &[&str] = &[":contains", "|="];

/// Input accepted by [`QueryEngine::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput<'s, N> {
    Selector(&'s str),
    /// Already resolved, returned as-is
    Node(N),
    /// Already resolved, returned as-is
    Nodes(Vec<N>),
}

impl<'s, N> From<&'s str> for QueryInput<'s, N> {
    fn from(selector: &'s str) -> Self {
        QueryInput::Selector(selector)
    }
}

impl<N> From<Vec<N>> for QueryInput<'_, N> {
    fn from(nodes: Vec<N>) -> Self {
        QueryInput::Nodes(nodes)
    }
}

/// Whole-selector delegation to the host
#[derive(Debug)]
pub struct NativePlan {
    selector: String,
}

impl NativePlan {
    fn run<T: NodeTree>(
        &self,
        tree: &T,
        root: T::Node,
    ) -> std::result::Result<Vec<T::Node>, UnsupportedSelector> {
        tree.native_select(root, &self.selector)
    }
}

/// Sizes of the memo tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub native: usize,
    pub manual: usize,
    pub parts: usize,
}

/// Memo tables, keyed by literal selector text, never evicted
#[derive(Debug, Default)]
struct EngineCache {
    native: DashMap<String, Arc<NativePlan>>,
    manual: DashMap<String, Arc<QueryPlan>>,
    parts: DashMap<String, Arc<Strategy>>,
}

/// Selector engine bound to one host tree type
///
/// The engine is `Send + Sync`; its caches may be shared across threads.
pub struct QueryEngine<T: NodeTree> {
    config: EngineConfig,
    cache: EngineCache,
    _tree: PhantomData<fn(&T)>,
}

impl<T: NodeTree> QueryEngine<T> {
    /// Create engine with default config
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create engine with custom config
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            cache: EngineCache::default(),
            _tree: PhantomData,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            native: self.cache.native.len(),
            manual: self.cache.manual.len(),
            parts: self.cache.parts.len(),
        }
    }

    /// Every node below `root` matching `selector`
    ///
    /// Each comma alternative is deduplicated on its own; alternatives are
    /// concatenated in written order.
    pub fn query(&self, tree: &T, selector: &str, root: T::Node) -> Result<Vec<T::Node>> {
        let ctx = MatchContext::new(tree, root);
        let mut alternatives = split_alternatives(selector).into_iter();

        let Some(first) = alternatives.next() else {
            return Ok(Vec::new());
        };
        let mut found = self.query_single(ctx, first, root)?;
        for alternative in alternatives {
            found.extend(self.query_single(ctx, alternative, root)?);
        }
        Ok(found)
    }

    /// Resolve a selector, or pass pre-resolved nodes straight through
    pub fn resolve<'s>(
        &self,
        tree: &T,
        input: impl Into<QueryInput<'s, T::Node>>,
        root: Option<T::Node>,
    ) -> Result<Vec<T::Node>> {
        match input.into() {
            QueryInput::Node(node) => Ok(vec![node]),
            QueryInput::Nodes(nodes) => Ok(nodes),
            QueryInput::Selector(selector) => match root {
                Some(root) => self.query(tree, selector, root),
                None => Ok(Vec::new()),
            },
        }
    }

    pub fn query_first(&self, tree: &T, selector: &str, root: T::Node) -> Result<Option<T::Node>> {
        Ok(self.query(tree, selector, root)?.into_iter().next())
    }

    /// Whether `node` is selected by `selector` evaluated from the top of its
    /// tree, the top node itself included
    pub fn matches(&self, tree: &T, node: T::Node, selector: &str) -> Result<bool> {
        Ok(!self.filter(tree, vec![node], selector)?.is_empty())
    }

    /// Keep the nodes `selector` selects from the top of their trees
    ///
    /// Order is preserved; repeated nodes collapse to their first occurrence.
    /// Always runs the manual pipeline, since the top node must be able to
    /// satisfy the first part of each alternative.
    pub fn filter(&self, tree: &T, nodes: Vec<T::Node>, selector: &str) -> Result<Vec<T::Node>> {
        let mut selected: AHashMap<T::Node, AHashSet<T::Node>> = AHashMap::new();
        let mut kept = Vec::with_capacity(nodes.len());

        for node in zip(nodes) {
            let top = tree_root(tree, node);
            if !selected.contains_key(&top) {
                let ctx = MatchContext::new(tree, top);
                let mut found = AHashSet::new();
                for alternative in split_alternatives(selector) {
                    found.extend(self.manual_plan(alternative)?.run_inclusive(ctx, top));
                }
                selected.insert(top, found);
            }
            if selected.get(&top).is_some_and(|set| set.contains(&node)) {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Whether `selector` may go to the host's native engine
    pub fn can_delegate(&self, selector: &str) -> bool {
        if !T::CAPABILITIES.native_query || !self.config.native_delegation {
            return false;
        }
        let leading_combinator = selector.starts_with(['>', '~', '+']);
        let denied = NATIVE_DENYLIST.iter().any(|pattern| selector.contains(pattern))
            || self
                .config
                .quirks
                .native_denylist
                .iter()
                .any(|pattern| selector.contains(pattern.as_str()));
        !leading_combinator && !denied
    }

    fn query_single(
        &self,
        ctx: MatchContext<'_, T>,
        selector: &str,
        root: T::Node,
    ) -> Result<Vec<T::Node>> {
        if self.can_delegate(selector) {
            match self.native_plan(selector).run(ctx.tree, root) {
                Ok(nodes) => return Ok(nodes),
                Err(err) => {
                    tracing::warn!("[QueryEngine] {}, retrying with the manual engine", err);
                }
            }
        }
        Ok(self.manual_plan(selector)?.run(ctx, root))
    }

    fn native_plan(&self, selector: &str) -> Arc<NativePlan> {
        if let Some(plan) = self.cache.native.get(selector) {
            return Arc::clone(&plan);
        }
        let plan = Arc::new(NativePlan {
            selector: selector.to_string(),
        });
        self.cache
            .native
            .insert(selector.to_string(), Arc::clone(&plan));
        plan
    }

    fn manual_plan(&self, selector: &str) -> Result<Arc<QueryPlan>> {
        if let Some(plan) = self.cache.manual.get(selector) {
            return Ok(Arc::clone(&plan));
        }

        tracing::debug!("[QueryEngine] Compiling {:?}", selector);
        let parts = parse(selector)?;
        let steps = parts
            .iter()
            .map(|part| self.strategy(part))
            .collect::<Result<Vec<_>>>()?;

        let mut plan = QueryPlan::new(selector, steps);
        if let Some(first) = parts.first().filter(|part| part.combinator.is_none()) {
            plan = plan.with_anchor(compile(first, Skip::NONE, self.config.unknown_pseudo)?);
        }
        let plan = Arc::new(plan);
        self.cache
            .manual
            .insert(selector.to_string(), Arc::clone(&plan));
        Ok(plan)
    }

    fn strategy(&self, part: &crate::parser::SelectorPart) -> Result<Arc<Strategy>> {
        let key = part.key();
        if let Some(strategy) = self.cache.parts.get(&key) {
            return Ok(Arc::clone(&strategy));
        }
        let strategy = Arc::new(Strategy::choose(part, T::CAPABILITIES, &self.config)?);
        self.cache.parts.insert(key, Arc::clone(&strategy));
        Ok(strategy)
    }
}

impl<T: NodeTree> Default for QueryEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}
