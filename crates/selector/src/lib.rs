//! CSS Selector Engine
//!
//! Resolves CSS selector strings against any host tree implementing
//! [`NodeTree`], returning matching nodes in document order.
//!
//! ## Pipeline
//!
//! ```text
//! "div.a > p"  →  split on ','  →  native delegation?  ──yes──→  host engine
//!                                        │ no / failed
//!                                        ↓
//!                 parse → [SelectorPart] → Strategy per part → QueryPlan
//!                                                                   │
//!          root ──→ step 1 candidates ──→ step 2 candidates ──→ … ──┘
//!                   (zip dedup between steps)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dom::DomBuilder;
//! use selector::QueryEngine;
//!
//! let mut builder = DomBuilder::new();
//! let doc = builder.parse_document_str(r#"{"tag": "ul", "children": [{"tag": "li"}]}"#)?;
//! let arena = builder.into_arena();
//!
//! let engine = QueryEngine::new();
//! let items = engine.query(&arena, "ul > li:first-child", doc)?;
//! ```

pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod executor;
pub mod host;
pub mod nth;
pub mod parser;
pub mod predicate;
pub mod strategy;
pub mod tree;

pub use config::{EngineConfig, PseudoPolicy, Quirks};
pub use engine::{CacheStats, QueryEngine, QueryInput};
pub use error::{Result, SelectorError, UnsupportedSelector};
pub use parser::{parse, split_alternatives, SelectorPart};
pub use tree::{Capabilities, CaseMode, NodeTree};
