//! Arena DOM
//!
//! Index-based DOM tree used as the host tree for selector queries.
//!
//! ## Core Design
//!
//! ```text
//! JSON fixture → DomBuilder → DomArena (owned) → NodeId (u32) navigation
//! ```

pub mod arena;
pub mod builder;
pub mod error;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use builder::DomBuilder;
pub use error::{DomError, Result};
pub use types::*;
