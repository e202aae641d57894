//! Query-time retrieval and routing pipeline.
//!
//! Raw query text flows through filter parsing, model routing, vector
//! retrieval with exact post-filtering, and deterministic prompt assembly
//! before reaching the chat model. Every component except the engine is a
//! pure function over its inputs.

pub mod classify;
pub mod engine;
pub mod filters;
pub mod prompt;
pub mod retrieve;
pub mod router;

pub use classify::{Classification, QueryCategory, classify};
pub use engine::{GroundedAnswer, QueryEngine, QueryError, SmartAnswer};
pub use filters::{FilterSet, parse_filters};
pub use prompt::build_prompt;
pub use retrieve::Fragment;
pub use router::{ModelTier, RouterRules, route};
