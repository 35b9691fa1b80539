//! Retrieval-and-grounding pipeline.
//!
//! This module provides:
//! - `ContextAssembler`: Filters ranked hits by a similarity threshold and
//!   builds the grounding text
//! - `GroundedChat`: Issues the constrained chat completion
//! - `QueryEngine`: Chains embed → search → assemble → complete per turn

mod chat;
mod context;
mod engine;

pub use chat::GroundedChat;
pub use context::{ContextAssembler, ContextAssembly};
pub use engine::{QueryEngine, QueryOutcome};
