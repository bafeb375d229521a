//! Tree module: the hierarchical structure of encrypted values.
//!
//! This module provides:
//! - `SecretTree` and `Node`, the owned in-memory hierarchy (`node`)
//! - Slash-separated path parsing (`path`)
//! - The versioned binary payload encoding (`codec`)

pub mod codec;
pub mod node;
pub mod path;

pub use node::{Entry, Node, SecretTree};
