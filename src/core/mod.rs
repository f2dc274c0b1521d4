//! Core types - pure abstractions shared across the codebase.

mod address;
mod link;

pub use address::PathAddress;
pub use link::{LinkKind, LinkResolver, Target, has_scheme};
