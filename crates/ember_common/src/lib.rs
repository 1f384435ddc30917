//! Shared foundational types used across the ember build cache.
//!
//! This crate provides content hashing, lexical path utilities, and the
//! tokenizers for the loosely-typed per-unit attribute strings.

#![warn(missing_docs)]

pub mod args;
pub mod hash;
pub mod paths;

pub use args::{parse_sources, split_options};
pub use hash::ContentHash;
pub use paths::{absolutize, is_translatable, normalize, relative_to};
