//! Human-readable renderings of errors and syntax trees.

pub mod error;
pub mod tree;
