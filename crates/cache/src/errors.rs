//! Error handling for the advisor
//!
//! Misses are not errors: lookups return `Option`. Errors here are caller
//! mistakes caught at construction or insert time, plus configuration
//! loading failures.

mod recovery;
mod types;

pub use types::*;
