//! Word-level Markov chain text generator.
//!
//! This crate provides:
//! - A tokenizer turning sentences into words and punctuation tags
//! - A weighted transition graph learned from those sentences
//! - Forward and backward weighted sampling over the graph
//! - Sentence generation, unconstrained or anchored on a rare word
//! - A flat key/value store persisting the whole graph

/// Tokens, graph, sampler and generator.
pub mod model;

/// Persistence of the graph to a line-oriented key/value file.
pub mod store;

/// Sentences used to initialise a chain without a store.
pub mod corpus;

/// Error type shared by the crate.
pub mod error;

/// File helpers.
pub mod io;

pub use error::{ChabashError, Result};
