//! Word-level Markov chain: tokens, graph, sampling and generation.

/// Tokens, tokenizer and detokenizer.
///
/// Turns raw sentences into words and punctuation tags, encodes apostrophes
/// and renders token sequences back to text.
pub mod token;

/// Weighted edge lists and per-token nodes.
pub mod node;

/// Transition graph built from ingested sentences.
///
/// Maintains outgoing edges and, in bidirectional mode, incoming edges.
pub mod graph;

/// Weighted random successor / predecessor selection.
pub mod sampler;

/// Anchor word selection for replies.
pub mod rarity;

/// Sentence generation: forward walks and walks around a seed word.
pub mod generator;
