//! Sentences used to start a chain when no store exists yet.

use crate::model::graph::Graph;

/// The seed corpus, ingested in this order.
pub const SEED_CORPUS: [&str; 12] = [
	"there once was a man from nantucket",
	"who got his foot caught in a sandwich?",
	"his foot got caught in a sandwich!",
	"i would tell you if i knew",
	"do you know what i mean?",
	"if you know what i mean",
	"i would like to eat a sandwich",
	"goddamn, you sure are patient!",
	"i am a computer",
	"this is a waste of my time and yours",
	"time and tide waits for no man",
	"man, i could sure use a drink",
];

/// Ingests every sentence of [`SEED_CORPUS`] into `graph`.
pub fn seed(graph: &mut Graph) {
	for sentence in SEED_CORPUS {
		graph.ingest(sentence);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::graph::Direction;
	use crate::model::token::Token;

	#[test]
	fn seeding_adds_one_path_per_sentence() {
		let mut graph = Graph::new(Direction::Bidirectional);
		seed(&mut graph);
		assert_eq!(graph.edges_out(&Token::Begin).map(|edges| edges.total()), Some(12));
		assert_eq!(graph.edges_in(&Token::End).map(|edges| edges.total()), Some(12));
		assert!(graph.is_consistent());
	}
}
