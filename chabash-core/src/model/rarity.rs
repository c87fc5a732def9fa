use super::graph::Graph;
use super::token::{Token, tokenize};

/// Picks the word of `sentence` with the smallest known out-total.
///
/// Punctuation is ignored and words the graph has never seen are left out of
/// the comparison. Ties go to the earliest word. Returns `None` when no word
/// of the sentence is known.
pub fn rarest_known_word(graph: &Graph, sentence: &str) -> Option<Token> {
	let mut rarest: Option<(Token, u64)> = None;

	for token in tokenize(sentence).tokens.into_iter().filter(Token::is_word) {
		let Some(edges) = graph.edges_out(&token) else {
			continue;
		};
		if rarest.as_ref().is_none_or(|(_, total)| edges.total() < *total) {
			rarest = Some((token, edges.total()));
		}
	}

	rarest.map(|(token, _)| token)
}
