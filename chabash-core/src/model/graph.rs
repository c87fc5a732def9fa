use std::collections::HashMap;

use log::{debug, warn};

use super::node::{Edge, EdgeList, Node};
use super::token::{Token, TokenizeFailure, Tokenized, tokenize};

/// Which edge indices the graph maintains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
	/// Outgoing and incoming edges are both indexed.
	#[default]
	Bidirectional,
	/// Only outgoing edges are indexed; backward lookups scan the whole graph.
	Forward,
}

/// Result of ingesting one sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ingestion {
	/// Tokens recorded between BEGIN and END.
	pub tokens: usize,
	/// Set when the tokenizer stopped early.
	pub failure: Option<TokenizeFailure>,
}

/// Word-transition graph learned from sentences.
///
/// Every ingested sentence contributes one path `BEGIN -> w1 -> ... -> END`.
/// The graph only grows: nodes and edges are never removed and weights never
/// decrease.
///
/// # Invariants
/// - Each node's totals equal the sum of its edge weights
/// - Every edge weight is >= 1
/// - Token identity is exact (no case folding)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
	direction: Direction,
	nodes: HashMap<Token, Node>,
}

impl Graph {
	/// Creates an empty graph.
	pub fn new(direction: Direction) -> Self {
		Self { direction, nodes: HashMap::new() }
	}

	/// Which edge indices are maintained.
	pub fn direction(&self) -> Direction {
		self.direction
	}

	/// Whether the incoming index is maintained.
	pub fn is_bidirectional(&self) -> bool {
		self.direction == Direction::Bidirectional
	}

	/// Records one observation of `source -> target`.
	///
	/// Creates the edge with weight 1 or increments it, and bumps the source's
	/// out-total. In bidirectional mode the target's incoming list is updated
	/// the same way.
	pub fn add_edge(&mut self, source: &Token, target: &Token) {
		self.nodes.entry(source.clone()).or_default().nexts.add(target);
		if self.is_bidirectional() {
			self.nodes.entry(target.clone()).or_default().prevs.add(source);
		}
	}

	/// Outgoing edges of `token`, or `None` when it has never been seen as a
	/// source.
	pub fn edges_out(&self, token: &Token) -> Option<&EdgeList> {
		self.nodes.get(token).map(Node::nexts).filter(|edges| !edges.is_empty())
	}

	/// Incoming edges of `token`, or `None` when it has never been seen as a
	/// target or the graph is forward-only.
	pub fn edges_in(&self, token: &Token) -> Option<&EdgeList> {
		if !self.is_bidirectional() {
			return None;
		}
		self.nodes.get(token).map(Node::prevs).filter(|edges| !edges.is_empty())
	}

	/// Every distinct source with an outgoing edge toward `token`, sorted.
	///
	/// Costs a full scan of the graph; bidirectional graphs should use
	/// [`Graph::edges_in`] instead.
	pub fn predecessors(&self, token: &Token) -> Vec<&Token> {
		let mut sources: Vec<&Token> = self
			.nodes
			.iter()
			.filter(|(_, node)| node.nexts.weight_of(token).is_some())
			.map(|(source, _)| source)
			.collect();
		sources.sort();
		sources
	}

	/// Tokenizes `sentence` and records its path from BEGIN to END.
	///
	/// A tokenization failure is logged and ends the path early; the closing
	/// edge to END is recorded regardless.
	pub fn ingest(&mut self, sentence: &str) -> Ingestion {
		let Tokenized { tokens, failure } = tokenize(sentence);
		if let Some(failure) = &failure {
			warn!("tokenizer stopped in {sentence:?}: {failure}");
		}

		let mut prev = Token::Begin;
		for token in &tokens {
			self.add_edge(&prev, token);
			prev = token.clone();
		}
		self.add_edge(&prev, &Token::End);

		debug!("ingested {} tokens from {sentence:?}", tokens.len());
		Ingestion { tokens: tokens.len(), failure }
	}

	/// Whether `token` has a node (as a source, or as a target in
	/// bidirectional mode).
	pub fn contains(&self, token: &Token) -> bool {
		self.nodes.contains_key(token)
	}

	/// Both edge lists of `token`.
	pub fn node(&self, token: &Token) -> Option<&Node> {
		self.nodes.get(token)
	}

	/// Number of distinct tokens, sentinels included.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of distinct outgoing edges.
	pub fn edge_count(&self) -> usize {
		self.nodes.values().map(|node| node.nexts.len()).sum()
	}

	/// Whether nothing has been learned yet.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Nodes in token order.
	pub fn nodes(&self) -> Vec<(&Token, &Node)> {
		let mut nodes: Vec<_> = self.nodes.iter().collect();
		nodes.sort_by(|a, b| a.0.cmp(b.0));
		nodes
	}

	/// Checks every node's totals against its edge weights, and the incoming
	/// index against the outgoing one in bidirectional mode.
	pub fn is_consistent(&self) -> bool {
		let totals = self
			.nodes
			.values()
			.all(|node| node.nexts.is_consistent() && node.prevs.is_consistent());
		if !totals || !self.is_bidirectional() {
			return totals;
		}

		let out_sum: u128 = self.nodes.values().map(|node| u128::from(node.nexts.total())).sum();
		let in_sum: u128 = self.nodes.values().map(|node| u128::from(node.prevs.total())).sum();
		out_sum == in_sum
			&& self.nodes.iter().all(|(source, node)| {
				node.nexts.edges().iter().all(|edge| {
					self.nodes
						.get(&edge.target)
						.and_then(|target| target.prevs.weight_of(source))
						== Some(edge.weight)
				})
			})
	}

	pub(crate) fn insert_node(&mut self, token: Token, node: Node) {
		self.nodes.insert(token, node);
	}

	/// Derives the incoming index from the outgoing edges, replacing any
	/// incoming lists already present.
	pub fn rebuild_incoming(&mut self) {
		let mut incoming: HashMap<Token, Vec<(Token, u64)>> = HashMap::new();
		for (source, node) in self.nodes() {
			for edge in node.nexts.edges() {
				incoming
					.entry(edge.target.clone())
					.or_default()
					.push((source.clone(), edge.weight));
			}
		}

		for node in self.nodes.values_mut() {
			node.prevs = EdgeList::default();
		}
		for (target, sources) in incoming {
			let edges = sources
				.into_iter()
				.map(|(source, weight)| Edge { target: source, weight })
				.collect();
			self.nodes.entry(target).or_default().prevs = EdgeList::from_edges(edges);
		}
	}

	/// Drops the incoming index and stops maintaining it.
	pub(crate) fn into_forward(mut self) -> Self {
		self.direction = Direction::Forward;
		self.nodes.retain(|_, node| !node.nexts.is_empty());
		for node in self.nodes.values_mut() {
			node.prevs = EdgeList::default();
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn w(word: &str) -> Token {
		Token::word(word)
	}

	#[test]
	fn totals_match_weights_after_every_edge() {
		let mut graph = Graph::new(Direction::Bidirectional);
		let pairs = [("a", "man"), ("man", "a"), ("a", "plan"), ("a", "man")];
		for (source, target) in pairs {
			graph.add_edge(&w(source), &w(target));
			assert!(graph.is_consistent());
		}
		let out = graph.edges_out(&w("a")).unwrap();
		assert_eq!(out.total(), 3);
		assert_eq!(out.weight_of(&w("man")), Some(2));
		assert_eq!(graph.edges_in(&w("man")).unwrap().total(), 2);
	}

	#[test]
	fn sentence_becomes_one_path() {
		let mut graph = Graph::new(Direction::Bidirectional);
		let ingestion = graph.ingest("foot caught in a sandwich?");
		assert_eq!(ingestion.tokens, 6);
		assert_eq!(ingestion.failure, None);

		assert_eq!(graph.edges_out(&Token::Begin).unwrap().weight_of(&w("foot")), Some(1));
		assert_eq!(graph.edges_out(&w("sandwich")).unwrap().weight_of(&Token::Question), Some(1));
		assert_eq!(graph.edges_out(&Token::Question).unwrap().weight_of(&Token::End), Some(1));
		assert!(graph.edges_out(&Token::End).is_none());
		assert!(graph.contains(&Token::End));
	}

	#[test]
	fn ingesting_twice_doubles_weights() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("i would tell you if i knew");
		let once = graph.clone();
		graph.ingest("i would tell you if i knew");

		assert_eq!(graph.node_count(), once.node_count());
		assert_eq!(graph.edge_count(), once.edge_count());
		for (token, node) in once.nodes() {
			for edge in node.nexts().edges() {
				let doubled = graph.edges_out(token).unwrap().weight_of(&edge.target);
				assert_eq!(doubled, Some(edge.weight * 2));
			}
		}
		assert!(graph.is_consistent());
	}

	#[test]
	fn empty_sentence_links_begin_to_end() {
		let mut graph = Graph::new(Direction::Forward);
		assert_eq!(graph.ingest("").tokens, 0);
		assert!(!graph.is_empty());
		assert_eq!(graph.direction(), Direction::Forward);
		assert_eq!(graph.edges_out(&Token::Begin).unwrap().weight_of(&Token::End), Some(1));
	}

	#[test]
	fn failed_tokenization_still_closes_the_sentence() {
		let mut graph = Graph::new(Direction::Forward);
		let ingestion = graph.ingest("un café noir");
		assert!(ingestion.failure.is_some());
		assert_eq!(graph.edges_out(&w("caf")).unwrap().weight_of(&Token::End), Some(1));
		assert!(!graph.contains(&w("noir")));
	}

	#[test]
	fn forward_graph_has_no_incoming_index() {
		let mut graph = Graph::new(Direction::Forward);
		graph.ingest("a man a plan");
		assert!(graph.edges_in(&w("man")).is_none());
		assert!(!graph.contains(&Token::End));
		assert_eq!(graph.predecessors(&w("a")), vec![&Token::Begin, &w("man")]);
		assert!(graph.predecessors(&w("zebra")).is_empty());
	}

	#[test]
	fn unknown_words_are_not_zero() {
		let graph = Graph::new(Direction::Bidirectional);
		assert!(graph.is_empty());
		assert!(graph.edges_out(&w("ghost")).is_none());
		assert!(graph.edges_in(&w("ghost")).is_none());
	}

	#[test]
	fn rebuilt_incoming_index_matches_live_one() {
		let mut live = Graph::new(Direction::Bidirectional);
		live.ingest("time and tide waits for no man");
		live.ingest("man, i could sure use a drink");

		let mut rebuilt = live.clone();
		rebuilt.rebuild_incoming();
		assert!(rebuilt.is_consistent());
		for (token, node) in live.nodes() {
			let other = rebuilt.node(token).unwrap();
			assert_eq!(other.prevs().total(), node.prevs().total());
			for edge in node.prevs().edges() {
				assert_eq!(other.prevs().weight_of(&edge.target), Some(edge.weight));
			}
		}
	}
}
