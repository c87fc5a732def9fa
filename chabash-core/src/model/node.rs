use super::sampler::SamplingMode;
use super::token::Token;

/// A weighted transition toward `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
	pub target: Token,
	/// Number of times the transition was observed, always >= 1.
	pub weight: u64,
}

/// Ordered list of edges leaving (or entering) a node, with their weight sum.
///
/// Edges keep the order of their first observation; the sampler walks them in
/// that order.
///
/// ## Invariants
/// - At most one edge per target
/// - Every weight is strictly positive
/// - `total` is the sum of all weights
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeList {
	edges: Vec<Edge>,
	total: u64,
}

impl EdgeList {
	/// Records one observation of the transition toward `target`.
	///
	/// Lookup is a linear scan: natural-language fan-out is small.
	pub fn add(&mut self, target: &Token) {
		match self.edges.iter_mut().find(|edge| edge.target == *target) {
			Some(edge) => edge.weight += 1,
			None => self.edges.push(Edge { target: target.clone(), weight: 1 }),
		}
		self.total += 1;
	}

	/// Builds a list from already-counted edges. The caller guarantees targets
	/// are distinct and weights positive.
	pub(crate) fn from_edges(edges: Vec<Edge>) -> Self {
		let total = edges.iter().fold(0u64, |acc, edge| acc.saturating_add(edge.weight));
		Self { edges, total }
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Sum of the edge weights.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of distinct targets.
	pub fn len(&self) -> usize {
		self.edges.len()
	}

	/// Whether no edge has been recorded.
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	/// Weight of the edge toward `target`, if any.
	pub fn weight_of(&self, target: &Token) -> Option<u64> {
		self.edges.iter().find(|edge| edge.target == *target).map(|edge| edge.weight)
	}

	/// Selects the edge matching `draw`, a value in `[0, total)`.
	///
	/// The draw is reduced by each weight in turn until it fits the current
	/// edge. In [`SamplingMode::Legacy`] an edge fits when `draw <= weight`,
	/// which favours earlier edges and can starve the last one; in
	/// [`SamplingMode::Cumulative`] it fits when `draw < weight`.
	///
	/// Returns `None` only if the list is empty.
	pub fn pick(&self, mut draw: u64, mode: SamplingMode) -> Option<&Token> {
		for edge in &self.edges {
			let fits = match mode {
				SamplingMode::Legacy => draw <= edge.weight,
				SamplingMode::Cumulative => draw < edge.weight,
			};
			if fits {
				return Some(&edge.target);
			}
			draw -= edge.weight;
		}
		self.edges.last().map(|edge| &edge.target)
	}

	pub(crate) fn is_consistent(&self) -> bool {
		self.edges.iter().all(|edge| edge.weight > 0)
			&& self.edges.iter().try_fold(0u64, |acc, edge| acc.checked_add(edge.weight)) == Some(self.total)
	}
}

/// Per-token record of the graph.
///
/// `prevs` is only filled when the graph keeps its incoming index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
	pub(crate) nexts: EdgeList,
	pub(crate) prevs: EdgeList,
}

impl Node {
	/// Outgoing edges.
	pub fn nexts(&self) -> &EdgeList {
		&self.nexts
	}

	/// Incoming edges; empty in forward-only graphs.
	pub fn prevs(&self) -> &EdgeList {
		&self.prevs
	}
}
