use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::graph::Graph;
use super::token::Token;

/// How a weighted draw is matched against an edge list.
///
/// See [`crate::model::node::EdgeList::pick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplingMode {
	/// `draw <= weight`: the historical weighting, kept for parity with
	/// existing stores. Earlier edges win ties and the last edge of a list can
	/// be starved.
	#[default]
	Legacy,
	/// `draw < weight`: selection proportional to edge weights.
	Cumulative,
}

/// Weighted random walk steps over a [`Graph`].
pub struct Sampler<R = StdRng> {
	rng: R,
	mode: SamplingMode,
}

impl Sampler<StdRng> {
	/// Creates a sampler seeded from the operating system.
	pub fn from_os_rng(mode: SamplingMode) -> Self {
		Self::new(StdRng::from_os_rng(), mode)
	}

	/// Creates a reproducible sampler.
	pub fn seeded(seed: u64, mode: SamplingMode) -> Self {
		Self::new(StdRng::seed_from_u64(seed), mode)
	}
}

impl<R: Rng> Sampler<R> {
	/// Creates a sampler drawing from `rng`.
	pub fn new(rng: R, mode: SamplingMode) -> Self {
		Self { rng, mode }
	}

	/// Draws a successor of `token`, weighted by edge counts.
	///
	/// Returns [`Token::End`] when `token` has no known outgoing edge.
	pub fn sample_next(&mut self, graph: &Graph, token: &Token) -> Token {
		let Some(edges) = graph.edges_out(token) else {
			return Token::End;
		};
		let draw = self.rng.random_range(0..edges.total());
		edges.pick(draw, self.mode).cloned().unwrap_or(Token::End)
	}

	/// Draws a predecessor of `token`.
	///
	/// Bidirectional graphs draw from the incoming edges, weighted like
	/// [`Sampler::sample_next`]. Forward-only graphs have no incoming index:
	/// every source pointing at `token` is collected and one is chosen
	/// uniformly, whatever its edge count.
	///
	/// Returns [`Token::Begin`] when nothing points at `token`.
	pub fn sample_prev(&mut self, graph: &Graph, token: &Token) -> Token {
		if graph.is_bidirectional() {
			let Some(edges) = graph.edges_in(token) else {
				return Token::Begin;
			};
			let draw = self.rng.random_range(0..edges.total());
			return edges.pick(draw, self.mode).cloned().unwrap_or(Token::Begin);
		}

		graph
			.predecessors(token)
			.choose(&mut self.rng)
			.map(|source| (*source).clone())
			.unwrap_or(Token::Begin)
	}
}
