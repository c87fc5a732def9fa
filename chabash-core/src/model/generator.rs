use std::collections::VecDeque;

use log::debug;
use rand::Rng;
use rand::rngs::StdRng;

use crate::error::{ChabashError, Result};

use super::graph::Graph;
use super::rarity::rarest_known_word;
use super::sampler::{Sampler, SamplingMode};
use super::token::{Token, detokenize, tokenize};

/// Default bound on the number of steps of a single walk.
pub const DEFAULT_MAX_STEPS: usize = 200;

/// Generation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
	/// Maximum number of samples drawn by one walk (forward or backward)
	/// before the sentence is cut short. Must be >= 1.
	pub max_steps: usize,

	/// Weighting used when drawing successors and predecessors.
	pub sampling: SamplingMode,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self { max_steps: DEFAULT_MAX_STEPS, sampling: SamplingMode::default() }
	}
}

impl GeneratorConfig {
	/// # Errors
	/// Returns an error if `max_steps` is 0.
	pub fn validate(&self) -> Result<()> {
		if self.max_steps == 0 {
			return Err(ChabashError::InvalidConfig("max_steps must be >= 1".to_owned()));
		}
		Ok(())
	}
}

/// A generated sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Generation {
	/// The walks reached BEGIN and END.
	Complete(String),
	/// A walk hit the step bound; the text holds what was produced so far.
	Truncated(String),
}

impl Generation {
	/// The printable sentence.
	pub fn text(&self) -> &str {
		match self {
			Generation::Complete(text) | Generation::Truncated(text) => text,
		}
	}

	/// Takes the printable sentence.
	pub fn into_text(self) -> String {
		match self {
			Generation::Complete(text) | Generation::Truncated(text) => text,
		}
	}

	/// Whether a walk was cut at the step bound.
	pub fn is_truncated(&self) -> bool {
		matches!(self, Generation::Truncated(_))
	}
}

/// State of a walk.
enum Walk {
	Walking(Token),
	Done,
}

/// Which way a walk goes.
#[derive(Clone, Copy)]
enum Heading {
	Forward,
	Backward,
}

/// Builds sentences by walking a [`Graph`].
///
/// The graph is passed to every call; the generator only owns its sampler and
/// settings.
pub struct Generator<R = StdRng> {
	sampler: Sampler<R>,
	max_steps: usize,
}

impl Generator<StdRng> {
	/// Creates a generator seeded from the operating system.
	///
	/// # Errors
	/// Returns an error if `config` is invalid.
	pub fn new(config: GeneratorConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { sampler: Sampler::from_os_rng(config.sampling), max_steps: config.max_steps })
	}

	/// Creates a reproducible generator.
	///
	/// # Errors
	/// Returns an error if `config` is invalid.
	pub fn seeded(config: GeneratorConfig, seed: u64) -> Result<Self> {
		config.validate()?;
		Ok(Self { sampler: Sampler::seeded(seed, config.sampling), max_steps: config.max_steps })
	}
}

impl<R: Rng> Generator<R> {
	/// Creates a generator drawing from `rng`.
	///
	/// # Errors
	/// Returns an error if `config` is invalid.
	pub fn with_rng(config: GeneratorConfig, rng: R) -> Result<Self> {
		config.validate()?;
		Ok(Self { sampler: Sampler::new(rng, config.sampling), max_steps: config.max_steps })
	}

	/// Generates a sentence from BEGIN.
	pub fn generate_forward(&mut self, graph: &Graph) -> Generation {
		self.generate_forward_from(graph, &Token::Begin)
	}

	/// Generates the continuation of `start` up to END. `start` itself is not
	/// part of the text.
	pub fn generate_forward_from(&mut self, graph: &Graph, start: &Token) -> Generation {
		let (tokens, truncated) = self.walk(graph, start, Heading::Forward);
		finish(detokenize(&tokens), truncated)
	}

	/// Generates a sentence around the first word of `text`.
	///
	/// `text` is tokenized like a learned sentence, so `"sandwich?"` seeds on
	/// `sandwich`. Text without any word falls back to
	/// [`Generator::generate_forward`].
	pub fn generate_from_seed(&mut self, graph: &Graph, text: &str) -> Generation {
		match tokenize(text).tokens.into_iter().find(Token::is_word) {
			Some(seed) => self.generate_around(graph, &seed),
			None => self.generate_forward(graph),
		}
	}

	/// Generates a sentence containing `seed`: a backward walk to BEGIN, the
	/// seed, then a forward walk to END.
	pub fn generate_around(&mut self, graph: &Graph, seed: &Token) -> Generation {
		let (before, cut_before) = self.walk(graph, seed, Heading::Backward);
		let (after, cut_after) = self.walk(graph, seed, Heading::Forward);

		let tokens = before.iter().chain(std::iter::once(seed)).chain(after.iter());
		finish(detokenize(tokens), cut_before || cut_after)
	}

	/// Replies to `sentence`, anchored on its rarest known word, or
	/// unconstrained when none of its words is known.
	pub fn reply(&mut self, graph: &Graph, sentence: &str) -> Generation {
		match rarest_known_word(graph, sentence) {
			Some(anchor) => {
				debug!("anchoring reply on {anchor}");
				self.generate_around(graph, &anchor)
			}
			None => self.generate_forward(graph),
		}
	}

	/// Walks from `from` until the heading's sentinel or the step bound.
	///
	/// Returns the visited tokens in sentence order (excluding `from` and the
	/// sentinel) and whether the bound was hit.
	fn walk(&mut self, graph: &Graph, from: &Token, heading: Heading) -> (Vec<Token>, bool) {
		let mut tokens = VecDeque::new();
		let mut state = Walk::Walking(from.clone());
		let mut steps = 0;

		while let Walk::Walking(current) = state {
			if steps == self.max_steps {
				debug!("walk from {from} cut after {steps} steps");
				return (tokens.into(), true);
			}
			steps += 1;

			let (next, stop) = match heading {
				Heading::Forward => (self.sampler.sample_next(graph, &current), Token::End),
				Heading::Backward => (self.sampler.sample_prev(graph, &current), Token::Begin),
			};
			state = if next == stop {
				Walk::Done
			} else {
				match heading {
					Heading::Forward => tokens.push_back(next.clone()),
					Heading::Backward => tokens.push_front(next.clone()),
				}
				Walk::Walking(next)
			};
		}

		(tokens.into(), false)
	}
}

fn finish(text: String, truncated: bool) -> Generation {
	if truncated { Generation::Truncated(text) } else { Generation::Complete(text) }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::graph::Direction;
	use rand::SeedableRng;

	fn config(sampling: SamplingMode) -> GeneratorConfig {
		GeneratorConfig { sampling, ..GeneratorConfig::default() }
	}

	#[test]
	fn zero_steps_is_rejected() {
		let config = GeneratorConfig { max_steps: 0, ..GeneratorConfig::default() };
		assert!(matches!(Generator::seeded(config, 0), Err(ChabashError::InvalidConfig(_))));
	}

	#[test]
	fn linear_graph_reproduces_its_sentence() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("i am a computer");
		let mut generator = Generator::seeded(GeneratorConfig::default(), 5).unwrap();
		assert_eq!(generator.generate_forward(&graph), Generation::Complete("i am a computer".to_owned()));
		assert_eq!(
			generator.generate_from_seed(&graph, "a"),
			Generation::Complete("i am a computer".to_owned())
		);
	}

	#[test]
	fn forward_only_graph_walks_backward_by_scanning() {
		let mut graph = Graph::new(Direction::Forward);
		graph.ingest("this is a waste of my time");
		let mut generator = Generator::seeded(GeneratorConfig::default(), 9).unwrap();
		assert_eq!(generator.generate_from_seed(&graph, "waste").text(), "this is a waste of my time");
	}

	#[test]
	fn canal_graph_terminates_with_reachable_tokens() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("a man a plan a canal");
		let reachable = ["a", "man", "plan", "canal"].map(Token::word);

		for sampling in [SamplingMode::Legacy, SamplingMode::Cumulative] {
			let mut generator = Generator::seeded(config(sampling), 21).unwrap();
			for _ in 0..20 {
				let generation = generator.generate_forward(&graph);
				for token in tokenize(generation.text()).tokens {
					assert!(reachable.contains(&token), "unexpected {token}");
				}
			}
		}
	}

	#[test]
	fn cumulative_sampling_completes_the_canal_graph() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("a man a plan a canal");
		let config = GeneratorConfig { max_steps: 10_000, sampling: SamplingMode::Cumulative };
		let mut generator = Generator::seeded(config, 4).unwrap();
		let generation = generator.generate_forward(&graph);
		assert!(!generation.is_truncated());
		assert!(generation.text().ends_with("canal"));
	}

	#[test]
	fn legacy_sampling_loops_on_the_canal_graph_until_cut() {
		// `a -> canal` is the last of three equal edges and is never drawn.
		let mut graph = Graph::new(Direction::Forward);
		graph.ingest("a man a plan a canal");
		let config = GeneratorConfig { max_steps: 50, sampling: SamplingMode::Legacy };
		let mut generator = Generator::seeded(config, 4).unwrap();
		let generation = generator.generate_forward(&graph);
		assert!(generation.is_truncated());
		assert_eq!(tokenize(generation.text()).tokens.len(), 50);
	}

	#[test]
	fn unknown_seed_stands_alone() {
		let graph = Graph::new(Direction::Bidirectional);
		let mut generator = Generator::seeded(GeneratorConfig::default(), 1).unwrap();
		assert_eq!(generator.generate_from_seed(&graph, "hello").text(), "hello");
	}

	#[test]
	fn seed_text_is_tokenized_first() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("Foot caught in a sandwich?");
		let rng = StdRng::seed_from_u64(3);
		let mut generator = Generator::with_rng(GeneratorConfig::default(), rng).unwrap();

		let expected = Generation::Complete("Foot caught in a sandwich ?".to_owned());
		assert_eq!(generator.generate_from_seed(&graph, "sandwich?"), expected);
		assert_eq!(generator.generate_from_seed(&graph, " in a "), expected);
		assert_eq!(generator.generate_from_seed(&graph, "?!"), expected);
		assert_eq!(generator.generate_from_seed(&graph, "Foot").into_text(), "Foot caught in a sandwich ?");
	}

	#[test]
	fn empty_seed_and_empty_graph_give_empty_text() {
		let graph = Graph::new(Direction::Bidirectional);
		let mut generator = Generator::seeded(GeneratorConfig::default(), 1).unwrap();
		assert_eq!(generator.generate_from_seed(&graph, "  "), Generation::Complete(String::new()));
	}

	#[test]
	fn reply_anchors_on_the_rarest_word() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("i would like to eat a sandwich");
		graph.ingest("i would tell you");
		graph.ingest("i would");
		let mut generator = Generator::seeded(GeneratorConfig::default(), 2).unwrap();
		let reply = generator.reply(&graph, "would eat you");
		assert_eq!(reply.text(), "i would like to eat a sandwich");
	}

	#[test]
	fn reply_without_known_words_walks_from_begin() {
		let mut graph = Graph::new(Direction::Bidirectional);
		graph.ingest("i am a computer");
		let mut generator = Generator::seeded(GeneratorConfig::default(), 2).unwrap();
		assert_eq!(generator.reply(&graph, "zzz qqq").text(), "i am a computer");
	}
}
