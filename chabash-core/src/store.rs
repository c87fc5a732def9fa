use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::corpus;
use crate::error::{ChabashError, Result};
use crate::io::{read_file, write_file};
use crate::model::graph::{Direction, Graph};
use crate::model::node::{Edge, EdgeList, Node};
use crate::model::token::Token;

/// Store file used when none is given.
pub const DEFAULT_PATH: &str = "chabash.dat";

/// Prefix of every key in the store.
pub const DEFAULT_PREFIX: &str = "chabash";

/// One of the six per-token assignments of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
	Nexts,
	Counts,
	Total,
	Prevs,
	PrevCounts,
	PrevTotal,
}

impl Field {
	/// Tried in this order: a suffix that ends another one comes later.
	const ALL: [Field; 6] =
		[Field::PrevCounts, Field::PrevTotal, Field::Prevs, Field::Nexts, Field::Counts, Field::Total];

	fn suffix(self) -> &'static str {
		match self {
			Field::Nexts => "_nexts",
			Field::Counts => "_counts",
			Field::Total => "_total",
			Field::Prevs => "_prevs",
			Field::PrevCounts => "_prev_counts",
			Field::PrevTotal => "_prev_total",
		}
	}
}

/// A parsed value and the line it came from.
struct Located<T> {
	line: usize,
	value: T,
}

/// The three assignments describing one edge list.
#[derive(Default)]
struct Side {
	targets: Option<Located<Vec<Token>>>,
	counts: Option<Located<Vec<u64>>>,
	total: Option<Located<u64>>,
}

#[derive(Default)]
struct Partial {
	first_line: usize,
	nexts: Side,
	prevs: Side,
}

/// Flat key/value persistence of a [`Graph`].
///
/// Each token with outgoing edges is written as three assignments:
///
/// ```text
/// chabash_sandwich_nexts=(_QUESTION_ _EXCLAIM_ _END_)
/// chabash_sandwich_counts=(1 1 1)
/// chabash_sandwich_total=3
/// ```
///
/// Bidirectional graphs add `_prevs`, `_prev_counts` and `_prev_total` for
/// tokens with incoming edges. Every save rewrites the whole file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Store {
	path: PathBuf,
	prefix: String,
}

impl Default for Store {
	fn default() -> Self {
		Self::new(DEFAULT_PATH)
	}
}

impl Store {
	/// Store at `path` with the default key prefix.
	pub fn new<P: AsRef<Path>>(path: P) -> Self {
		Self { path: path.as_ref().to_path_buf(), prefix: DEFAULT_PREFIX.to_owned() }
	}

	/// Uses `prefix` instead of [`DEFAULT_PREFIX`] for every key.
	pub fn with_prefix(mut self, prefix: &str) -> Self {
		self.prefix = prefix.to_owned();
		self
	}

	/// File the graph is saved to.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Prefix shared by every key of the store.
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Serializes the full state of `graph`, nodes in token order.
	pub fn render(&self, graph: &Graph) -> String {
		let mut out = String::new();
		for (token, node) in graph.nodes() {
			self.render_side(&mut out, token, node.nexts(), [Field::Nexts, Field::Counts, Field::Total]);
			if graph.is_bidirectional() {
				self.render_side(
					&mut out,
					token,
					node.prevs(),
					[Field::Prevs, Field::PrevCounts, Field::PrevTotal],
				);
			}
		}
		out
	}

	fn render_side(&self, out: &mut String, token: &Token, edges: &EdgeList, fields: [Field; 3]) {
		if edges.is_empty() {
			return;
		}
		let targets: Vec<&str> = edges.edges().iter().map(|edge| edge.target.key()).collect();
		let counts: Vec<String> = edges.edges().iter().map(|edge| edge.weight.to_string()).collect();

		let [targets_field, counts_field, total_field] = fields;
		out.push_str(&format!("{}=({})\n", self.key(token, targets_field), targets.join(" ")));
		out.push_str(&format!("{}=({})\n", self.key(token, counts_field), counts.join(" ")));
		out.push_str(&format!("{}={}\n", self.key(token, total_field), edges.total()));
	}

	fn key(&self, token: &Token, field: Field) -> String {
		format!("{}_{}{}", self.prefix, token.key(), field.suffix())
	}

	/// Parses a store back into a graph.
	///
	/// Incoming lists are dropped for forward graphs. A bidirectional graph
	/// read from a store without (or with inconsistent) incoming lists gets its
	/// incoming index rebuilt from the outgoing edges.
	///
	/// # Errors
	/// Returns [`ChabashError::Parse`] on the first malformed line or
	/// inconsistent edge list.
	pub fn parse(&self, text: &str, direction: Direction) -> Result<Graph> {
		self.parse_lines(text.lines(), direction)
	}

	fn parse_lines<'a, I>(&self, lines: I, direction: Direction) -> Result<Graph>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut partials: HashMap<Token, Partial> = HashMap::new();

		for (index, raw) in lines.into_iter().enumerate() {
			let line = index + 1;
			let raw = raw.trim();
			if raw.is_empty() || raw.starts_with('#') {
				continue;
			}

			let (key, value) = raw
				.split_once('=')
				.ok_or_else(|| ChabashError::parse(line, "expected `key=value`"))?;
			let (token, field) = self.split_key(key.trim(), line)?;
			let value = value.trim();

			let partial = partials
				.entry(token)
				.or_insert_with(|| Partial { first_line: line, ..Partial::default() });
			let side = match field {
				Field::Nexts | Field::Counts | Field::Total => &mut partial.nexts,
				Field::Prevs | Field::PrevCounts | Field::PrevTotal => &mut partial.prevs,
			};

			match field {
				Field::Nexts | Field::Prevs => {
					let targets = parse_list(value, line)?
						.into_iter()
						.map(|item| {
							Token::from_key(item)
								.ok_or_else(|| ChabashError::parse(line, format!("invalid token `{item}`")))
						})
						.collect::<Result<Vec<_>>>()?;
					set_once(&mut side.targets, targets, line, key)?;
				}
				Field::Counts | Field::PrevCounts => {
					let counts = parse_list(value, line)?
						.into_iter()
						.map(|item| parse_count(item, line))
						.collect::<Result<Vec<_>>>()?;
					set_once(&mut side.counts, counts, line, key)?;
				}
				Field::Total | Field::PrevTotal => {
					let total = value
						.parse::<u64>()
						.map_err(|_| ChabashError::parse(line, format!("invalid total `{value}`")))?;
					set_once(&mut side.total, total, line, key)?;
				}
			}
		}

		let mut partials: Vec<(Token, Partial)> = partials.into_iter().collect();
		partials.sort_by_key(|(_, partial)| partial.first_line);

		let mut graph = Graph::new(Direction::Bidirectional);
		let mut has_incoming = false;
		for (token, partial) in partials {
			let nexts = assemble(partial.nexts, partial.first_line)?;
			let prevs = assemble(partial.prevs, partial.first_line)?;
			has_incoming |= !prevs.is_empty();
			graph.insert_node(token, Node { nexts, prevs });
		}

		match direction {
			Direction::Forward => Ok(graph.into_forward()),
			Direction::Bidirectional => {
				if has_incoming && !graph.is_consistent() {
					warn!("incoming lists in {} do not mirror outgoing ones; rebuilding", self.path.display());
				}
				if !has_incoming || !graph.is_consistent() {
					graph.rebuild_incoming();
				}
				Ok(graph)
			}
		}
	}

	/// Splits `<prefix>_<token><suffix>` into its token and field.
	fn split_key(&self, key: &str, line: usize) -> Result<(Token, Field)> {
		let body = key
			.strip_prefix(self.prefix.as_str())
			.and_then(|rest| rest.strip_prefix('_'))
			.ok_or_else(|| ChabashError::parse(line, format!("key `{key}` lacks prefix `{}_`", self.prefix)))?;

		Field::ALL
			.iter()
			.find_map(|field| {
				let name = body.strip_suffix(field.suffix())?;
				Token::from_key(name).map(|token| (token, *field))
			})
			.ok_or_else(|| ChabashError::parse(line, format!("unknown key `{key}`")))
	}

	/// Writes the full state of `graph`, replacing any previous content.
	///
	/// # Errors
	/// Returns an error if the file cannot be written.
	pub fn save(&self, graph: &Graph) -> Result<()> {
		write_file(&self.path, &self.render(graph))?;
		info!(
			"saved {} nodes / {} edges to {}",
			graph.node_count(),
			graph.edge_count(),
			self.path.display()
		);
		Ok(())
	}

	/// Reads the store, or returns `None` when the file does not exist.
	///
	/// # Errors
	/// Returns an error if the file exists but cannot be read or parsed.
	pub fn load(&self, direction: Direction) -> Result<Option<Graph>> {
		if !self.path.exists() {
			return Ok(None);
		}
		let lines = read_file(&self.path)?;
		let graph = self.parse_lines(lines.iter().map(String::as_str), direction)?;
		info!(
			"loaded {} nodes / {} edges from {}",
			graph.node_count(),
			graph.edge_count(),
			self.path.display()
		);
		Ok(Some(graph))
	}

	/// Reads the store, or builds a graph from the seed corpus and saves it
	/// when the store does not exist.
	///
	/// # Errors
	/// Returns an error if the store cannot be read, parsed or written.
	pub fn load_or_seed(&self, direction: Direction) -> Result<Graph> {
		if let Some(graph) = self.load(direction)? {
			return Ok(graph);
		}
		info!("no store at {}, seeding from the built-in corpus", self.path.display());
		let mut graph = Graph::new(direction);
		corpus::seed(&mut graph);
		self.save(&graph)?;
		Ok(graph)
	}
}

fn parse_list(value: &str, line: usize) -> Result<Vec<&str>> {
	let inner = value
		.strip_prefix('(')
		.and_then(|rest| rest.strip_suffix(')'))
		.ok_or_else(|| ChabashError::parse(line, format!("expected `(...)`, got `{value}`")))?;
	Ok(inner.split_whitespace().collect())
}

fn parse_count(item: &str, line: usize) -> Result<u64> {
	match item.parse::<u64>() {
		Ok(count) if count > 0 => Ok(count),
		_ => Err(ChabashError::parse(line, format!("invalid count `{item}`"))),
	}
}

fn set_once<T>(slot: &mut Option<Located<T>>, value: T, line: usize, key: &str) -> Result<()> {
	if slot.is_some() {
		return Err(ChabashError::parse(line, format!("duplicate key `{key}`")));
	}
	*slot = Some(Located { line, value });
	Ok(())
}

/// Checks one side of a node and turns it into an edge list.
fn assemble(side: Side, first_line: usize) -> Result<EdgeList> {
	let (targets, counts, total) = match (side.targets, side.counts, side.total) {
		(None, None, None) => return Ok(EdgeList::default()),
		(Some(targets), Some(counts), Some(total)) => (targets, counts, total),
		_ => {
			return Err(ChabashError::parse(
				first_line,
				"edge list needs its targets, counts and total",
			));
		}
	};

	if targets.value.len() != counts.value.len() {
		return Err(ChabashError::parse(
			counts.line,
			format!("{} counts for {} targets", counts.value.len(), targets.value.len()),
		));
	}
	for (i, target) in targets.value.iter().enumerate() {
		if targets.value[..i].contains(target) {
			return Err(ChabashError::parse(targets.line, format!("duplicate target `{target}`")));
		}
	}
	let Some(sum) = counts.value.iter().try_fold(0u64, |acc, count| acc.checked_add(*count)) else {
		return Err(ChabashError::parse(counts.line, "sum of counts overflows"));
	};
	if sum != total.value {
		return Err(ChabashError::parse(
			total.line,
			format!("total {} differs from the sum of counts {sum}", total.value),
		));
	}

	let edges = targets
		.value
		.into_iter()
		.zip(counts.value)
		.map(|(target, weight)| Edge { target, weight })
		.collect();
	Ok(EdgeList::from_edges(edges))
}
