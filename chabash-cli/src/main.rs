use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser};
use log::{LevelFilter, debug, info, warn};

use chabash_core::io::read_file;
use chabash_core::model::generator::{DEFAULT_MAX_STEPS, Generator, GeneratorConfig};
use chabash_core::model::graph::{Direction, Graph};
use chabash_core::model::sampler::SamplingMode;
use chabash_core::store::{DEFAULT_PATH, Store};

/// Command line of the `chabash` binary.
///
/// `-h` is handled by hand: it prints the help and exits with status 1.
#[derive(Parser, Debug)]
#[command(name = "chabash", about = "Markov chain chatbot", disable_help_flag = true)]
struct Cli {
	/// Print this help and exit
	#[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
	help: bool,

	/// Log what the chain is doing
	#[arg(short = 'v', long = "verbose")]
	verbose: bool,

	/// Store file holding the learned chain
	#[arg(short = 'd', long = "data", value_name = "FILE", default_value = DEFAULT_PATH)]
	data: PathBuf,

	/// Learn every line of FILE, save and exit
	#[arg(short = 'r', long = "read", value_name = "FILE")]
	read: Option<PathBuf>,

	/// Do not keep the incoming-edge index
	#[arg(long)]
	forward_only: bool,

	/// Draw successors in proportion to their counts
	#[arg(long)]
	cumulative: bool,

	/// Maximum number of words drawn in each direction
	#[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_STEPS)]
	max_steps: usize,
}

impl Cli {
	fn direction(&self) -> Direction {
		if self.forward_only { Direction::Forward } else { Direction::Bidirectional }
	}

	fn generator_config(&self) -> GeneratorConfig {
		let sampling = if self.cumulative { SamplingMode::Cumulative } else { SamplingMode::Legacy };
		GeneratorConfig { max_steps: self.max_steps, sampling }
	}
}

fn main() -> ExitCode {
	let cli = match Cli::try_parse() {
		Ok(cli) => cli,
		Err(e) => return failure(e.print()),
	};

	if cli.help {
		return failure(Cli::command().print_help());
	}

	init_logger(cli.verbose);

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("chabash: {e}");
			ExitCode::FAILURE
		}
	}
}

/// Exit status of a run that stops after printing usage, reporting a failed
/// print on stderr.
fn failure(printed: io::Result<()>) -> ExitCode {
	if let Err(e) = printed {
		eprintln!("chabash: cannot print usage: {e}");
	}
	ExitCode::FAILURE
}

/// Installs `env_logger`; `RUST_LOG` takes precedence over `-v`.
fn init_logger(verbose: bool) {
	let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
	env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
	let mut generator = Generator::new(cli.generator_config())?;
	let store = Store::new(&cli.data);
	let mut graph = store.load_or_seed(cli.direction())?;

	match &cli.read {
		Some(path) => learn_file(&store, &mut graph, path),
		None => chat(&store, &mut graph, &mut generator),
	}
}

/// Ingests every line of `path`, then saves.
fn learn_file(store: &Store, graph: &mut Graph, path: &Path) -> Result<(), Box<dyn Error>> {
	let lines = read_file(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
	for line in &lines {
		graph.ingest(line);
	}
	info!("learned {} lines from {}", lines.len(), path.display());
	store.save(graph)?;
	Ok(())
}

/// Learns each line of standard input and answers it, until end of input.
fn chat(store: &Store, graph: &mut Graph, generator: &mut Generator) -> Result<(), Box<dyn Error>> {
	let stdin = io::stdin();
	let mut stdout = io::stdout().lock();

	for line in stdin.lock().lines() {
		let line = match line {
			Ok(line) => line,
			Err(e) => {
				warn!("stopped reading input: {e}");
				break;
			}
		};

		graph.ingest(&line);
		store.save(graph)?;

		let reply = generator.reply(graph, &line);
		if reply.is_truncated() {
			debug!("reply cut at the step bound");
		}
		writeln!(stdout, "{}", reply.into_text())?;
		stdout.flush()?;
	}

	store.save(graph)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn command_is_well_formed() {
		Cli::command().debug_assert();
	}

	#[test]
	fn defaults() {
		let cli = Cli::try_parse_from(["chabash"]).unwrap();
		assert!(!cli.help);
		assert_eq!(cli.data, PathBuf::from("chabash.dat"));
		assert_eq!(cli.read, None);
		assert_eq!(cli.direction(), Direction::Bidirectional);
		assert_eq!(cli.generator_config(), GeneratorConfig::default());
	}

	#[test]
	fn short_flags() {
		let cli = Cli::try_parse_from(["chabash", "-v", "-d", "bot.dat", "-r", "book.txt", "-h"]).unwrap();
		assert!(cli.help);
		assert!(cli.verbose);
		assert_eq!(cli.data, PathBuf::from("bot.dat"));
		assert_eq!(cli.read, Some(PathBuf::from("book.txt")));
	}

	#[test]
	fn long_options_tune_generation() {
		let cli = Cli::try_parse_from(["chabash", "--forward-only", "--cumulative", "--max-steps", "12"]).unwrap();
		assert_eq!(cli.direction(), Direction::Forward);
		assert_eq!(
			cli.generator_config(),
			GeneratorConfig { max_steps: 12, sampling: SamplingMode::Cumulative }
		);
	}

	#[test]
	fn usage_always_exits_with_failure() {
		assert_eq!(failure(Ok(())), ExitCode::FAILURE);
		let broken = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
		assert_eq!(failure(Err(broken)), ExitCode::FAILURE);
	}

	#[test]
	fn unknown_option_is_rejected() {
		assert!(Cli::try_parse_from(["chabash", "-x"]).is_err());
		assert!(Cli::try_parse_from(["chabash", "-d"]).is_err());
	}
}
