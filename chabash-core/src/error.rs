use std::io;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T, E = ChabashError> = std::result::Result<T, E>;

/// Errors raised by the chain, its store and its configuration.
///
/// Tokenization failures are not listed here: they never abort an ingestion
/// and are reported through [`crate::model::token::Tokenized`] instead.
#[derive(Debug, Error)]
pub enum ChabashError {
	/// The store file (or an ingest file) could not be read or written.
	#[error("i/o error: {0}")]
	Io(#[from] io::Error),

	/// A line of the persisted store is malformed.
	#[error("store line {line}: {reason}")]
	Parse { line: usize, reason: String },

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

impl ChabashError {
	pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
		Self::Parse { line, reason: reason.into() }
	}
}
