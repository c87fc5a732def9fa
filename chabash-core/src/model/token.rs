use std::fmt;

/// Encoded form of an apostrophe inside a word.
///
/// Encoded words only ever contain ASCII alphanumerics and even-length runs of
/// underscores, so a word can be used as a plain key in the persisted store.
pub const APOSTROPHE_MARKER: &str = "__";

/// A unit of the chain: a word, a punctuation tag or a sentence boundary.
///
/// Words are case-preserving and hold their encoded form (see
/// [`APOSTROPHE_MARKER`]). Punctuation tags take part in the graph exactly like
/// words.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
	/// Synthetic predecessor of the first token of every sentence.
	Begin,
	/// Synthetic successor of the last token of every sentence.
	End,
	Comma,
	Period,
	Question,
	Exclaim,
	/// An encoded word.
	Word(String),
}

impl Token {
	/// Builds a word token from its printable form, encoding apostrophes.
	pub fn word(surface: &str) -> Self {
		Token::Word(surface.replace('\'', APOSTROPHE_MARKER))
	}

	/// Maps one of `,` `.` `?` `!` to its tag.
	pub fn from_punctuation(c: char) -> Option<Self> {
		match c {
			',' => Some(Token::Comma),
			'.' => Some(Token::Period),
			'?' => Some(Token::Question),
			'!' => Some(Token::Exclaim),
			_ => None,
		}
	}

	/// True for [`Token::Word`].
	pub fn is_word(&self) -> bool {
		matches!(self, Token::Word(_))
	}

	/// True for [`Token::Begin`] and [`Token::End`].
	pub fn is_sentinel(&self) -> bool {
		matches!(self, Token::Begin | Token::End)
	}

	/// True for words that carried an apostrophe.
	pub fn is_marked(&self) -> bool {
		match self {
			Token::Word(word) => word.contains(APOSTROPHE_MARKER),
			_ => false,
		}
	}

	/// Name of the token inside the persisted store.
	///
	/// Sentinels and tags use single underscores, which an encoded word can
	/// never contain, so names never collide.
	pub fn key(&self) -> &str {
		match self {
			Token::Begin => "_BEGIN_",
			Token::End => "_END_",
			Token::Comma => "_COMMA_",
			Token::Period => "_PERIOD_",
			Token::Question => "_QUESTION_",
			Token::Exclaim => "_EXCLAIM_",
			Token::Word(word) => word,
		}
	}

	/// Inverse of [`Token::key`]. Returns `None` for names that are neither a
	/// known tag nor a validly encoded word.
	pub fn from_key(key: &str) -> Option<Self> {
		let token = match key {
			"_BEGIN_" => Token::Begin,
			"_END_" => Token::End,
			"_COMMA_" => Token::Comma,
			"_PERIOD_" => Token::Period,
			"_QUESTION_" => Token::Question,
			"_EXCLAIM_" => Token::Exclaim,
			word if is_encoded_word(word) => Token::Word(word.to_owned()),
			_ => return None,
		};
		Some(token)
	}

	/// Printable form: tags expand to their character plus a trailing space,
	/// words get their apostrophes back, sentinels render as nothing.
	pub fn surface(&self) -> String {
		match self {
			Token::Begin | Token::End => String::new(),
			Token::Comma => ", ".to_owned(),
			Token::Period => ". ".to_owned(),
			Token::Question => "? ".to_owned(),
			Token::Exclaim => "! ".to_owned(),
			Token::Word(word) => word.replace(APOSTROPHE_MARKER, "'"),
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

fn is_encoded_word(s: &str) -> bool {
	if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return false;
	}
	s.split(|c: char| c.is_ascii_alphanumeric())
		.all(|run| run.len() % 2 == 0)
}

fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '\''
}

/// Position where the tokenizer gave up on a sentence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenizeFailure {
	/// Offset, in characters, of the first character that could not be read.
	pub offset: usize,
}

impl fmt::Display for TokenizeFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "no token could be read at character {}", self.offset)
	}
}

/// Output of [`tokenize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tokenized {
	/// Tokens read before the end of the sentence (or before the failure).
	pub tokens: Vec<Token>,
	/// Set when scanning stopped early.
	pub failure: Option<TokenizeFailure>,
}

/// Splits a sentence into words and punctuation tags.
///
/// Each step skips a run of non-alphanumeric filler. When that run starts with
/// `,` `.` `?` or `!`, the matching tag is emitted and the scan moves past that
/// single character only. Otherwise the following run of ASCII letters, digits
/// and apostrophes becomes a word.
///
/// A step that skips nothing and reads nothing (a non-ASCII letter such as
/// `é`) ends the scan and is reported as a [`TokenizeFailure`]; the tokens read
/// so far are kept.
pub fn tokenize(sentence: &str) -> Tokenized {
	let chars: Vec<char> = sentence.chars().collect();
	let mut tokens = Vec::new();
	let mut pos = 0;

	while pos < chars.len() {
		let filler = chars[pos..].iter().take_while(|c| !c.is_alphanumeric()).count();

		if filler > 0 {
			if let Some(tag) = Token::from_punctuation(chars[pos]) {
				tokens.push(tag);
				pos += 1;
				continue;
			}
		}

		let start = pos + filler;
		let len = chars[start..].iter().take_while(|c| is_word_char(**c)).count();
		if len == 0 {
			if filler == 0 {
				return Tokenized { tokens, failure: Some(TokenizeFailure { offset: pos }) };
			}
			pos = start;
			continue;
		}

		let word: String = chars[start..start + len].iter().collect();
		tokens.push(Token::word(&word));
		pos = start + len;
	}

	Tokenized { tokens, failure: None }
}

/// Renders a token sequence as printable text.
///
/// Tokens are separated by one space, except around a word that carried an
/// apostrophe, which is glued to both neighbours. Sentinels are skipped and
/// trailing whitespace is trimmed.
pub fn detokenize<'a, I>(tokens: I) -> String
where
	I: IntoIterator<Item = &'a Token>,
{
	let mut sentence = String::new();
	let mut prev: Option<&Token> = None;

	for token in tokens.into_iter().filter(|t| !t.is_sentinel()) {
		push_token(&mut sentence, prev, token);
		prev = Some(token);
	}

	let trimmed = sentence.trim_end().len();
	sentence.truncate(trimmed);
	sentence
}

/// Appends `token` to `sentence`, `prev` being the last token already in it.
pub fn push_token(sentence: &mut String, prev: Option<&Token>, token: &Token) {
	if let Some(prev) = prev {
		if !prev.is_marked() && !token.is_marked() {
			sentence.push(' ');
		}
	}
	sentence.push_str(&token.surface());
}
