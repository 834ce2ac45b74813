use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::GenrError;
use crate::GenrResult;

/// The directive keyword that opens a generated block.
pub const EXPAND_KEYWORD: &str = "expand";
/// The directive keyword that closes a generated block.
pub const END_KEYWORD: &str = "end";

/// The four comment-delimiter fragments the scanner is built from.
///
/// Each field is a regex fragment, not a literal string, so callers can
/// redefine the host language's comment syntax entirely. The defaults target
/// C-style block comments opened with `/*!`:
///
/// ```text
/// /*! expand my-template
///  * ---
///  * tableName: users
///  */
/// /*! end */
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
	/// Fragment matching the opening comment delimiter.
	pub comment_start: String,
	/// Fragment matching the closing comment delimiter.
	pub comment_end: String,
	/// Fragment stripped from the left of each comment body line.
	pub comment_lbound: String,
	/// Fragment stripped from the right of each comment body line.
	pub comment_rbound: String,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self {
			comment_start: r"/\*!".into(),
			comment_end: r"\*/".into(),
			comment_lbound: r"^\s*\*?".into(),
			comment_rbound: r"\*?\s*$".into(),
		}
	}
}

/// The five structural patterns compiled once from a [`ParseOptions`], plus
/// two unanchored probes used to classify lines that fail the anchored
/// matchers. Never recompiled per line.
#[derive(Debug)]
pub(crate) struct Matchers {
	/// Matches a full opening comment line. Captures `leading` whitespace,
	/// the `body` between the delimiters, and `close` when the closing
	/// delimiter appears on the same line.
	pub comment_start: Regex,
	/// Matches the `expand` keyword against a comment body. Captures the
	/// first template `name`, any `more` comma-separated names, and an
	/// optional trailing `config` file token.
	pub expand_directive: Regex,
	/// Matches the `end` keyword alone against a comment body.
	pub directive_end: Regex,
	/// Matches a body line inside an open comment. Captures the stripped
	/// `body` and whether the line also closes the comment (`pre_close` for
	/// a bare delimiter, `post_close` for a trailing one).
	pub block_body_line: Regex,
	/// Raw substring probe for the closing delimiter.
	pub comment_end: Regex,
	/// Probe for a directive marker buried in non-directive content.
	pub interpolated: Regex,
	/// Probe for a bare directive keyword on an otherwise unprocessed line.
	pub keyword: Regex,
}

fn compile(fragment_name: &str, pattern: &str) -> GenrResult<Regex> {
	Regex::new(pattern).map_err(|error| {
		GenrError::InvalidPattern {
			fragment: fragment_name.into(),
			message: error.to_string(),
		}
	})
}

impl Matchers {
	pub fn build(options: &ParseOptions) -> GenrResult<Self> {
		let ParseOptions {
			comment_start,
			comment_end,
			comment_lbound,
			comment_rbound,
		} = options;

		let matchers = Self {
			comment_start: compile(
				"comment_start",
				&format!(
					"^(?P<leading>\\s*){comment_start}(?P<body>.*?)(?:{comment_rbound}|(?P<close>{comment_end}))\\s*$"
				),
			)?,
			expand_directive: compile(
				"expand_directive",
				&format!(
					r"^\s*{EXPAND_KEYWORD}(?:\s+(?P<name>[^,\s]+)(?P<more>(?:\s*,\s*[^,\s]+)*)(?:\s+(?P<config>\S+))?)?\s*$"
				),
			)?,
			directive_end: compile("directive_end", &format!(r"^\s*{END_KEYWORD}\s*$"))?,
			block_body_line: compile(
				"block_body_line",
				&format!(
					"^\\s*(?:(?P<pre_close>{comment_end})|{comment_lbound}(?P<body>.*?)(?:{comment_rbound}|(?P<post_close>{comment_end})))\\s*$"
				),
			)?,
			comment_end: compile("comment_end", comment_end)?,
			interpolated: compile(
				"interpolated",
				&format!(r"{comment_start}\s*(?:{EXPAND_KEYWORD}|{END_KEYWORD})\b"),
			)?,
			keyword: compile("keyword", &format!(r"\b(?:{EXPAND_KEYWORD}|{END_KEYWORD})\b"))?,
		};

		tracing::debug!(?matchers, "compiled directive matchers");

		Ok(matchers)
	}
}
