use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum GenrError {
	#[error(transparent)]
	#[diagnostic(code(genr::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid comment pattern fragment `{fragment}`: {message}")]
	#[diagnostic(
		code(genr::invalid_pattern),
		help("the four parser options must each be a valid regex fragment")
	)]
	InvalidPattern { fragment: String, message: String },

	#[error("failed to parse argument body: {0}")]
	#[diagnostic(
		code(genr::args_parse),
		help("argument bodies must be valid YAML, optionally split by `---` section dividers")
	)]
	ArgsParse(String),

	#[error("unexpected number of sections: {0}")]
	#[diagnostic(
		code(genr::too_many_sections),
		help("a directive body may contain at most 3 sections (directive args, template args, inline template)")
	)]
	TooManySections(usize),

	#[error("unexpected end of input while a directive was still open")]
	#[diagnostic(
		code(genr::unexpected_eof),
		help("close the directive with an `end` comment before the end of the file")
	)]
	UnexpectedEof,

	#[error("invalid parser state: candidate has both start and end indices set")]
	#[diagnostic(code(genr::invalid_parser_state))]
	InvalidParserState,

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(genr::template_render))]
	TemplateRender(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(genr::config_parse),
		help("check that genr.toml is valid TOML with optional `input_pattern`, `templates_dir` and `[parser]` entries")
	)]
	ConfigParse(String),

	#[error("invalid input pattern `{pattern}`: {message}")]
	#[diagnostic(code(genr::invalid_input_pattern))]
	InvalidInputPattern { pattern: String, message: String },

	#[error("failed to walk project tree: {0}")]
	#[diagnostic(code(genr::walk))]
	Walk(String),
}

pub type GenrResult<T> = Result<T, GenrError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
