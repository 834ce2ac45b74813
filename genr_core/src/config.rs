use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::GenrError;
use crate::GenrResult;
use crate::locator::DEFAULT_TEMPLATES_DIR;
use crate::matchers::ParseOptions;
use crate::project::DEFAULT_INPUT_PATTERN;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["genr.toml", ".genr.toml", ".config/genr.toml"];

/// Configuration loaded from a `genr.toml` file.
///
/// ```toml
/// input_pattern = "src/**/*.{rs,ts}"
/// templates_dir = "codegen/templates"
///
/// [parser]
/// comment_start = '#!'
/// comment_end = '!#'
/// ```
///
/// Every field is optional; a missing config file yields the defaults.
#[derive(Debug, Deserialize)]
pub struct GenrConfig {
	/// Glob pattern selecting the files to scan, relative to the project
	/// root.
	#[serde(default = "default_input_pattern")]
	pub input_pattern: String,
	/// Directory searched for named template files.
	#[serde(default = "default_templates_dir")]
	pub templates_dir: PathBuf,
	/// Overrides for the comment-delimiter regex fragments.
	#[serde(default)]
	pub parser: ParserConfig,
}

/// Per-fragment overrides for the scanner's comment grammar. Any fragment
/// left unset falls back to the C-style default.
#[derive(Debug, Default, Deserialize)]
pub struct ParserConfig {
	#[serde(default)]
	pub comment_start: Option<String>,
	#[serde(default)]
	pub comment_end: Option<String>,
	#[serde(default)]
	pub comment_lbound: Option<String>,
	#[serde(default)]
	pub comment_rbound: Option<String>,
}

fn default_input_pattern() -> String {
	DEFAULT_INPUT_PATTERN.into()
}

fn default_templates_dir() -> PathBuf {
	DEFAULT_TEMPLATES_DIR.into()
}

impl Default for GenrConfig {
	fn default() -> Self {
		Self {
			input_pattern: default_input_pattern(),
			templates_dir: default_templates_dir(),
			parser: ParserConfig::default(),
		}
	}
}

impl GenrConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`, or
	/// the defaults when no config file exists.
	pub fn load(root: &Path) -> GenrResult<GenrConfig> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(GenrConfig::default());
		};

		tracing::debug!(path = %config_path.display(), "loading config");

		let content = std::fs::read_to_string(&config_path)?;
		toml::from_str(&content).map_err(|e| GenrError::ConfigParse(e.to_string()))
	}

	/// Merge the `[parser]` overrides over the default comment grammar.
	#[must_use]
	pub fn parse_options(&self) -> ParseOptions {
		let mut options = ParseOptions::default();
		if let Some(fragment) = &self.parser.comment_start {
			options.comment_start = fragment.clone();
		}
		if let Some(fragment) = &self.parser.comment_end {
			options.comment_end = fragment.clone();
		}
		if let Some(fragment) = &self.parser.comment_lbound {
			options.comment_lbound = fragment.clone();
		}
		if let Some(fragment) = &self.parser.comment_rbound {
			options.comment_rbound = fragment.clone();
		}
		options
	}
}
