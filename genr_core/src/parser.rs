use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::GenrError;
use crate::GenrResult;
use crate::matchers::Matchers;
use crate::matchers::ParseOptions;
use crate::splitter;
use crate::warnings;
use crate::warnings::WarningEntry;

/// A single template invocation attached to a directive.
///
/// Built incrementally while scanning: the `expand` line contributes the
/// name and an optional external args file, the section splitter later
/// attaches parsed arguments and inline bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateInvocation {
	/// Template name. Absent when an inline body is supplied instead.
	pub name: Option<String>,
	/// Resolved path of an external argument file, when one was referenced.
	pub args_file: Option<PathBuf>,
	/// Structured arguments passed to the template on render.
	pub args: Option<serde_json::Value>,
	/// Inline template body supplied through a third body section.
	pub body: Option<String>,
}

impl TemplateInvocation {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	pub fn inline(body: impl Into<String>) -> Self {
		Self {
			body: Some(body.into()),
			..Self::default()
		}
	}
}

/// A finalized directive: an `expand`/`end` comment pair with resolved
/// templates and arguments. Immutable once emitted, consumed exactly once
/// by the synchronization engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
	/// The templates to expand into the generated region, in order.
	pub templates: Vec<TemplateInvocation>,
	/// Directive-level arguments from the first body section, e.g. an
	/// external target-file override.
	pub args: Option<serde_json::Value>,
	/// 0-indexed first line of the previously generated region.
	pub start_line_index: usize,
	/// 0-indexed line of the `end` marker.
	pub end_line_index: usize,
	/// The previously generated lines, kept for diffing.
	pub current_content: Vec<String>,
}

impl Directive {
	/// The external target file this directive writes to, when its
	/// directive-level args carry a `targetFilePath` entry.
	pub fn target_file_path(&self) -> Option<&str> {
		self.args.as_ref()?.get("targetFilePath")?.as_str()
	}
}

/// An in-progress directive capture. Lives on the parser's candidate stack
/// until an `end` marker finalizes it.
#[derive(Debug, Clone, Default)]
pub(crate) struct CandidateBlock {
	pub templates: Vec<TemplateInvocation>,
	pub args_lines: Vec<String>,
	pub content_lines: Vec<String>,
	pub start_line_index: Option<usize>,
	pub end_line_index: Option<usize>,
}

impl CandidateBlock {
	fn is_empty(&self) -> bool {
		self.templates.is_empty() && self.args_lines.is_empty()
	}
}

/// The scanner's state, derived purely from the candidate stack contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParserState {
	/// No directive is currently open.
	Init,
	/// Accumulating argument body lines before the generated region starts.
	InCommentBlock,
	/// Replaying previously generated lines until the `end` marker.
	InGeneratedBlock,
}

/// A tagged item emitted by the scanner, in strict input order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseItem {
	/// A passthrough line of the scanned file. Lines inside a generated
	/// region are held back until the region closes: a directive replaces
	/// them with rendered content, a templateless open/close pair replays
	/// them unchanged.
	Line {
		line_index: usize,
		text: String,
		/// Whether scanning this line changed the parser state or the
		/// pending template count.
		did_process: bool,
		warnings: Vec<WarningEntry>,
	},
	/// A finalized directive, emitted when its `end` marker is reached.
	Directive(Directive),
}

/// Line-oriented scanner recognizing the directive grammar embedded in
/// host-language comments.
///
/// Feed lines strictly in order through [`parse_line`](Self::parse_line)
/// and call [`finish`](Self::finish) at end of input. Nested "secondary"
/// `expand` lines inside an open comment push additional candidates that
/// share the physical comment block and its generated region.
pub struct CommentParser {
	matchers: Matchers,
	candidate_stack: Vec<CandidateBlock>,
	/// Warnings raised on interior generated-region lines, held until the
	/// next emitted item so ordering is preserved.
	pending_warnings: Vec<WarningEntry>,
	/// Directory of the file being scanned. External argument files are
	/// resolved relative to it.
	base_dir: PathBuf,
}

impl CommentParser {
	pub fn new(options: &ParseOptions, file_path: &Path) -> GenrResult<Self> {
		let base_dir = file_path
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.map_or_else(|| PathBuf::from("."), Path::to_path_buf);

		Ok(Self {
			matchers: Matchers::build(options)?,
			candidate_stack: vec![],
			pending_warnings: vec![],
			base_dir,
		})
	}

	/// The current parser state. A candidate carrying both start and end
	/// indices was left behind by a failed finalization; resuming the scan
	/// over it is a fatal defect.
	pub fn state(&self) -> GenrResult<ParserState> {
		let Some(top) = self.candidate_stack.last() else {
			return Ok(ParserState::Init);
		};

		if top.start_line_index.is_some() {
			if top.end_line_index.is_some() {
				return Err(GenrError::InvalidParserState);
			}
			Ok(ParserState::InGeneratedBlock)
		} else {
			Ok(ParserState::InCommentBlock)
		}
	}

	/// Process one input line, returning the items it produced in order.
	pub fn parse_line(&mut self, line_index: usize, line: &str) -> GenrResult<Vec<ParseItem>> {
		let prev_state = self.state()?;
		let prev_template_count = self.pending_template_count();
		let mut items = vec![];
		let mut warnings = std::mem::take(&mut self.pending_warnings);

		tracing::trace!(?prev_state, line_index, line, "processing line");

		match prev_state {
			ParserState::Init => {
				self.check_block_start(line_index, line, &mut warnings);
				self.emit_line(&mut items, line_index, line, prev_state, prev_template_count, warnings)?;
			}
			ParserState::InCommentBlock => {
				self.accumulate_args(line_index, line, &mut warnings);
				self.emit_line(&mut items, line_index, line, prev_state, prev_template_count, warnings)?;
			}
			ParserState::InGeneratedBlock => {
				self.check_generated_end(line_index, line, &mut warnings, &mut items)?;
				if self.state()? == ParserState::Init {
					self.emit_line(&mut items, line_index, line, prev_state, prev_template_count, warnings)?;
				} else {
					// Interior generated-region lines are not emitted; keep
					// their warnings for the next item.
					self.pending_warnings = warnings;
				}
			}
		}

		Ok(items)
	}

	/// Signal end of input. Fails when a directive is still open.
	pub fn finish(&self) -> GenrResult<()> {
		if self.state()? != ParserState::Init {
			return Err(GenrError::UnexpectedEof);
		}
		Ok(())
	}

	fn pending_template_count(&self) -> usize {
		self.candidate_stack
			.iter()
			.map(|candidate| candidate.templates.len())
			.sum()
	}

	fn emit_line(
		&mut self,
		items: &mut Vec<ParseItem>,
		line_index: usize,
		line: &str,
		prev_state: ParserState,
		prev_template_count: usize,
		mut warnings: Vec<WarningEntry>,
	) -> GenrResult<()> {
		let did_process = self.state()? != prev_state
			|| self.pending_template_count() != prev_template_count;

		// A line that neither advanced the state machine nor raised a more
		// specific warning, yet still mentions a directive keyword, likely
		// carries a syntax mistake worth surfacing.
		if !did_process && warnings.is_empty() {
			if let Some(found) = self.matchers.keyword.find(line) {
				warnings.push(warnings::unprocessed_directive(found.as_str()));
			}
		}

		items.push(ParseItem::Line {
			line_index,
			text: line.to_string(),
			did_process,
			warnings,
		});

		Ok(())
	}

	fn check_block_start(
		&mut self,
		line_index: usize,
		line: &str,
		warnings: &mut Vec<WarningEntry>,
	) {
		let Some(caps) = self.matchers.comment_start.captures(line) else {
			// Not a dedicated directive comment line. If a directive marker
			// is buried in other content, the directive is discarded.
			if let Some(found) = self.matchers.interpolated.find(line) {
				warnings.push(warnings::interpolated(Some(found.start())));
			}
			return;
		};

		let body = caps.name("body").map_or("", |m| m.as_str());
		let closes = caps.name("close").is_some();

		if self.matchers.directive_end.is_match(body) {
			// The stack is empty in Init: there is nothing to finalize.
			warnings.push(warnings::no_active_directive());
			return;
		}

		let mut candidate = CandidateBlock::default();

		if let Some(expand) = self.matchers.expand_directive.captures(body) {
			candidate.templates = self.parse_template_list(&expand);
			if closes {
				candidate.start_line_index = Some(line_index + 1);
			}
			self.candidate_stack.push(candidate);
		} else if closes {
			// Opened and closed on one line with no expand keyword.
			warnings.push(warnings::single_line_comment());
		} else {
			// A bare comment opening: the expand keyword may follow on a
			// body line (secondary directive form).
			self.candidate_stack.push(candidate);
		}
	}

	fn accumulate_args(
		&mut self,
		line_index: usize,
		line: &str,
		warnings: &mut Vec<WarningEntry>,
	) {
		let Some(caps) = self.matchers.block_body_line.captures(line) else {
			warnings.push(warnings::invalid_arg_body());
			return;
		};

		if let Some(body) = caps.name("body") {
			let body = body.as_str();
			if let Some(expand) = self.matchers.expand_directive.captures(body) {
				// A secondary directive sharing this physical comment block.
				let candidate = CandidateBlock {
					templates: self.parse_template_list(&expand),
					..CandidateBlock::default()
				};
				self.candidate_stack.push(candidate);
			} else if let Some(top) = self.candidate_stack.last_mut() {
				top.args_lines.push(body.to_string());
			}
		}

		// Early-exit probe: the raw line may close the comment even when the
		// decoration patterns swallowed the delimiter.
		if self.matchers.comment_end.is_match(line) {
			let start = line_index + 1;
			for candidate in &mut self.candidate_stack {
				if candidate.start_line_index.is_none() {
					candidate.start_line_index = Some(start);
				}
			}
		}
	}

	fn check_generated_end(
		&mut self,
		line_index: usize,
		line: &str,
		warnings: &mut Vec<WarningEntry>,
		items: &mut Vec<ParseItem>,
	) -> GenrResult<()> {
		let append_content = |stack: &mut Vec<CandidateBlock>| {
			// Several templates may share one generated region; every
			// stacked candidate captures the replayed content.
			for candidate in stack {
				candidate.content_lines.push(line.to_string());
			}
		};

		let Some(caps) = self.matchers.comment_start.captures(line) else {
			// A directive marker buried in other content is captured as
			// region content and overwritten by the next render; surface it
			// before that happens.
			if let Some(found) = self.matchers.interpolated.find(line) {
				warnings.push(warnings::interpolated(Some(found.start())));
			}
			append_content(&mut self.candidate_stack);
			return Ok(());
		};

		let body = caps.name("body").map_or("", |m| m.as_str());

		if self.matchers.directive_end.is_match(body) {
			return self.finalize_candidates(line_index, warnings, items);
		}

		if self.matchers.expand_directive.is_match(body) {
			warnings.push(warnings::nesting_not_allowed());
		}

		append_content(&mut self.candidate_stack);
		Ok(())
	}

	/// Finalize every stacked candidate, in original push order.
	///
	/// Any finalization failure is fatal for the file: the error propagates
	/// and the candidates stay on the stack with both indices set, so a
	/// resumed scan trips the [`state`](Self::state) defect check instead of
	/// silently dropping the captured region.
	fn finalize_candidates(
		&mut self,
		end_line_index: usize,
		warnings: &mut Vec<WarningEntry>,
		items: &mut Vec<ParseItem>,
	) -> GenrResult<()> {
		for candidate in &mut self.candidate_stack {
			candidate.end_line_index = Some(end_line_index);
		}

		let mut emitted = false;

		for candidate in &self.candidate_stack {
			// Stray open/close pairs with no templates and no body produce
			// no directive; their captured region is replayed below.
			if candidate.is_empty() {
				continue;
			}

			let resolved = splitter::resolve_sections(
				candidate.templates.clone(),
				&candidate.args_lines,
				&self.base_dir,
			)?;

			warnings.extend(resolved.warnings);
			emitted = true;

			items.push(ParseItem::Directive(Directive {
				templates: resolved.templates,
				args: resolved.directive_args,
				start_line_index: candidate.start_line_index.unwrap_or(end_line_index),
				end_line_index,
				current_content: candidate.content_lines.clone(),
			}));
		}

		if !emitted {
			// No directive claimed the region: its lines are ordinary
			// content and pass back through unchanged.
			if let Some(first) = self.candidate_stack.first() {
				let start = first.start_line_index.unwrap_or(end_line_index);
				for (offset, text) in first.content_lines.iter().enumerate() {
					items.push(ParseItem::Line {
						line_index: start + offset,
						text: text.clone(),
						did_process: false,
						warnings: vec![],
					});
				}
			}
		}

		self.candidate_stack.clear();
		Ok(())
	}

	fn parse_template_list(&self, caps: &regex::Captures<'_>) -> Vec<TemplateInvocation> {
		let mut templates = vec![];

		if let Some(name) = caps.name("name") {
			templates.push(TemplateInvocation::named(name.as_str()));

			if let Some(more) = caps.name("more") {
				for part in more.as_str().split(',') {
					let part = part.trim();
					if !part.is_empty() {
						templates.push(TemplateInvocation::named(part));
					}
				}
			}
		}

		if let Some(config) = caps.name("config") {
			let resolved = self.base_dir.join(config.as_str());
			for template in &mut templates {
				template.args_file = Some(resolved.clone());
			}
		}

		templates
	}
}
