use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::GenrError;
use crate::GenrResult;
use crate::locator::Locate;
use crate::matchers::ParseOptions;
use crate::parser::CommentParser;
use crate::parser::Directive;
use crate::parser::ParseItem;
use crate::reporter::Report;
use crate::warnings;

/// The rewritten contents computed for a single file, before anything is
/// persisted. External target files referenced by directives are collected
/// here and flushed only after the whole file has scanned cleanly.
#[derive(Debug)]
pub struct ComputedFile {
	pub path: PathBuf,
	pub original: String,
	pub updated: String,
	/// Externally targeted outputs: `(path, rendered content)` pairs.
	pub external_files: Vec<(PathBuf, String)>,
}

impl ComputedFile {
	pub fn changed(&self) -> bool {
		self.original != self.updated
	}

	/// Persist this computation: external targets are written only when
	/// their rendered content differs from what is already on disk, and
	/// the scanned file is atomically replaced only when it changed.
	/// Returns whether the file itself was rewritten.
	pub fn write(&self) -> GenrResult<bool> {
		for (path, content) in &self.external_files {
			let existing = std::fs::read_to_string(path).unwrap_or_default();
			if existing != *content {
				persist_atomic(path, content)?;
			}
		}

		let changed = self.changed();
		if changed {
			tracing::debug!(path = %self.path.display(), "rewriting file");
			persist_atomic(&self.path, &self.updated)?;
		}

		Ok(changed)
	}
}

/// Drives the scanner over one file, resolves directives against the
/// locator, renders, diffs against the prior generated regions, and
/// performs a crash-safe in-place rewrite.
pub struct TemplateProcessor<'a> {
	file_path: PathBuf,
	base_dir: PathBuf,
	options: &'a ParseOptions,
	locator: &'a dyn Locate,
	reporter: &'a dyn Report,
}

impl<'a> TemplateProcessor<'a> {
	pub fn new(
		file_path: impl Into<PathBuf>,
		options: &'a ParseOptions,
		locator: &'a dyn Locate,
		reporter: &'a dyn Report,
	) -> Self {
		let file_path = file_path.into();
		let base_dir = file_path
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.map_or_else(|| PathBuf::from("."), Path::to_path_buf);

		Self {
			file_path,
			base_dir,
			options,
			locator,
			reporter,
		}
	}

	/// Scan the file and compute its rewritten contents without touching
	/// the filesystem. Non-directive lines pass through byte-for-byte,
	/// modulo per-line newline normalization.
	pub fn compute(&self) -> GenrResult<ComputedFile> {
		let original = std::fs::read_to_string(&self.file_path)?;
		let mut parser = CommentParser::new(self.options, &self.file_path)?;
		let mut updated = String::with_capacity(original.len());
		let mut external_files = vec![];

		for (line_index, line) in original.lines().enumerate() {
			for item in parser.parse_line(line_index, line)? {
				self.process_item(item, &mut updated, &mut external_files)?;
			}
		}

		parser.finish()?;

		Ok(ComputedFile {
			path: self.file_path.clone(),
			original,
			updated,
			external_files,
		})
	}

	/// Compute and persist: the original file is atomically replaced only
	/// when its content changed, and external targets are written only
	/// when their rendered content differs from what is already on disk.
	/// Returns whether the file itself was rewritten.
	pub fn process(&self) -> GenrResult<bool> {
		self.compute()?.write()
	}

	fn process_item(
		&self,
		item: ParseItem,
		updated: &mut String,
		external_files: &mut Vec<(PathBuf, String)>,
	) -> GenrResult<()> {
		match item {
			ParseItem::Line {
				line_index,
				text,
				warnings,
				..
			} => {
				updated.push_str(&text);
				updated.push('\n');
				if !warnings.is_empty() {
					self.reporter.buffer_warning(
						&self.file_path,
						Some(line_index),
						Some(&text),
						&warnings,
					);
				}
			}
			ParseItem::Directive(directive) => {
				self.process_directive(&directive, updated, external_files)?;
			}
		}

		Ok(())
	}

	fn process_directive(
		&self,
		directive: &Directive,
		updated: &mut String,
		external_files: &mut Vec<(PathBuf, String)>,
	) -> GenrResult<()> {
		let mut rendered = String::new();
		let mut rendered_count = 0usize;

		for invocation in &directive.templates {
			let Some(capability) = self.locator.locate(invocation, &self.file_path) else {
				// The locator already buffered an unresolved-template
				// warning; skip this template without aborting the
				// directive.
				continue;
			};

			match capability.render(invocation) {
				Ok(text) => {
					rendered.push_str(&normalize(&text));
					rendered_count += 1;
				}
				Err(error) => {
					self.reporter.buffer_warning(
						&self.file_path,
						Some(directive.end_line_index),
						None,
						&[warnings::render_failed(capability.display_name(), &error)],
					);
				}
			}
		}

		let prior: String = directive
			.current_content
			.iter()
			.map(|line| format!("{line}\n"))
			.collect();

		// When every template failed to resolve or render, the prior
		// generated content is preserved rather than wiped.
		if rendered_count == 0 && !directive.templates.is_empty() {
			updated.push_str(&prior);
			return Ok(());
		}

		if let Some(target) = directive.target_file_path() {
			external_files.push((self.base_dir.join(target), rendered));
			return Ok(());
		}

		if rendered == prior {
			updated.push_str(&prior);
		} else {
			tracing::debug!(
				path = %self.file_path.display(),
				start = directive.start_line_index,
				"generated region changed"
			);
			updated.push_str(&rendered);
		}

		Ok(())
	}
}

/// Normalize rendered output: CRLF becomes LF and non-empty output gains a
/// trailing newline, so region content always aligns on line boundaries.
fn normalize(text: &str) -> String {
	let mut normalized = text.replace("\r\n", "\n");
	if !normalized.is_empty() && !normalized.ends_with('\n') {
		normalized.push('\n');
	}
	normalized
}

/// Write `content` to `path` through a temporary file in the same
/// directory, followed by an atomic rename. Readers never observe a
/// partial rewrite.
pub fn persist_atomic(path: &Path, content: &str) -> GenrResult<()> {
	let dir = path
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
	std::fs::create_dir_all(&dir)?;

	let mut file = tempfile::NamedTempFile::new_in(&dir)?;
	file.write_all(content.as_bytes())?;
	file.persist(path)
		.map_err(|error| GenrError::Io(error.error))?;

	Ok(())
}
