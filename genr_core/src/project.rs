use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;

use crate::GenrError;
use crate::GenrResult;
use crate::config::GenrConfig;
use crate::engine::TemplateProcessor;
use crate::locator::Locate;
use crate::matchers::ParseOptions;
use crate::reporter::Report;
use crate::warnings;

/// Glob pattern selecting the source files scanned by default.
pub const DEFAULT_INPUT_PATTERN: &str = "src/**/*.{c,cpp,cs,java,js,jsx,rs,ts,tsx}";

/// Per-file result of a synchronization run.
#[derive(Debug)]
pub struct FileOutcome {
	pub path: PathBuf,
	pub changed: bool,
	pub original: String,
	pub updated: String,
}

/// Aggregate result of processing a set of files. Failed files were left
/// byte-identical to their original content.
#[derive(Debug, Default)]
pub struct ProjectOutcome {
	pub files: Vec<FileOutcome>,
	pub failed: Vec<PathBuf>,
}

impl ProjectOutcome {
	pub fn is_ok(&self) -> bool {
		self.failed.is_empty()
	}

	pub fn changed_count(&self) -> usize {
		self.files.iter().filter(|outcome| outcome.changed).count()
	}
}

fn build_glob_set(pattern: &str) -> GenrResult<GlobSet> {
	let glob = GlobBuilder::new(pattern)
		.literal_separator(true)
		.build()
		.map_err(|error| {
			GenrError::InvalidInputPattern {
				pattern: pattern.into(),
				message: error.to_string(),
			}
		})?;

	let mut builder = GlobSetBuilder::new();
	builder.add(glob);
	builder.build().map_err(|error| {
		GenrError::InvalidInputPattern {
			pattern: pattern.into(),
			message: error.to_string(),
		}
	})
}

/// Walk `root` and collect the files matching the input pattern, in sorted
/// order for deterministic processing.
pub fn discover_files(root: &Path, pattern: &str) -> GenrResult<Vec<PathBuf>> {
	let glob_set = build_glob_set(pattern)?;
	let mut files = vec![];

	for result in ignore::WalkBuilder::new(root).build() {
		let entry = result.map_err(|error| GenrError::Walk(error.to_string()))?;
		let path = entry.path();
		if !path.is_file() {
			continue;
		}

		let relative = path.strip_prefix(root).unwrap_or(path);
		if glob_set.is_match(relative) {
			files.push(path.to_path_buf());
		}
	}

	files.sort();
	Ok(files)
}

/// Process each file through its own scanner and engine instance. Files
/// are fully independent: a failure in one is converted into a buffered
/// warning and does not affect the others.
pub fn process_files(
	paths: &[PathBuf],
	options: &ParseOptions,
	locator: &dyn Locate,
	reporter: &dyn Report,
	dry_run: bool,
) -> ProjectOutcome {
	let mut outcome = ProjectOutcome::default();

	for path in paths {
		let processor = TemplateProcessor::new(path, options, locator, reporter);

		let computed = match processor.compute() {
			Ok(computed) => computed,
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "failed to process file");
				reporter.buffer_warning(path, None, None, &[warnings::file_failed(&error)]);
				outcome.failed.push(path.clone());
				continue;
			}
		};

		let changed = computed.changed();

		if !dry_run {
			if let Err(error) = computed.write() {
				reporter.buffer_warning(path, None, None, &[warnings::file_failed(&error)]);
				outcome.failed.push(path.clone());
				continue;
			}
		}

		outcome.files.push(FileOutcome {
			path: path.clone(),
			changed,
			original: computed.original,
			updated: computed.updated,
		});
	}

	outcome
}

/// Discover and synchronize every matching file under `root`.
pub fn run(
	root: &Path,
	config: &GenrConfig,
	locator: &dyn Locate,
	reporter: &dyn Report,
	dry_run: bool,
) -> GenrResult<ProjectOutcome> {
	let files = discover_files(root, &config.input_pattern)?;
	tracing::info!(count = files.len(), "processing files");

	let options = config.parse_options();
	Ok(process_files(&files, &options, locator, reporter, dry_run))
}
