use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

use crate::warnings::WarningEntry;

/// A warning buffered against the file (and optionally the line) that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferedWarning {
	pub file_path: PathBuf,
	/// 0-indexed line the warning is attached to, when known.
	pub line_index: Option<usize>,
	/// The offending line's text, when known.
	pub line: Option<String>,
	pub entry: WarningEntry,
}

/// Collaborator collecting warnings during scanning and synchronization.
/// Presentation is left to the consumer (the CLI renders buffered warnings
/// once all files have settled).
pub trait Report: Send + Sync {
	fn buffer_warning(
		&self,
		file_path: &Path,
		line_index: Option<usize>,
		line: Option<&str>,
		entries: &[WarningEntry],
	);
}

/// Append-only warning collector keyed by file path. Shared across
/// concurrently processed files behind a mutex.
#[derive(Debug, Default)]
pub struct BufferedReporter {
	warnings: Mutex<BTreeMap<PathBuf, Vec<BufferedWarning>>>,
}

impl BufferedReporter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Drain every buffered warning, ordered by file path then insertion
	/// order.
	pub fn take_all(&self) -> Vec<BufferedWarning> {
		let mut warnings = self.warnings.lock().expect("reporter mutex poisoned");
		std::mem::take(&mut *warnings).into_values().flatten().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.warnings
			.lock()
			.expect("reporter mutex poisoned")
			.is_empty()
	}

	pub fn warning_count(&self) -> usize {
		self.warnings
			.lock()
			.expect("reporter mutex poisoned")
			.values()
			.map(Vec::len)
			.sum()
	}
}

impl Report for BufferedReporter {
	fn buffer_warning(
		&self,
		file_path: &Path,
		line_index: Option<usize>,
		line: Option<&str>,
		entries: &[WarningEntry],
	) {
		if entries.is_empty() {
			return;
		}

		let mut warnings = self.warnings.lock().expect("reporter mutex poisoned");
		let buffered = warnings.entry(file_path.to_path_buf()).or_default();

		for entry in entries {
			buffered.push(BufferedWarning {
				file_path: file_path.to_path_buf(),
				line_index,
				line: line.map(ToString::to_string),
				entry: entry.clone(),
			});
		}
	}
}
