use serde::Deserialize;
use serde::Serialize;

use crate::GenrError;

/// A single warning raised while scanning or synchronizing a file.
///
/// Warnings never abort line processing; they travel with the item that
/// produced them and are flushed to a [`Report`](crate::Report)
/// implementation once the item is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningEntry {
	/// Column offset into the offending line, when known.
	pub index: Option<usize>,
	/// Human readable description of the problem.
	pub message: String,
	/// The underlying error message, when the warning wraps one.
	pub error: Option<String>,
}

impl WarningEntry {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			index: None,
			message: message.into(),
			error: None,
		}
	}
}

pub fn interpolated(index: Option<usize>) -> WarningEntry {
	WarningEntry {
		index,
		message: "Detected extraneous content surrounding a directive.\nDirectives are expected \
		          to be specified in a dedicated line.\nThis directive will be discarded."
			.into(),
		error: None,
	}
}

pub fn invalid_arg_body() -> WarningEntry {
	WarningEntry::new(
		"Detected invalid line in the arguments body of a directive.\nThis line will be discarded.",
	)
}

pub fn unprocessed_directive(keyword: &str) -> WarningEntry {
	WarningEntry::new(format!(
		"Potentially unprocessed directive keyword: {keyword}.\nIf you expected this directive to \
		 be processed please recheck the syntax."
	))
}

pub fn no_active_directive() -> WarningEntry {
	WarningEntry::new("Encountered an `end` directive but no directive is currently open.")
}

pub fn nesting_not_allowed() -> WarningEntry {
	WarningEntry::new(
		"Directives can not be nested: a new directive can not open while another is still being \
		 scanned.\nThis directive will be discarded.",
	)
}

pub fn single_line_comment() -> WarningEntry {
	WarningEntry::new(
		"Encountered a single line directive comment without an `expand` keyword.\nThis comment \
		 will be ignored.",
	)
}

pub fn large_inline_template(line_count: usize) -> WarningEntry {
	WarningEntry::new(format!(
		"Inline template body spans {line_count} lines.\nConsider moving it into a template file."
	))
}

pub fn inline_template_retained() -> WarningEntry {
	WarningEntry::new(
		"An inline template body does not override the named template(s) of this \
		 directive.\nBoth will be expanded.",
	)
}

pub fn missing_section_separator() -> WarningEntry {
	WarningEntry::new(
		"Missing `---` separator before template arguments.\nThe templates of this directive will \
		 receive no arguments.",
	)
}

pub fn invalid_template_name(name: &str) -> WarningEntry {
	WarningEntry::new(format!("Invalid template name: {name}"))
}

pub fn unresolved_template(name: &str) -> WarningEntry {
	WarningEntry::new(format!("Failed to resolve template: {name}"))
}

pub fn render_failed(name: &str, error: &GenrError) -> WarningEntry {
	WarningEntry {
		index: None,
		message: format!("Failed to render template: {name}. This template will be skipped."),
		error: Some(error.to_string()),
	}
}

pub fn file_failed(error: &GenrError) -> WarningEntry {
	WarningEntry {
		index: None,
		message: "Failed to process file. The file has been left unmodified.".into(),
		error: Some(error.to_string()),
	}
}
