use std::path::Path;

use crate::GenrError;
use crate::GenrResult;
use crate::parser::TemplateInvocation;
use crate::warnings;
use crate::warnings::WarningEntry;

/// A line holding exactly `---` (after trimming) starts a new section.
const SECTION_SEPARATOR: &str = "---";

/// Inline template bodies longer than this draw an advisory warning.
const LARGE_INLINE_TEMPLATE_LINES: usize = 5;

/// File extensions that make a template name an external args file
/// reference instead.
const ARGS_FILE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// The outcome of splitting a candidate's accumulated body lines: the final
/// template list, the directive-level args, and any advisory warnings.
#[derive(Debug)]
pub(crate) struct ResolvedCandidate {
	pub templates: Vec<TemplateInvocation>,
	pub directive_args: Option<serde_json::Value>,
	pub warnings: Vec<WarningEntry>,
}

/// Split accumulated body lines on literal `---` dividers. Empty lines are
/// appended to the current section, never treated as separators.
fn split_sections(lines: &[String]) -> Vec<Vec<String>> {
	let mut sections = vec![vec![]];

	for line in lines {
		if line.trim() == SECTION_SEPARATOR {
			sections.push(vec![]);
		} else if let Some(section) = sections.last_mut() {
			section.push(line.clone());
		}
	}

	sections
}

/// Parse a section as YAML. An empty or absent section yields `None`,
/// never an error.
fn parse_args_body(lines: &[String]) -> GenrResult<Option<serde_json::Value>> {
	let body = lines.join("\n");
	if body.trim().is_empty() {
		return Ok(None);
	}

	let value = serde_yaml_ng::from_str(&body)
		.map_err(|error| GenrError::ArgsParse(error.to_string()))?;
	Ok(Some(value))
}

/// Read and parse an external args file. The format follows the file
/// extension; read failures are I/O errors and abort the enclosing file.
fn load_args_file(path: &Path) -> GenrResult<Option<serde_json::Value>> {
	let raw = std::fs::read_to_string(path)?;
	if raw.trim().is_empty() {
		return Ok(None);
	}

	let value = if path.extension().is_some_and(|ext| ext == "json") {
		serde_json::from_str(&raw).map_err(|error| GenrError::ArgsParse(error.to_string()))?
	} else {
		serde_yaml_ng::from_str(&raw).map_err(|error| GenrError::ArgsParse(error.to_string()))?
	};

	Ok(Some(value))
}

fn has_args_file_extension(name: &str) -> bool {
	ARGS_FILE_EXTENSIONS
		.iter()
		.any(|ext| Path::new(name).extension().is_some_and(|found| found == *ext))
}

/// Interpret a finished candidate's body lines as up to three ordered
/// sections and resolve the final template list:
///
/// - `[0]` — directive-level args (always present, possibly empty)
/// - `[1]` — per-template args, assigned to every template
/// - `[2]` — inline template body, appended as an unnamed template
///
/// A single named template whose name carries an args-file extension is
/// reinterpreted as an external args reference for the inline template.
pub(crate) fn resolve_sections(
	mut templates: Vec<TemplateInvocation>,
	args_lines: &[String],
	base_dir: &Path,
) -> GenrResult<ResolvedCandidate> {
	let sections = split_sections(args_lines);
	if sections.len() > 3 {
		return Err(GenrError::TooManySections(sections.len()));
	}

	let mut warnings = vec![];
	let directive_args = parse_args_body(&sections[0])?;

	// Args files referenced from the expand line itself.
	for template in &mut templates {
		if template.args.is_none() {
			if let Some(path) = &template.args_file {
				template.args = load_args_file(path)?;
			}
		}
	}

	if let Some(body_lines) = sections.get(2) {
		if body_lines.len() > LARGE_INLINE_TEMPLATE_LINES {
			warnings.push(warnings::large_inline_template(body_lines.len()));
		}

		let mut inline = TemplateInvocation::inline(body_lines.join("\n"));

		let args_file_name = match templates.as_slice() {
			[only] => {
				only.name
					.as_deref()
					.filter(|name| has_args_file_extension(name))
					.map(str::to_owned)
			}
			_ => None,
		};

		if let Some(name) = args_file_name {
			let path = base_dir.join(&name);
			inline.args = load_args_file(&path)?;
			inline.args_file = Some(path);
			templates.clear();
		} else if !templates.is_empty() {
			warnings.push(warnings::inline_template_retained());
		}

		templates.push(inline);
	}

	if let Some(section) = sections.get(1) {
		if let Some(args) = parse_args_body(section)? {
			for template in &mut templates {
				template.args = Some(args.clone());
			}
		}
	} else if directive_args.is_some() {
		warnings.push(warnings::missing_section_separator());
	}

	Ok(ResolvedCandidate {
		templates,
		directive_args,
		warnings,
	})
}

#[cfg(test)]
mod tests {
	use similar_asserts::assert_eq;

	use super::*;

	fn lines(values: &[&str]) -> Vec<String> {
		values.iter().map(ToString::to_string).collect()
	}

	#[test]
	fn splits_on_separator_lines() {
		let sections = split_sections(&lines(&["a", "---", "b", "", "c"]));
		assert_eq!(
			sections,
			vec![lines(&["a"]), lines(&["b", "", "c"])]
		);
	}

	#[test]
	fn separator_detection_ignores_surrounding_whitespace() {
		let sections = split_sections(&lines(&["  ---  ", "b"]));
		assert_eq!(sections, vec![vec![], lines(&["b"])]);
	}

	#[test]
	fn empty_body_yields_null() {
		assert_eq!(parse_args_body(&[]).unwrap(), None);
		assert_eq!(parse_args_body(&lines(&["", "   "])).unwrap(), None);
	}

	#[test]
	fn recognizes_args_file_extensions() {
		assert!(has_args_file_extension("config.yaml"));
		assert!(has_args_file_extension("nested/config.yml"));
		assert!(has_args_file_extension("config.json"));
		assert!(!has_args_file_extension("knex-dal"));
		assert!(!has_args_file_extension("config.toml"));
	}
}
