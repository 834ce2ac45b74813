use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use crate::GenrError;
use crate::GenrResult;
use crate::parser::TemplateInvocation;
use crate::reporter::Report;
use crate::warnings;

/// Default directory searched for template files.
pub const DEFAULT_TEMPLATES_DIR: &str = "genr-templates";

/// File extension of template files inside the templates directory.
const TEMPLATE_EXTENSION: &str = "jinja";

/// Collaborator mapping a template invocation to a render capability.
/// An absent result means the invocation's template could not be resolved;
/// the locator buffers a warning and the engine skips that template.
pub trait Locate: Send + Sync {
	fn locate(&self, invocation: &TemplateInvocation, file_path: &Path)
	-> Option<RenderCapability>;
}

/// A resolved template source, ready to render against an invocation's
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCapability {
	/// An inline body embedded in the directive itself.
	Inline(String),
	/// A named template loaded from the templates directory or cache.
	Named { name: String, source: String },
}

impl RenderCapability {
	/// Render this template with the invocation's structured args as the
	/// context. A fresh environment is built per render; template sources
	/// are cheap strings and the locator cache already avoids re-reading
	/// them from disk.
	pub fn render(&self, invocation: &TemplateInvocation) -> GenrResult<String> {
		let (name, source) = match self {
			Self::Inline(source) => ("__inline__", source.as_str()),
			Self::Named { name, source } => (name.as_str(), source.as_str()),
		};

		let mut env = minijinja::Environment::new();
		env.set_keep_trailing_newline(true);
		env.set_undefined_behavior(minijinja::UndefinedBehavior::Chainable);
		env.add_template(name, source)
			.map_err(|error| GenrError::TemplateRender(error.to_string()))?;

		let template = env
			.get_template(name)
			.map_err(|error| GenrError::TemplateRender(error.to_string()))?;

		let ctx = match &invocation.args {
			Some(args) => minijinja::Value::from_serialize(args),
			None => minijinja::Value::from(()),
		};

		template
			.render(ctx)
			.map_err(|error| GenrError::TemplateRender(error.to_string()))
	}

	/// A printable identifier for warnings.
	pub fn display_name(&self) -> &str {
		match self {
			Self::Inline(_) => "<inline>",
			Self::Named { name, .. } => name,
		}
	}
}

/// File-backed template locator with a read-mostly name→source cache.
///
/// Resolution order: inline body, then cache, then template files under the
/// templates directory (`<dir>/<name>.jinja`, `<dir>/<name>`), then `<name>`
/// as a bare path. The first readable source wins and is cached.
pub struct TemplateLocator {
	templates_dir: Option<PathBuf>,
	cache: RwLock<HashMap<String, String>>,
	reporter: Arc<dyn Report>,
}

impl TemplateLocator {
	pub fn new(templates_dir: Option<PathBuf>, reporter: Arc<dyn Report>) -> Self {
		Self {
			templates_dir,
			cache: RwLock::new(HashMap::new()),
			reporter,
		}
	}

	/// Pre-load every template file in the templates directory into the
	/// cache. A missing directory is not an error.
	pub fn bootstrap(&self) -> GenrResult<()> {
		let Some(dir) = &self.templates_dir else {
			return Ok(());
		};

		if !dir.is_dir() {
			return Ok(());
		}

		let mut cache = self.cache.write().expect("locator cache poisoned");

		for result in ignore::WalkBuilder::new(dir).build() {
			let entry = result.map_err(|error| GenrError::Walk(error.to_string()))?;
			let path = entry.path();
			if !path.is_file() || path.extension().is_none_or(|ext| ext != TEMPLATE_EXTENSION) {
				continue;
			}

			let Ok(relative) = path.strip_prefix(dir) else {
				continue;
			};
			let name = relative
				.with_extension("")
				.to_string_lossy()
				.replace('\\', "/");

			tracing::debug!(name, "caching template");
			cache.insert(name, std::fs::read_to_string(path)?);
		}

		Ok(())
	}

	fn is_valid_name(name: &str) -> bool {
		if name.ends_with('/') {
			return false;
		}
		!name.is_empty()
			&& name.split('/').all(|segment| {
				!segment.is_empty()
					&& segment
						.chars()
						.all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '_' | '-'))
			})
	}

	fn candidate_paths(&self, name: &str) -> Vec<PathBuf> {
		let mut candidates = vec![];
		if let Some(dir) = &self.templates_dir {
			candidates.push(dir.join(format!("{name}.{TEMPLATE_EXTENSION}")));
			candidates.push(dir.join(name));
		}
		candidates.push(PathBuf::from(name));
		candidates
	}
}

impl Locate for TemplateLocator {
	fn locate(
		&self,
		invocation: &TemplateInvocation,
		file_path: &Path,
	) -> Option<RenderCapability> {
		if let Some(body) = &invocation.body {
			return Some(RenderCapability::Inline(body.clone()));
		}

		let name = invocation.name.as_deref()?;
		tracing::debug!(name, "locating template");

		if !Self::is_valid_name(name) {
			self.reporter.buffer_warning(
				file_path,
				None,
				None,
				&[warnings::invalid_template_name(name)],
			);
			return None;
		}

		{
			let cache = self.cache.read().expect("locator cache poisoned");
			if let Some(source) = cache.get(name) {
				return Some(RenderCapability::Named {
					name: name.to_string(),
					source: source.clone(),
				});
			}
		}

		for candidate in self.candidate_paths(name) {
			let Ok(source) = std::fs::read_to_string(&candidate) else {
				tracing::debug!(path = %candidate.display(), "template candidate not readable");
				continue;
			};

			self.cache
				.write()
				.expect("locator cache poisoned")
				.insert(name.to_string(), source.clone());

			return Some(RenderCapability::Named {
				name: name.to_string(),
				source,
			});
		}

		self.reporter.buffer_warning(
			file_path,
			None,
			None,
			&[warnings::unresolved_template(name)],
		);
		None
	}
}
