//! `genr_core` is the core library for the genr directive expander. It scans
//! source files for comment-embedded `expand` directives, renders the named
//! or inline templates against structured arguments, and rewrites the
//! generated regions in place so they stay synchronized with their templates.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source file
//!   → CommentParser (line-by-line scan, candidate stack, section splitting)
//!   → TemplateLocator (inline body, cache, or templates directory)
//!   → TemplateProcessor (render, diff against prior region, reassemble)
//!   → atomic in-place rewrite (only when content changed)
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Configuration loading from `genr.toml`, including the input
//!   glob pattern, templates directory, and comment-grammar overrides.
//! - [`matchers`] — The comment-delimiter fragments and the compiled
//!   directive patterns built from them.
//! - [`project`] — File discovery and whole-project synchronization.
//! - [`warnings`] — The non-fatal diagnostics buffered while scanning.
//!
//! ## Key Types
//!
//! - [`CommentParser`] — The pull-based directive scanner; feed it lines,
//!   collect [`ParseItem`]s.
//! - [`Directive`] — A fully parsed directive with its resolved templates and
//!   the current content of its generated region.
//! - [`TemplateProcessor`] — Drives one file from scan to rewrite.
//! - [`TemplateLocator`] — Resolves template names to sources, with a cache.
//! - [`GenrConfig`] — Configuration loaded from `genr.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use genr_core::BufferedReporter;
//! use genr_core::GenrConfig;
//! use genr_core::TemplateLocator;
//!
//! let root = Path::new(".");
//! let config = GenrConfig::load(root).unwrap();
//! let reporter = Arc::new(BufferedReporter::new());
//! let locator = TemplateLocator::new(Some(root.join(&config.templates_dir)), reporter.clone());
//! locator.bootstrap().unwrap();
//!
//! let outcome = genr_core::run(root, &config, &locator, reporter.as_ref(), false).unwrap();
//! println!("{} file(s) updated", outcome.changed_count());
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use locator::*;
pub use matchers::END_KEYWORD;
pub use matchers::EXPAND_KEYWORD;
pub use matchers::ParseOptions;
pub use parser::*;
pub use project::*;
pub use reporter::*;

pub mod config;
mod engine;
mod error;
mod locator;
pub mod matchers;
mod parser;
pub mod project;
mod reporter;
pub(crate) mod splitter;
pub mod warnings;
