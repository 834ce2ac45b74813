use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Expand comment-embedded templates in source files.",
	long_about = "genr scans source files for comment directives of the form `/*! expand \
	              <template> */ ... /*! end */` and keeps the region between the markers \
	              synchronized with the rendered template output.\n\nQuick start:\n  genr run    \
	              Expand every directive and rewrite changed files\n  genr check  Verify all \
	              generated regions are up to date"
)]
pub struct GenrCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Expand every directive and rewrite the files whose generated regions
	/// changed.
	///
	/// Files are scanned against the input pattern from `genr.toml` (or the
	/// built-in default), templates resolve from the configured templates
	/// directory, and each changed file is replaced atomically. Files that
	/// fail to scan are reported and left untouched.
	Run {
		/// Override the input glob pattern from the config file.
		#[arg(long)]
		pattern: Option<String>,

		/// Preview changes without writing files. Prints which files would be
		/// modified.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Check that every generated region is up to date.
	///
	/// Computes the expansion without writing anything and exits with a
	/// non-zero status when any file would change. Ideal for CI pipelines.
	Check {
		/// Show a unified diff for each out-of-date file.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Override the input glob pattern from the config file.
		#[arg(long)]
		pattern: Option<String>,
	},
}
