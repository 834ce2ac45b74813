use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use genr_cli::Commands;
use genr_cli::GenrCli;
use genr_core::BufferedReporter;
use genr_core::BufferedWarning;
use genr_core::GenrConfig;
use genr_core::ProjectOutcome;
use genr_core::TemplateLocator;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = GenrCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose);

	let result = match &args.command {
		Some(Commands::Run { pattern, dry_run }) => {
			run_sync(&args, pattern.clone(), *dry_run)
		}
		Some(Commands::Check { diff, pattern }) => run_check(&args, *diff, pattern.clone()),
		// A bare `genr` invocation expands the whole project.
		None => run_sync(&args, None, false),
	};

	if let Err(e) = result {
		match e.downcast::<genr_core::GenrError>() {
			Ok(genr_err) => {
				let report: miette::Report = (*genr_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool) {
	let default_directive = if verbose { "genr=debug" } else { "genr=warn" };
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn resolve_root(args: &GenrCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

struct Workspace {
	root: PathBuf,
	config: GenrConfig,
	locator: TemplateLocator,
	reporter: Arc<BufferedReporter>,
}

fn prepare(args: &GenrCli, pattern: Option<String>) -> Result<Workspace, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let mut config = GenrConfig::load(&root)?;
	if let Some(pattern) = pattern {
		config.input_pattern = pattern;
	}

	let reporter = Arc::new(BufferedReporter::new());
	let locator = TemplateLocator::new(Some(root.join(&config.templates_dir)), reporter.clone());
	locator.bootstrap()?;

	Ok(Workspace {
		root,
		config,
		locator,
		reporter,
	})
}

fn run_sync(
	args: &GenrCli,
	pattern: Option<String>,
	dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let workspace = prepare(args, pattern)?;
	let outcome = genr_core::run(
		&workspace.root,
		&workspace.config,
		&workspace.locator,
		workspace.reporter.as_ref(),
		dry_run,
	)?;

	print_warnings(&workspace.reporter.take_all(), &workspace.root);

	if args.verbose {
		for file in &outcome.files {
			let rel = make_relative(&file.path, &workspace.root);
			let status = if file.changed { "updated" } else { "unchanged" };
			println!("  {rel} [{status}]");
		}
	}

	let changed = outcome.changed_count();
	if dry_run {
		if changed == 0 {
			println!("Dry run: every generated region is already up to date.");
		} else {
			println!("Dry run: would rewrite {changed} file(s):");
			for file in outcome.files.iter().filter(|file| file.changed) {
				println!("  {}", make_relative(&file.path, &workspace.root));
			}
		}
	} else if changed == 0 {
		println!("Every generated region is already up to date.");
	} else {
		println!("Rewrote {changed} file(s).");
	}

	finish(&outcome)
}

fn run_check(
	args: &GenrCli,
	show_diff: bool,
	pattern: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
	let workspace = prepare(args, pattern)?;
	let outcome = genr_core::run(
		&workspace.root,
		&workspace.config,
		&workspace.locator,
		workspace.reporter.as_ref(),
		true,
	)?;

	print_warnings(&workspace.reporter.take_all(), &workspace.root);

	let stale: Vec<_> = outcome.files.iter().filter(|file| file.changed).collect();

	if stale.is_empty() && outcome.is_ok() {
		println!("Check passed: every generated region is up to date.");
		return Ok(());
	}

	if !stale.is_empty() {
		eprintln!("Check failed: {} file(s) are out of date:", stale.len());
		for file in &stale {
			eprintln!("  {}", make_relative(&file.path, &workspace.root));
			if show_diff {
				print_diff(&file.original, &file.updated);
			}
		}
		eprintln!("Run `genr run` to fix.");
	}

	finish(&outcome)?;
	if !stale.is_empty() {
		process::exit(1);
	}

	Ok(())
}

/// Convert per-file failures into a process-level error.
fn finish(outcome: &ProjectOutcome) -> Result<(), Box<dyn std::error::Error>> {
	if outcome.is_ok() {
		return Ok(());
	}

	Err(format!("{} file(s) failed to process", outcome.failed.len()).into())
}

/// Print buffered scanner warnings with a source-line gutter and a caret
/// under the offending column, when known.
fn print_warnings(warnings: &[BufferedWarning], root: &Path) {
	for warning in warnings {
		let rel = make_relative(&warning.file_path, root);
		let location = match warning.line_index {
			Some(index) => format!("{rel}:{}", index + 1),
			None => rel,
		};

		let mut lines = warning.entry.message.lines();
		if let Some(first) = lines.next() {
			eprintln!("{} [{location}] {first}", colored!("warning:", yellow));
		}
		for rest in lines {
			eprintln!("         {rest}");
		}

		if let (Some(index), Some(line)) = (warning.line_index, &warning.line) {
			let gutter = format!("  L{}: ", index + 1);
			eprintln!("{gutter}{line}");
			if let Some(column) = warning.entry.index {
				eprintln!("{}{}", " ".repeat(gutter.len() + column), colored!("^", yellow));
			}
		}

		if let Some(error) = &warning.entry.error {
			eprintln!("         caused by: {error}");
		}
	}
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
