use std::path::Path;

use assert_cmd::Command;
use genr_core::AnyEmptyResult;
use similar_asserts::assert_eq;

fn write_project(root: &Path) -> AnyEmptyResult {
	std::fs::create_dir_all(root.join("src"))?;
	std::fs::create_dir_all(root.join("genr-templates"))?;
	std::fs::write(
		root.join("genr-templates/greet.jinja"),
		"// Hello, {{ name }}!",
	)?;
	std::fs::write(
		root.join("src/main.rs"),
		"fn main() {}\n/*! expand greet\n * ---\n * name: World\n */\n/*! end */\n",
	)?;

	Ok(())
}

#[test]
fn run_expands_directives() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut cmd = Command::cargo_bin("genr")?;
	cmd.env("NO_COLOR", "1")
		.arg("run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Rewrote 1 file(s)"));

	let content = std::fs::read_to_string(tmp.path().join("src/main.rs"))?;
	assert!(content.contains("// Hello, World!\n"));

	Ok(())
}

#[test]
fn run_noop_when_in_sync() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut first = Command::cargo_bin("genr")?;
	first
		.env("NO_COLOR", "1")
		.arg("run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let synchronized = std::fs::read_to_string(tmp.path().join("src/main.rs"))?;

	let mut second = Command::cargo_bin("genr")?;
	second
		.env("NO_COLOR", "1")
		.arg("run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("src/main.rs"))?,
		synchronized
	);

	Ok(())
}

#[test]
fn run_dry_run_does_not_write() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	let original = std::fs::read_to_string(tmp.path().join("src/main.rs"))?;

	let mut cmd = Command::cargo_bin("genr")?;
	cmd.env("NO_COLOR", "1")
		.arg("run")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("would rewrite 1 file(s)"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("src/main.rs"))?,
		original
	);

	Ok(())
}

#[test]
fn run_prints_scanner_warnings() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("src"))?;
	std::fs::write(tmp.path().join("src/main.rs"), "/*! end */\nfn main() {}\n")?;

	let mut cmd = Command::cargo_bin("genr")?;
	cmd.env("NO_COLOR", "1")
		.arg("run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("no directive is currently open"));

	Ok(())
}

#[test]
fn run_fails_on_unterminated_directive() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("src"))?;
	let original = "/*! expand greet */\n// never closed\n";
	std::fs::write(tmp.path().join("src/main.rs"), original)?;

	let mut cmd = Command::cargo_bin("genr")?;
	cmd.env("NO_COLOR", "1")
		.arg("run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to process"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("src/main.rs"))?,
		original
	);

	Ok(())
}

#[test]
fn run_honors_pattern_override() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	let original = std::fs::read_to_string(tmp.path().join("src/main.rs"))?;

	// A pattern that matches nothing leaves the project alone.
	let mut cmd = Command::cargo_bin("genr")?;
	cmd.env("NO_COLOR", "1")
		.arg("run")
		.arg("--pattern")
		.arg("lib/**/*.rs")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("src/main.rs"))?,
		original
	);

	Ok(())
}

#[test]
fn version_flag_prints_version() -> AnyEmptyResult {
	let mut cmd = Command::cargo_bin("genr")?;
	cmd.arg("--version")
		.assert()
		.success()
		.stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));

	Ok(())
}
