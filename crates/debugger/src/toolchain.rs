//! Compiling the program to debug.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::ToolchainError;

/// Disables optimisations and inlining so stepping follows the source.
const DEBUG_GCFLAGS: &str = "-gcflags=all=-N -l";

/// Produces debuggable binaries.
pub trait Toolchain {
    /// Build the program at `path`, returning the binary's path.
    fn build(&self, path: &Path) -> Result<PathBuf, ToolchainError>;

    /// Build the test binary for the package at `path`.
    fn test(&self, path: &Path) -> Result<PathBuf, ToolchainError>;

    /// Names of the test functions in `binary` matching `pattern`. An empty
    /// pattern lists every test.
    fn list_test_functions(&self, binary: &Path, pattern: &str) -> Result<Vec<String>, ToolchainError>;
}

/// The subset of `go list -json` output we use.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    pub import_path: String,
    pub dir: PathBuf,
    pub name: String,
}

pub struct GoToolchain {
    go: PathBuf,
    build_dir: PathBuf,
}

impl GoToolchain {
    /// Locate `go` on `PATH`. Binaries are written to `build_dir`.
    pub fn new(build_dir: impl Into<PathBuf>) -> Result<Self, ToolchainError> {
        let go = which::which("go").map_err(|_| ToolchainError::NotFound("go"))?;
        let build_dir = std::path::absolute(build_dir.into())?;
        std::fs::create_dir_all(&build_dir)?;
        Ok(Self { go, build_dir })
    }

    pub fn package_info(&self, path: &Path) -> Result<PackageInfo, ToolchainError> {
        let stdout = run(in_package(Command::new(&self.go).args(["list", "-json"]), path))?;
        parse_package_info(&stdout)
    }

    /// Like [`GoToolchain::package_info`], but fails unless the package is
    /// a `main` package.
    pub fn main_package(&self, path: &Path) -> Result<PackageInfo, ToolchainError> {
        let info = self.package_info(path)?;
        if info.name != "main" {
            return Err(ToolchainError::NotMain(info.import_path));
        }
        Ok(info)
    }
}

impl Toolchain for GoToolchain {
    #[tracing::instrument(skip(self))]
    fn build(&self, path: &Path) -> Result<PathBuf, ToolchainError> {
        let output = self.build_dir.join("dap-tui.bin");
        run(in_package(
            Command::new(&self.go)
                .args(["build", DEBUG_GCFLAGS, "-o"])
                .arg(&output),
            path,
        ))?;
        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    fn test(&self, path: &Path) -> Result<PathBuf, ToolchainError> {
        let output = self.build_dir.join("dap-tui.test");
        run(in_package(
            Command::new(&self.go)
                .args(["test", "-c", DEBUG_GCFLAGS, "-o"])
                .arg(&output),
            path,
        ))?;
        Ok(output)
    }

    fn list_test_functions(&self, binary: &Path, pattern: &str) -> Result<Vec<String>, ToolchainError> {
        let pattern = if pattern.is_empty() { ".*" } else { pattern };
        let stdout = run(Command::new(binary).args(["-test.list", pattern]))?;
        Ok(parse_test_list(&stdout))
    }
}

/// Function breakpoints stopping at the start of a program.
pub fn program_entry_breakpoints() -> Vec<String> {
    vec!["main.main".to_string()]
}

/// Function breakpoints stopping at the start of each test. Tests may live
/// in the package itself or in its external `_test` package, so both names
/// are requested; the adapter rejects the one that does not exist.
pub fn test_entry_breakpoints(import_path: &str, tests: &[String]) -> Vec<String> {
    tests
        .iter()
        .flat_map(|test| [format!("{import_path}.{test}"), format!("{import_path}_test.{test}")])
        .collect()
}

/// Point a go command at the package `path`. Filesystem paths run the
/// command from inside the package so module resolution works wherever the
/// package lives; anything else is passed through as an import path.
fn in_package<'a>(command: &'a mut Command, path: &Path) -> &'a mut Command {
    if path.as_os_str().is_empty() {
        return command.arg(".");
    }
    if path.is_dir() {
        return command.current_dir(path).arg(".");
    }
    if path.is_file() {
        if let (Some(dir), Some(name)) = (path.parent(), path.file_name()) {
            if !dir.as_os_str().is_empty() {
                return command.current_dir(dir).arg(name);
            }
        }
    }
    command.arg(path)
}

fn run(command: &mut Command) -> Result<String, ToolchainError> {
    let rendered = format!("{command:?}");
    tracing::debug!(command = %rendered, "running");
    let output = command.output()?;
    if !output.status.success() {
        return Err(ToolchainError::Failed {
            command: rendered,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_package_info(stdout: &str) -> Result<PackageInfo, ToolchainError> {
    serde_json::from_str(stdout).map_err(ToolchainError::PackageInfo)
}

fn parse_test_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("ok "))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_go_list_output() {
        let stdout = r#"{
            "Dir": "/home/me/proj/cmd/app",
            "ImportPath": "example.com/proj/cmd/app",
            "Name": "main",
            "GoFiles": ["main.go"]
        }"#;
        let info = parse_package_info(stdout).unwrap();
        assert_eq!(
            info,
            PackageInfo {
                import_path: "example.com/proj/cmd/app".to_string(),
                dir: PathBuf::from("/home/me/proj/cmd/app"),
                name: "main".to_string(),
            }
        );
    }

    #[test]
    fn bad_go_list_output() {
        assert!(matches!(
            parse_package_info("not json"),
            Err(ToolchainError::PackageInfo(_))
        ));
    }

    #[test]
    fn parses_test_list() {
        let names = parse_test_list("TestA\nTestB\n\nExampleC\n");
        assert_eq!(names, vec!["TestA", "TestB", "ExampleC"]);
    }

    #[test]
    fn test_breakpoints_cover_both_packages() {
        let names = test_entry_breakpoints("example.com/p", &["TestA".to_string()]);
        assert_eq!(names, vec!["example.com/p.TestA", "example.com/p_test.TestA"]);
    }

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn package_targets() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main\n").unwrap();

        let mut empty = Command::new("go");
        in_package(&mut empty, Path::new(""));
        assert_eq!(args(&empty), vec!["."]);

        let mut in_dir = Command::new("go");
        in_package(&mut in_dir, dir.path());
        assert_eq!(args(&in_dir), vec!["."]);
        assert_eq!(in_dir.get_current_dir(), Some(dir.path()));

        let mut single_file = Command::new("go");
        in_package(&mut single_file, &file);
        assert_eq!(args(&single_file), vec!["main.go"]);

        let mut import_path = Command::new("go");
        in_package(&mut import_path, Path::new("example.com/x/cmd"));
        assert_eq!(args(&import_path), vec!["example.com/x/cmd"]);
        assert_eq!(import_path.get_current_dir(), None);
    }

    #[test]
    fn failing_command_reports_stderr() {
        let err = run(Command::new("sh").args(["-c", "echo boom >&2; exit 3"])).unwrap_err();
        match err {
            ToolchainError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn successful_command_returns_stdout() {
        let out = run(Command::new("sh").args(["-c", "echo TestX"])).unwrap();
        assert_eq!(parse_test_list(&out), vec!["TestX"]);
    }
}
