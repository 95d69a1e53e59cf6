use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, Context};
use debugger::{
    FetchLimits, GoToolchain, LaunchRequest, TcpDapBackend, Toolchain, program_entry_breakpoints,
    test_entry_breakpoints,
};
use fuzzy::NucleoMatcher;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::Config;
use crate::picker::Picker;
use crate::terminal::TerminalGuard;

mod app;
mod config;
mod input;
mod inspector;
mod picker;
mod reactor;
mod source;
mod terminal;

/// Terminal debugger for Go programs.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the main package at PATH and debug it.
    Debug {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Arguments passed to the program.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Build the tests of the package at PATH and debug them.
    Test {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Only run tests matching this regular expression.
        regex: Option<String>,
    },
    /// Debug an already compiled binary.
    Exec { binary: PathBuf },
}

/// What to launch, and where the file picker starts.
struct Target {
    request: LaunchRequest,
    root: PathBuf,
}

fn prepare(command: Command, config: &Config) -> eyre::Result<Target> {
    match command {
        Command::Debug { path, args } => {
            let toolchain = GoToolchain::new(&config.build_dir).context("setting up go")?;
            let package = toolchain
                .main_package(&path)
                .with_context(|| format!("inspecting package {}", path.display()))?;
            let program = toolchain.build(&path).context("building program")?;
            Ok(Target {
                request: LaunchRequest {
                    program,
                    args,
                    cwd: Some(package.dir.clone()),
                    entry_breakpoints: program_entry_breakpoints(),
                },
                root: package.dir,
            })
        }
        Command::Test { path, regex } => {
            let toolchain = GoToolchain::new(&config.build_dir).context("setting up go")?;
            let package = toolchain
                .package_info(&path)
                .with_context(|| format!("inspecting package {}", path.display()))?;
            let program = toolchain.test(&path).context("building tests")?;
            let pattern = regex.unwrap_or_default();
            let tests = toolchain
                .list_test_functions(&program, &pattern)
                .context("listing tests")?;
            eyre::ensure!(!tests.is_empty(), "no tests match {pattern:?}");
            tracing::debug!(?tests, "debugging tests");
            let args = if pattern.is_empty() {
                Vec::new()
            } else {
                vec!["-test.run".to_string(), pattern]
            };
            Ok(Target {
                request: LaunchRequest {
                    program,
                    args,
                    cwd: Some(package.dir.clone()),
                    entry_breakpoints: test_entry_breakpoints(&package.import_path, &tests),
                },
                root: package.dir,
            })
        }
        Command::Exec { binary } => {
            let program = std::path::absolute(&binary)
                .with_context(|| format!("resolving {}", binary.display()))?;
            eyre::ensure!(program.is_file(), "{} is not a file", program.display());
            let root = program
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok(Target {
                request: LaunchRequest {
                    program,
                    args: Vec::new(),
                    cwd: Some(root.clone()),
                    entry_breakpoints: program_entry_breakpoints(),
                },
                root,
            })
        }
    }
}

fn init_logging(path: &Path) -> eyre::Result<WorkerGuard> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    terminal::install_panic_hook();

    let args = Args::parse();
    let config = Config::load().context("loading configuration")?;
    let _log_guard = init_logging(&config.log_file)?;
    tracing::debug!(?args, "starting");

    let target = prepare(args.command, &config)?;
    let limits = FetchLimits {
        depth: config.variable_depth,
        max_children: config.max_children,
    };
    let backend = TcpDapBackend::start(config.dap_port, &target.request, limits)
        .context("starting debugger")?;
    tracing::debug!("debugger started");

    let picker = Picker::new(
        fuzzy::scan(&target.root),
        Box::new(NucleoMatcher::default()),
        config.preview_cache_capacity,
    );

    let (width, height) = terminal::size().context("querying terminal")?;
    let _terminal = TerminalGuard::enter().context("setting up terminal")?;
    let mut app = App::new(backend, picker, width, height);
    app.start();
    reactor::run(&mut app)
}
