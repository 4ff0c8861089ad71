//! nimptool - Nimrod portal host helper
//!
//! The entry point shelled out to by the portal, handling:
//! - Process liveness checks (`checkprocess`, `checkpidfile`)
//! - Group-derived storage paths (`getdirs`)
//! - Account group classification (`getacct`)
//!
//! Results go to stdout; diagnostics go to stderr; the exit code is the
//! only machine-readable failure signal.

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use nimp_common::Error;
use nimp_core::commands;
use nimp_core::exit_codes::ExitCode;
use nimp_core::logging::{init_logging, LogConfig, LogFormat};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

/// Nimrod portal host helper - storage policy and process liveness probe
#[derive(Parser)]
#[command(name = "nimptool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable logging entirely (errors are still reported)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true, default_value = "human")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether each pid is alive, as CSV
    #[command(name = "checkprocess")]
    CheckProcess(CheckProcessArgs),

    /// Report whether each pid listed in a file is alive, as CSV
    #[command(name = "checkpidfile")]
    CheckPidFile(CheckPidFileArgs),

    /// Print the paths the invoking user may browse
    #[command(name = "getdirs")]
    GetDirs,

    /// Print the account groups of the invoking user
    #[command(name = "getacct")]
    GetAcct,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct CheckProcessArgs {
    /// Omit the `pid,alive` header line
    #[arg(long)]
    no_header: bool,

    /// Decimal pids, each at most 65535
    #[arg(value_name = "PID")]
    pids: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckPidFileArgs {
    /// Omit the `pid,alive` header line
    #[arg(long)]
    no_header: bool,

    /// File of whitespace-separated pids
    path: PathBuf,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::InvalidSubcommand
            | ErrorKind::MissingSubcommand
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print_usage();
                std::process::exit(ExitCode::Usage.as_i32());
            }
            ErrorKind::UnknownArgument if !names_command(std::env::args_os().skip(1)) => {
                print_usage();
                std::process::exit(ExitCode::Usage.as_i32());
            }
            // Help and version exit 0 on stdout; argument errors exit 2 on stderr.
            _ => err.exit(),
        },
    };

    init_logging(&LogConfig::from_flags(
        cli.global.verbose,
        cli.global.quiet,
        cli.global.log_format,
    ));

    let exit_code = match cli.command {
        None => {
            print_usage();
            ExitCode::Usage
        }
        Some(Commands::CheckProcess(args)) => run_checkprocess(&args),
        Some(Commands::CheckPidFile(args)) => run_checkpidfile(&args),
        Some(Commands::GetDirs) => run_getdirs(),
        Some(Commands::GetAcct) => run_getacct(),
    };

    debug!(exit_code = %exit_code, "exiting");
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_checkprocess(args: &CheckProcessArgs) -> ExitCode {
    debug!(pids = args.pids.len(), header = !args.no_header, "checkprocess");
    match commands::checkprocess(&args.pids, !args.no_header, io::stdout().lock()) {
        Ok(_) => ExitCode::Success,
        Err(e) => report_error("checkprocess", &e),
    }
}

fn run_checkpidfile(args: &CheckPidFileArgs) -> ExitCode {
    debug!(path = %args.path.display(), header = !args.no_header, "checkpidfile");
    match commands::checkpidfile(&args.path, !args.no_header, io::stdout().lock()) {
        Ok(_) => ExitCode::Success,
        Err(e) => report_error("checkpidfile", &e),
    }
}

fn run_getdirs() -> ExitCode {
    match commands::getdirs(io::stdout().lock()) {
        Ok(_) => ExitCode::Success,
        Err(e) => report_error("getdirs", &e),
    }
}

fn run_getacct() -> ExitCode {
    match commands::getacct(io::stdout().lock()) {
        Ok(_) => ExitCode::Success,
        Err(e) => report_error("getacct", &e),
    }
}

/// Print a human-readable error on stderr and pick the exit code.
fn report_error(command: &str, error: &Error) -> ExitCode {
    let code = ExitCode::from(error);
    debug!(command, category = %error.category(), code = %code, "command failed");
    eprintln!("nimptool {}: {}", command, error);
    code
}

/// Whether any argument is a command name, so an unknown flag belongs to
/// that command rather than to the top level.
fn names_command<I: IntoIterator<Item = OsString>>(args: I) -> bool {
    let cli = Cli::command();
    args.into_iter()
        .any(|arg| cli.get_subcommands().any(|sub| arg == sub.get_name()))
}

fn print_usage() {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "{}", Cli::command().render_help());
    let _ = stdout.flush();
}
