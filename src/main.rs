//! hoststrap - debootstrap a new system offline from the host's own packages.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use hoststrap::commands::{self, BuildOptions};
use hoststrap::config::Config;

const PROG: &str = "hoststrap";

#[derive(Parser)]
#[command(name = PROG)]
#[command(version, about = "Bootstrap a Debian system from the packages installed on this host")]
struct Cli {
    /// Target directory (must not exist or be empty)
    target: PathBuf,

    /// Additional packages to install (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "PKG,...")]
    include: Vec<String>,

    /// Allow running without root, using fakeroot and fakechroot
    #[arg(long)]
    unprivileged: bool,

    /// Only resolve and print the package set
    #[arg(long)]
    dry_run: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();
    if cli.verbose > 1 {
        config.print();
    }

    let include: Vec<String> = cli
        .include
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if cli.dry_run {
        commands::cmd_resolve(&include, &config)?;
        return Ok(());
    }

    let opts = BuildOptions {
        target: cli.target,
        include,
        unprivileged: cli.unprivileged,
    };
    commands::cmd_build(&opts, &config)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: error: {}", PROG, e);
            ExitCode::FAILURE
        }
    }
}
