//! # pigment
//!
//! Pigment - CSS `@value` preprocessing toolchain in Rust.
//!
//! ## Name Origin
//!
//! A **pigment** is the ground colour that every painted surface starts from.
//! Stylesheets name their colours and measures once with `@value`, and this
//! crate is the command-line gateway that resolves those names across a project.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "pigment")]
#[command(about = "CSS @value preprocessing toolchain in Rust", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),

    /// Print debug logs to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process stylesheets and write the output (default command)
    #[command(visible_alias = "atelier")]
    Build(commands::build::BuildArgs),

    /// Process stylesheets and report problems without writing
    Check(commands::check::CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Build(args)) => commands::build::run(args),
        Some(Commands::Check(args)) => commands::check::run(args),
        None => {
            // Default to build command with default args
            commands::build::run(commands::build::BuildArgs::default());
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}
