pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "fretado",
    about = "Fretado operator CLI",
    long_about = "Operate the freight price validation service: migrations, demo seeds, \
                  offline CT-e validation, and readiness checks.",
    after_help = "Examples:\n  fretado migrate\n  fretado seed\n  fretado validate --file cte.xml\n  fretado doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo dataset into the configured database")]
    Seed,
    #[command(about = "Validate one CT-e file (raw XML or base64 blob) against the price table")]
    Validate {
        #[arg(long, help = "Path to the document file")]
        file: PathBuf,
        #[arg(long, help = "Reference date for the tariff window (YYYY-MM-DD, default today)")]
        date: Option<String>,
    },
    #[command(about = "Validate config and database connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Validate { file, date } => commands::validate::run(&file, date.as_deref()),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
