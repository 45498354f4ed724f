use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tabtoss::commands::console::ConsoleArgs;
use tabtoss::commands::doctor::DoctorArgs;
use tabtoss::commands::init::InitArgs;
use tabtoss::commands::run::RunArgs;
use tabtoss::{commands, error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "tabtoss",
    version,
    about = "Chat bot that keeps a list of names and tosses for who pays the bill"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the Telegram bot (long polling until Ctrl-C)
    Run(RunArgs),
    /// Talk to the bot on stdin/stdout
    Console(ConsoleArgs),
    /// Write a commented tabtoss.toml
    Init(InitArgs),
    /// Validate config, replies, state dir and token
    Doctor(DoctorArgs),
    /// Print the JSON Schema for tabtoss.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Console(_) => "console",
            Self::Init(_) => "init",
            Self::Doctor(_) => "doctor",
            Self::Schema => "schema",
        }
    }

    const fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Run(_) => "info",
            _ => "warn",
        }
    }
}

fn main() -> ExitCode {
    // .env is optional; a real environment variable wins over it. Loaded
    // before logging so it can set RUST_LOG, reported once logging is up.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init(cli.command.default_log_filter());
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("ignoring .env: {e}");
        }
    }

    let _span = tracing::info_span!("cli", command = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Run(args) => args.execute(),
        Commands::Console(args) => args.execute(),
        Commands::Init(args) => args.execute(),
        Commands::Doctor(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
