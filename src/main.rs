use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use scopeprint::commands::{self, OutputFormat};
use scopeprint::diagnostics;
use tracing_subscriber::EnvFilter;

/// Structural fingerprints for static-analysis warnings
#[derive(Parser)]
#[command(name = "scopeprint", version)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Fingerprint a list of warnings read from a JSON file
    Batch {
        /// JSON array of {file, category, line} records
        warnings: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the category to scope table
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fingerprint one warning
    Fingerprint {
        /// Source file the warning points into
        file: String,
        /// Category (check name) of the warning
        category: String,
        /// Reported line, 1-based (0 for the whole file)
        line: u32,
        /// Also print the canonical scope string
        #[arg(long)]
        canonical: bool,
    },
}

/// Install the fmt subscriber; `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    return;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Batch { warnings, format } => commands::batch(&warnings, format),
        Commands::Categories { json } => commands::categories(json).map(|()| return ExitCode::SUCCESS),
        Commands::Fingerprint { file, category, line, canonical } => {
            commands::fingerprint(&file, &category, line, canonical).map(|()| return ExitCode::SUCCESS)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}
