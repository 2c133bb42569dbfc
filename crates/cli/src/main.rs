// crosstally CLI — parameter-driven two-source reconciliation.

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Error carrying its exit code; message goes to stderr.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
}

#[derive(Parser)]
#[command(name = "crosstally")]
#[command(about = "Reconcile two tabular datasets by key and rule set")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation from a parameter file
    #[command(after_help = "\
Examples:
  crosstally run recon.toml --left deposits.csv --right billing.csv
  crosstally run plan.json --left count.csv --right master.csv --out-dir reports
  crosstally run recon.toml --left a.csv --right b.csv --json")]
    Run {
        /// Parameter file (.toml, or .json as emitted by a planner)
        params: PathBuf,

        /// Left-side CSV input
        #[arg(long)]
        left: PathBuf,

        /// Right-side CSV input
        #[arg(long)]
        right: PathBuf,

        /// Directory for per-bucket CSV output
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a parameter file without running
    #[command(after_help = "\
Examples:
  crosstally validate recon.toml")]
    Validate {
        /// Parameter file to check
        params: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            params,
            left,
            right,
            out_dir,
            json,
        } => run::cmd_run(params, left, right, out_dir, json),
        Commands::Validate { params } => run::cmd_validate(params),
    };

    match outcome {
        Ok(()) => ExitCode::from(exit_codes::EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            ExitCode::from(err.code)
        }
    }
}
