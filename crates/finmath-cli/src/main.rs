mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::{debug, LevelFilter};
use std::process;

use finmath_core::error::{ErrorBody, ErrorEnvelope};
use finmath_core::FinmathError;

use commands::cet::{CetArgs, CetFullArgs};
use commands::irr::{IrrArgs, NpvArgs};
use commands::rates::RateArgs;

/// Decimal-precision IRR, NPV and CET calculations
#[derive(Parser)]
#[command(
    name = "finmath",
    version,
    about = "Decimal-precision IRR, NPV and CET calculations",
    long_about = "A CLI for internal rate of return and total effective cost (CET) \
                  calculations in 28-digit decimal arithmetic. Brent's method on an \
                  automatically expanded bracket, with bisection available as a fallback."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Net present value of periodic cash flows
    Npv(NpvArgs),
    /// Internal rate of return of periodic cash flows
    Irr(IrrArgs),
    /// Convert a periodic rate to its annual effective equivalent
    Annualize(RateArgs),
    /// Convert an annual effective rate to its periodic equivalent
    Deannualize(RateArgs),
    /// CET over a known installment schedule
    Cet(CetArgs),
    /// CET of a PRICE loan with fees, IOF and insurance
    CetFull(CetFullArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Npv(args) => commands::irr::run_npv(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Annualize(args) => commands::rates::run_annualize(args),
        Commands::Deannualize(args) => commands::rates::run_deannualize(args),
        Commands::Cet(args) => commands::cet::run_cet(args),
        Commands::CetFull(args) => commands::cet::run_cet_full(args),
        Commands::Version => {
            println!("finmath {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            let envelope = error_envelope(e.as_ref());
            debug!("command failed: {e}");
            match cli.output {
                OutputFormat::Table | OutputFormat::Minimal => {
                    eprintln!(
                        "{} [{}]: {}",
                        "error".red().bold(),
                        envelope.error.code,
                        envelope.error.message
                    );
                }
                OutputFormat::Json | OutputFormat::Csv => match serde_json::to_string(&envelope) {
                    Ok(s) => eprintln!("{}", s),
                    Err(_) => eprintln!("{}: {}", "error".red().bold(), e),
                },
            }
            process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Core errors keep their API code; anything else is a bad argument or request.
fn error_envelope(e: &(dyn std::error::Error + 'static)) -> ErrorEnvelope {
    if let Some(err) = e.downcast_ref::<FinmathError>() {
        return ErrorEnvelope::from(err);
    }
    ErrorEnvelope {
        error: ErrorBody {
            code: "VALIDATION_ERROR".into(),
            message: e.to_string(),
        },
    }
}
