use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finmath_core::irr::analysis::{self, IrrInput, NpvInput};

use crate::input;

/// Arguments for an NPV evaluation
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic discount rate (e.g. 0.01 for 1% per period)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Periodic cash flows, t = 0 first (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let npv_input: NpvInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_json()? {
        request
    } else {
        NpvInput {
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
        }
    };

    let result = analysis::calculate_npv(&npv_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for an IRR solve
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows, t = 0 first (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Rate hint used to narrow the search interval
    #[arg(long, allow_hyphen_values = true)]
    pub guess: Option<Decimal>,

    /// Convergence tolerance on |NPV| and interval width
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Iteration budget
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Solve with bisection instead of Brent
    #[arg(long)]
    pub bisection: bool,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut irr_input: IrrInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_json()? {
        request
    } else {
        IrrInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            initial_guess: None,
            max_iterations: None,
            tolerance: None,
            force_bisection: false,
        }
    };

    // Flags refine whatever the JSON carried
    if args.guess.is_some() {
        irr_input.initial_guess = args.guess;
    }
    if args.tolerance.is_some() {
        irr_input.tolerance = args.tolerance;
    }
    if args.max_iterations.is_some() {
        irr_input.max_iterations = args.max_iterations;
    }
    irr_input.force_bisection |= args.bisection;

    let result = analysis::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
