use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finmath_core::cet::{self, CetBasicInput, CetFullInput, Insurance};

use crate::input;

/// Arguments for a CET over a known installment schedule
#[derive(Args)]
pub struct CetArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Credit released to the borrower
    #[arg(long)]
    pub pv: Option<Decimal>,

    /// Installment schedule (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub schedule: Option<Vec<Decimal>>,

    /// Level installment, used with --n instead of --schedule
    #[arg(long)]
    pub pmt: Option<Decimal>,

    /// Number of level installments
    #[arg(long)]
    pub n: Option<u32>,

    /// Fees charged at t=0 (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub fees: Option<Vec<Decimal>>,

    /// Periods per year used to annualize
    #[arg(long, default_value_t = 12)]
    pub base_annual: u32,
}

pub fn run_cet(args: CetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cet_input: CetBasicInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_json()? {
        request
    } else {
        CetBasicInput {
            pv: args.pv.ok_or("--pv is required (or provide --input)")?,
            schedule: args.schedule.unwrap_or_default(),
            pmt: args.pmt,
            n: args.n,
            fees_t0: args.fees.unwrap_or_default(),
            base_annual: args.base_annual,
        }
    };

    let result = cet::calculate_cet_basic(&cet_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a CET computed from the loan terms
#[derive(Args)]
pub struct CetFullArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Contract monthly rate (e.g. 0.02)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub months: Option<u32>,

    /// Registration fee deducted at release
    #[arg(long)]
    pub registration_fee: Option<Decimal>,

    /// Appraisal fee deducted at release
    #[arg(long)]
    pub appraisal_fee: Option<Decimal>,

    /// Fixed monthly insurance
    #[arg(long, conflicts_with = "insurance_rate")]
    pub insurance_monthly: Option<Decimal>,

    /// Insurance premium as a share of the principal
    #[arg(long)]
    pub insurance_rate: Option<Decimal>,

    /// Withhold IOF from the released amount
    #[arg(long)]
    pub iof: bool,
}

pub fn run_cet_full(args: CetFullArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cet_input: CetFullInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_json()? {
        request
    } else {
        let insurance = match (args.insurance_monthly, args.insurance_rate) {
            (Some(monthly), _) => Some(Insurance::Fixed { monthly }),
            (None, Some(rate)) => Some(Insurance::PercentOfPrincipal { rate }),
            (None, None) => None,
        };
        CetFullInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            nominal_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args.months.ok_or("--months is required (or provide --input)")?,
            registration_fee: args.registration_fee,
            appraisal_fee: args.appraisal_fee,
            insurance,
            include_iof: args.iof,
        }
    };

    let result = cet::calculate_cet_full(&cet_input)?;
    Ok(serde_json::to_value(result)?)
}
