use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finmath_core::rates::{self, RateConversionInput, RateDirection};

/// Arguments for a rate conversion
#[derive(Args)]
pub struct RateArgs {
    /// Rate to convert (periodic for annualize, annual for deannualize)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Decimal,

    /// Compounding periods per year
    #[arg(long, default_value_t = 12)]
    pub periods: u32,
}

pub fn run_annualize(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    convert(args, RateDirection::ToAnnual)
}

pub fn run_deannualize(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    convert(args, RateDirection::FromAnnual)
}

fn convert(args: RateArgs, direction: RateDirection) -> Result<Value, Box<dyn std::error::Error>> {
    let input = RateConversionInput {
        rate: args.rate,
        periods_per_year: args.periods,
        direction,
    };
    let result = rates::convert_rate(&input)?;
    Ok(serde_json::to_value(result)?)
}
