//! Conversions between periodic and annual effective rates.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinmathError;
use crate::types::{round_half_up, with_metadata, ComputationOutput, Rate};
use crate::FinmathResult;

const ROOT_ITERATIONS: u32 = 100;
const ROOT_EPSILON: Decimal = dec!(0.0000000000000000000001);

/// Compound a periodic rate over a year: `(1 + r)^k - 1`.
///
/// ```
/// use finmath_core::rates::convert_to_annual;
/// use rust_decimal_macros::dec;
///
/// let annual = convert_to_annual(dec!(0.01), 12).unwrap();
/// assert!((annual - dec!(0.12682503013196972)).abs() < dec!(0.0000000001));
/// ```
pub fn convert_to_annual(periodic_rate: Rate, periods_per_year: u32) -> FinmathResult<Rate> {
    validate(periodic_rate, periods_per_year)?;

    let factor = (Decimal::ONE + periodic_rate)
        .checked_powu(u64::from(periods_per_year))
        .ok_or_else(|| FinmathError::NumericOverflow {
            context: format!("(1 + {periodic_rate})^{periods_per_year}"),
        })?;
    Ok(factor - Decimal::ONE)
}

/// Periodic rate equivalent to an annual effective rate: `(1 + R)^(1/k) - 1`.
pub fn convert_from_annual(annual_rate: Rate, periods_per_year: u32) -> FinmathResult<Rate> {
    validate(annual_rate, periods_per_year)?;

    if periods_per_year == 1 {
        return Ok(annual_rate);
    }
    let root = nth_root(Decimal::ONE + annual_rate, periods_per_year)?;
    Ok(root - Decimal::ONE)
}

/// Render a rate as a percentage string, rounded half-up: `0.33674` -> `"33.67%"`.
pub fn format_percent(rate: Rate, decimals: u32) -> String {
    let pct = round_half_up(rate * dec!(100), decimals);
    format!("{pct:.prec$}%", prec = decimals as usize)
}

fn default_periods_per_year() -> u32 {
    12
}

/// Which way a rate is converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateDirection {
    /// Periodic rate in, annual rate out
    #[default]
    #[serde(rename = "to_annual")]
    ToAnnual,
    /// Annual rate in, periodic rate out
    #[serde(rename = "from_annual")]
    FromAnnual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConversionInput {
    pub rate: Rate,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    #[serde(default)]
    pub direction: RateDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConversionOutput {
    pub periodic_rate: Rate,
    pub annual_rate: Rate,
    pub periods_per_year: u32,
    pub periodic_percent: String,
    pub annual_percent: String,
}

/// Convert in the requested direction and report both sides of the pair.
pub fn convert_rate(
    input: &RateConversionInput,
) -> FinmathResult<ComputationOutput<RateConversionOutput>> {
    let start = Instant::now();
    let k = input.periods_per_year;

    let (periodic_rate, annual_rate) = match input.direction {
        RateDirection::ToAnnual => (input.rate, convert_to_annual(input.rate, k)?),
        RateDirection::FromAnnual => (convert_from_annual(input.rate, k)?, input.rate),
    };

    let output = RateConversionOutput {
        periodic_rate,
        annual_rate,
        periods_per_year: k,
        periodic_percent: format_percent(periodic_rate, 4),
        annual_percent: format_percent(annual_rate, 2),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Effective rate equivalence: (1 + periodic)^k = 1 + annual",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}

fn validate(rate: Rate, periods_per_year: u32) -> FinmathResult<()> {
    if periods_per_year == 0 {
        return Err(FinmathError::InvalidInput {
            field: "periods_per_year".into(),
            reason: "Must be at least 1".into(),
        });
    }
    if rate <= dec!(-1) {
        return Err(FinmathError::InvalidRate { rate });
    }
    Ok(())
}

/// k-th root of a positive decimal via Newton's method.
fn nth_root(x: Decimal, k: u32) -> FinmathResult<Decimal> {
    let k_dec = Decimal::from(k);
    let overflow = || FinmathError::NumericOverflow {
        context: format!("{k}-th root of {x}"),
    };

    // Seed from the approximate power; 1 + (x - 1)/k bounds the root from above
    let mut guess = match x.checked_powd(Decimal::ONE / k_dec) {
        Some(seed) if seed > Decimal::ZERO => seed,
        _ => Decimal::ONE + (x - Decimal::ONE) / k_dec,
    };
    for _ in 0..ROOT_ITERATIONS {
        let g_pow = guess.checked_powu(u64::from(k - 1)).ok_or_else(overflow)?;
        if g_pow.is_zero() {
            return Err(FinmathError::DivisionByZero {
                context: format!("{k}-th root iteration"),
            });
        }
        let next = (k_dec - Decimal::ONE)
            .checked_mul(guess)
            .zip(x.checked_div(g_pow))
            .and_then(|(scaled, quotient)| scaled.checked_add(quotient))
            .ok_or_else(overflow)?
            / k_dec;
        if (next - guess).abs() < ROOT_EPSILON {
            return Ok(next);
        }
        guess = next;
    }
    Ok(guess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_to_annual() {
        // 2% a month is 26.824% a year
        let annual = convert_to_annual(dec!(0.02), 12).unwrap();
        assert!((annual - dec!(0.2682417945625)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_annualization_identity() {
        for (r, k) in [(dec!(0.015), 12), (dec!(-0.01), 12), (dec!(0.05), 4), (dec!(0.3), 1)] {
            let annual = convert_to_annual(r, k).unwrap();
            let expected = (Decimal::ONE + r).powu(u64::from(k)) - Decimal::ONE;
            assert_eq!(annual, expected);
        }
    }

    #[test]
    fn test_annual_to_monthly_round_trip() {
        for r in [dec!(0.025), dec!(0.0001), dec!(-0.02), dec!(0.5)] {
            let annual = convert_to_annual(r, 12).unwrap();
            let back = convert_from_annual(annual, 12).unwrap();
            assert!((back - r).abs() < dec!(0.0000000000001), "{r} -> {annual} -> {back}");
        }
    }

    #[test]
    fn test_from_annual_known_value() {
        // 12% a year is 0.9489% a month
        let monthly = convert_from_annual(dec!(0.12), 12).unwrap();
        assert!((monthly - dec!(0.00948879293)).abs() < dec!(0.0000000001));
        assert_eq!(convert_from_annual(dec!(0.12), 1).unwrap(), dec!(0.12));
    }

    #[test]
    fn test_from_annual_large_rate() {
        // 1000000 = 100000000% a year
        let monthly = convert_from_annual(dec!(1000000), 12).unwrap();
        assert!(monthly > dec!(2.16) && monthly < dec!(2.17), "got {monthly}");
        let back = convert_to_annual(monthly, 12).unwrap();
        assert!((back - dec!(1000000)).abs() < dec!(0.0001), "got {back}");

        let daily = convert_from_annual(dec!(1000000), 365).unwrap();
        let back = convert_to_annual(daily, 365).unwrap();
        assert!((back - dec!(1000000)).abs() / dec!(1000000) < dec!(0.0000000001));
    }

    #[test]
    fn test_zero_periods_rejected() {
        assert!(matches!(
            convert_to_annual(dec!(0.01), 0),
            Err(FinmathError::InvalidInput { .. })
        ));
        assert!(matches!(
            convert_from_annual(dec!(0.12), 0),
            Err(FinmathError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rate_at_minus_one_rejected() {
        assert!(matches!(
            convert_to_annual(dec!(-1), 12),
            Err(FinmathError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_convert_rate_both_directions() {
        let to_annual = convert_rate(&RateConversionInput {
            rate: dec!(0.02),
            periods_per_year: 12,
            direction: RateDirection::ToAnnual,
        })
        .unwrap();
        assert_eq!(to_annual.result.annual_percent, "26.82%");
        assert_eq!(to_annual.result.periodic_percent, "2.0000%");

        let req: RateConversionInput =
            serde_json::from_str(r#"{"rate": "0.12", "direction": "from_annual"}"#).unwrap();
        let from_annual = convert_rate(&req).unwrap();
        assert_eq!(from_annual.result.periods_per_year, 12);
        assert_eq!(from_annual.result.annual_rate, dec!(0.12));
        assert_eq!(from_annual.result.periodic_percent, "0.9489%");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(0.33674), 2), "33.67%");
        assert_eq!(format_percent(dec!(0.123456), 3), "12.346%");
        assert_eq!(format_percent(dec!(0.00125), 1), "0.1%");
        assert_eq!(format_percent(dec!(0.5), 0), "50%");
    }
}
