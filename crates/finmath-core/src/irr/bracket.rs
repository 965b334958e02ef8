//! Search-interval expansion for the IRR solvers.

use log::{debug, trace};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::npv::npv;
use crate::error::FinmathError;
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// Lowest rate the expansion will sample; `rate <= -1` is undefined.
pub const RATE_FLOOR: Decimal = dec!(-0.9999);

/// Highest rate the expansion will sample (100 000% per period).
pub const RATE_CEILING: Decimal = dec!(1000);

/// Default number of expansion attempts.
pub const DEFAULT_MAX_EXPANSIONS: u32 = 12;

/// Outcome of [`ensure_bracket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub lo: Rate,
    pub hi: Rate,
    /// NPV changes sign across `[lo, hi]` (or an endpoint is an exact root).
    pub bracketed: bool,
    /// Expansion steps consumed.
    pub expansions: u32,
}

/// Widen `[lo, hi]` until NPV changes sign across it.
///
/// Each step doubles a positive `hi` (capped at [`RATE_CEILING`]; a
/// non-positive `hi` jumps to 100%) and moves `lo` halfway
/// towards [`RATE_FLOOR`]. When NPV at `lo` does not fit a decimal, `lo` is
/// pulled halfway back towards zero instead and is not lowered again.
pub fn ensure_bracket(
    cash_flows: &[Money],
    lo: Rate,
    hi: Rate,
    max_expansions: u32,
) -> FinmathResult<Bracket> {
    if lo <= dec!(-1) {
        return Err(FinmathError::InvalidRate { rate: lo });
    }
    if lo >= hi {
        return Err(FinmathError::InvalidInput {
            field: "initial_bracket".into(),
            reason: format!("lower bound {lo} must be less than upper bound {hi}"),
        });
    }

    let mut lo = lo;
    let mut hi = hi;
    let mut lo_overflowed = false;
    let mut f_hi = npv(hi, cash_flows)?;
    let mut expansions = 0;

    loop {
        match npv(lo, cash_flows) {
            Ok(f_lo) => {
                if straddles(f_lo, f_hi) {
                    debug!("IRR bracket [{lo}, {hi}] found after {expansions} expansions");
                    return Ok(Bracket {
                        lo,
                        hi,
                        bracketed: true,
                        expansions,
                    });
                }
                if expansions >= max_expansions {
                    break;
                }
                if !lo_overflowed {
                    lo -= (lo - RATE_FLOOR) / dec!(2);
                }
            }
            Err(FinmathError::NumericOverflow { .. }) => {
                if expansions >= max_expansions {
                    break;
                }
                trace!("NPV at {lo} exceeds decimal range, raising lower bound");
                lo_overflowed = true;
                lo /= dec!(2);
            }
            Err(e) => return Err(e),
        }

        if hi < RATE_CEILING {
            hi = if hi > Decimal::ZERO {
                (hi * dec!(2)).min(RATE_CEILING)
            } else {
                Decimal::ONE
            };
            f_hi = npv(hi, cash_flows)?;
        }
        expansions += 1;
        trace!("expanding IRR bracket to [{lo}, {hi}] (step {expansions})");
    }

    debug!("no sign change across [{lo}, {hi}] after {expansions} expansions");
    Ok(Bracket {
        lo,
        hi,
        bracketed: false,
        expansions,
    })
}

fn straddles(f_lo: Money, f_hi: Money) -> bool {
    f_lo.is_zero() || f_hi.is_zero() || f_lo.is_sign_negative() != f_hi.is_sign_negative()
}
