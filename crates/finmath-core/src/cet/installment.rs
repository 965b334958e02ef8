use rust_decimal::{Decimal, MathematicalOps};

use crate::error::FinmathError;
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// Level PRICE (French amortization) installment.
///
/// `PV * i * (1 + i)^n / ((1 + i)^n - 1)`, or `PV / n` when `i` is zero.
pub fn price_installment(principal: Money, rate: Rate, n: u32) -> FinmathResult<Money> {
    if n == 0 {
        return Err(FinmathError::InvalidInput {
            field: "term_months".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate <= -Decimal::ONE {
        return Err(FinmathError::InvalidRate { rate });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let overflow = || FinmathError::NumericOverflow {
        context: format!("PRICE factor (1 + {rate})^{n}"),
    };
    let factor = (Decimal::ONE + rate)
        .checked_powu(u64::from(n))
        .ok_or_else(overflow)?;
    let annuity_factor = factor - Decimal::ONE;

    if annuity_factor.is_zero() {
        return Err(FinmathError::DivisionByZero {
            context: "PRICE annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(annuity_factor))
        .ok_or_else(overflow)
}
