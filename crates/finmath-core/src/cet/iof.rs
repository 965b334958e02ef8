use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinmathError;
use crate::types::Money;
use crate::FinmathResult;

/// Flat IOF charged on the principal (0.38%).
pub const IOF_FIXED_RATE: Decimal = dec!(0.0038);

/// Daily IOF factor on the principal.
pub const IOF_DAILY_RATE: Decimal = dec!(0.0000082);

/// Days of daily IOF are capped at one year.
pub const IOF_MAX_DAYS: u32 = 365;

/// IOF (financial operations tax) withheld from a loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IofBreakdown {
    pub fixed: Money,
    pub daily: Money,
    /// Days the daily rate was charged for
    pub days: u32,
    pub total: Money,
}

/// IOF for a loan of `principal` over `term_months` 30-day months.
pub fn calculate_iof(principal: Money, term_months: u32) -> FinmathResult<IofBreakdown> {
    if principal <= Decimal::ZERO {
        return Err(FinmathError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }

    let days = term_months.saturating_mul(30).min(IOF_MAX_DAYS);
    let fixed = principal * IOF_FIXED_RATE;
    let daily = principal * IOF_DAILY_RATE * Decimal::from(days);

    Ok(IofBreakdown {
        fixed,
        daily,
        days,
        total: fixed + daily,
    })
}
