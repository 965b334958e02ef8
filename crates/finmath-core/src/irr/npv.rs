//! Net present value and sign analysis of periodic cash-flow series.
//!
//! For a loan modelled as `CF[0] > 0` (proceeds) and `CF[t] < 0`
//! (installments), NPV increases with the rate: below the IRR it is
//! negative, above the IRR it is positive.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::FinmathError;
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// Net Present Value: `Σ CF[t] / (1 + rate)^t`, `t = 0..N-1`.
///
/// Non-negative rates divide by a growing discount factor; once that factor
/// leaves the decimal range the remaining terms are below decimal resolution
/// and are dropped. Negative rates multiply by `v^t` with `v = 1 / (1 + rate)`
/// so the small factors keep their significant digits; a sum that no longer
/// fits a decimal is reported as [`FinmathError::NumericOverflow`].
pub fn npv(rate: Rate, cash_flows: &[Money]) -> FinmathResult<Money> {
    if cash_flows.is_empty() {
        return Err(FinmathError::EmptyCashFlows);
    }
    if rate <= dec!(-1) {
        return Err(FinmathError::InvalidRate { rate });
    }

    let one_plus_r = Decimal::ONE + rate;
    if rate >= Decimal::ZERO {
        npv_discounting(one_plus_r, cash_flows)
    } else {
        npv_compounding(one_plus_r, cash_flows, rate)
    }
}

fn npv_discounting(one_plus_r: Decimal, cash_flows: &[Money]) -> FinmathResult<Money> {
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                None => break,
            };
        }
        let term = cf.checked_div(discount).ok_or_else(|| FinmathError::DivisionByZero {
            context: format!("NPV discount factor at period {t}"),
        })?;
        result = result
            .checked_add(term)
            .ok_or_else(|| overflow(format!("NPV sum at period {t}")))?;
    }

    Ok(result)
}

fn npv_compounding(one_plus_r: Decimal, cash_flows: &[Money], rate: Rate) -> FinmathResult<Money> {
    let v = Decimal::ONE
        .checked_div(one_plus_r)
        .ok_or_else(|| overflow(format!("NPV inverse discount factor at rate {rate}")))?;

    let mut result = Decimal::ZERO;
    let mut factor = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            factor = factor
                .checked_mul(v)
                .ok_or_else(|| overflow(format!("NPV factor at period {t}, rate {rate}")))?;
        }
        if cf.is_zero() {
            continue;
        }
        let term = cf
            .checked_mul(factor)
            .ok_or_else(|| overflow(format!("NPV term at period {t}, rate {rate}")))?;
        result = result
            .checked_add(term)
            .ok_or_else(|| overflow(format!("NPV sum at period {t}, rate {rate}")))?;
    }

    Ok(result)
}

fn overflow(context: String) -> FinmathError {
    FinmathError::NumericOverflow { context }
}

/// Number of sign changes, ignoring zero flows.
///
/// More than one change means more than one real IRR is possible
/// (Descartes' rule of signs); it does not guarantee it.
pub fn count_sign_changes(cash_flows: &[Money]) -> usize {
    let mut changes = 0;
    let mut prev_negative: Option<bool> = None;

    for cf in cash_flows.iter().filter(|cf| !cf.is_zero()) {
        let negative = cf.is_sign_negative();
        if let Some(prev) = prev_negative {
            if prev != negative {
                changes += 1;
            }
        }
        prev_negative = Some(negative);
    }

    changes
}

/// Whether the series changes sign at least once, ignoring zero flows.
pub fn has_sign_change(cash_flows: &[Money]) -> bool {
    count_sign_changes(cash_flows) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(Decimal::ZERO, &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_npv_negative_rate() {
        // 1/(1-0.5) = 2, so NPV = 10 - 3*2 - 1*4 = 0
        let cfs = vec![dec!(10), dec!(-3), dec!(-1)];
        assert_eq!(npv(dec!(-0.5), &cfs).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(110)];
        assert!(matches!(
            npv(dec!(-1), &cfs),
            Err(FinmathError::InvalidRate { .. })
        ));
        assert!(matches!(
            npv(dec!(-1.5), &cfs),
            Err(FinmathError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_npv_rejects_empty() {
        assert!(matches!(
            npv(dec!(0.1), &[]),
            Err(FinmathError::EmptyCashFlows)
        ));
    }

    #[test]
    fn test_npv_large_rate_long_series_does_not_overflow() {
        let mut cfs = vec![dec!(100000)];
        cfs.extend(std::iter::repeat(dec!(-1000)).take(360));
        let result = npv(dec!(3), &cfs).unwrap();
        // Σ 1000/4^t for t≥1 = 1000/3
        assert!((result - (dec!(100000) - dec!(1000) / dec!(3))).abs() < dec!(0.000001));
    }

    #[test]
    fn test_npv_near_minus_one_overflows() {
        let mut cfs = vec![dec!(100000)];
        cfs.extend(std::iter::repeat(dec!(-1000)).take(60));
        assert!(matches!(
            npv(dec!(-0.99), &cfs),
            Err(FinmathError::NumericOverflow { .. })
        ));
    }

    #[test]
    fn test_sign_changes_ignore_zeros() {
        assert_eq!(count_sign_changes(&[dec!(-100), dec!(0), dec!(50)]), 1);
        assert_eq!(
            count_sign_changes(&[dec!(0), dec!(-100), dec!(0), dec!(0), dec!(-5)]),
            0
        );
        assert_eq!(count_sign_changes(&[dec!(1000), dec!(-1500), dec!(600)]), 2);
        assert_eq!(count_sign_changes(&[]), 0);
    }

    #[test]
    fn test_has_sign_change() {
        assert!(has_sign_change(&[dec!(10000), dec!(-500), dec!(-500)]));
        assert!(!has_sign_change(&[dec!(1000), dec!(500), dec!(600)]));
        assert!(!has_sign_change(&[dec!(0), dec!(0)]));
    }
}
