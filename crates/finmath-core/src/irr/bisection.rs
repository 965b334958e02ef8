//! Bisection solver for the IRR.

use log::trace;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::npv::{count_sign_changes, npv};
use super::{opposite_signs, validate_cash_flows, validate_solver_args, SolveMethod, SolveResult};
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// Bisection over `[lo, hi]`.
///
/// Requires `NPV(lo) * NPV(hi) < 0`; otherwise returns a result with
/// `no_sign_change` set (an endpoint within `tolerance` of zero is returned
/// as the root). Converges when `|NPV(mid)| < tolerance` or the interval is
/// narrower than `tolerance`. When the iteration budget runs out the last
/// midpoint is returned with `converged = false`.
pub fn solve_bisection(
    cash_flows: &[Money],
    lo: Rate,
    hi: Rate,
    tolerance: Decimal,
    max_iterations: u32,
) -> FinmathResult<SolveResult> {
    validate_cash_flows(cash_flows)?;
    validate_solver_args(tolerance, max_iterations)?;

    let method = SolveMethod::Bisection;
    let multiple_roots = count_sign_changes(cash_flows) > 1;

    let mut a = lo;
    let mut b = hi;
    let mut fa = npv(a, cash_flows)?;
    let fb = npv(b, cash_flows)?;

    // Endpoint already a root
    for (x, fx) in [(a, fa), (b, fb)] {
        if fx.abs() < tolerance {
            return Ok(SolveResult::estimate(
                method,
                x,
                fx,
                0,
                true,
                multiple_roots,
                (lo, hi),
            ));
        }
    }

    if !opposite_signs(fa, fb) {
        return Ok(SolveResult::no_sign_change(method, multiple_roots, lo, hi));
    }

    let mut c = a;
    let mut fc = fa;
    let mut iterations = 0;

    while iterations < max_iterations {
        c = (a + b) / dec!(2);
        fc = npv(c, cash_flows)?;
        trace!("bisection #{iterations}: [{a}, {b}] mid={c} npv={fc}");

        if fc.abs() < tolerance || (b - a).abs() < tolerance {
            return Ok(SolveResult::estimate(
                method,
                c,
                fc,
                iterations,
                true,
                multiple_roots,
                (lo, hi),
            ));
        }

        if opposite_signs(fa, fc) {
            b = c;
        } else {
            a = c;
            fa = fc;
        }

        iterations += 1;
    }

    Ok(SolveResult::estimate(
        method,
        c,
        fc,
        iterations,
        false,
        multiple_roots,
        (lo, hi),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bisection_known_root() {
        // -100 + 110/(1+r) = 0 => r = 10%
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_bisection(&cfs, dec!(0), dec!(1), dec!(0.00000001), 100).unwrap();
        assert!(result.converged);
        assert!((result.rate.unwrap() - dec!(0.10)).abs() < dec!(0.0000001));
        assert!(result.diagnostics.final_npv.unwrap().abs() < dec!(0.000001));
        assert_eq!(result.diagnostics.bracket, Some((dec!(0), dec!(1))));
    }

    #[test]
    fn test_bisection_no_sign_change() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_bisection(&cfs, dec!(0.2), dec!(1), dec!(0.00000001), 100).unwrap();
        assert!(!result.converged);
        assert!(result.rate.is_none());
        assert!(result.diagnostics.no_sign_change);
        assert_eq!(result.diagnostics.iterations, 0);
    }

    #[test]
    fn test_bisection_endpoint_root() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_bisection(&cfs, dec!(0.1), dec!(1), dec!(0.00000001), 100).unwrap();
        assert!(result.converged);
        assert_eq!(result.rate, Some(dec!(0.1)));
        assert_eq!(result.diagnostics.iterations, 0);
    }

    #[test]
    fn test_bisection_budget_exhausted_returns_estimate() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_bisection(&cfs, dec!(0), dec!(1), dec!(0.00000001), 5).unwrap();
        assert!(!result.converged);
        assert_eq!(result.diagnostics.iterations, 5);
        let rate = result.rate.unwrap();
        assert!(rate > dec!(0) && rate < dec!(1));
        assert!((rate - dec!(0.10)).abs() < dec!(0.05));
    }

    #[test]
    fn test_bisection_width_criterion() {
        // Loose tolerance: stops once [a, b] is narrower than 0.1
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_bisection(&cfs, dec!(0), dec!(1), dec!(0.1), 100).unwrap();
        assert!(result.converged);
        assert!(result.diagnostics.iterations <= 4);
    }
}
