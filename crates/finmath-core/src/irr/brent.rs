//! Brent's method for the IRR.
//!
//! Inverse quadratic interpolation when the last three NPV samples are
//! distinct, the secant step otherwise, and a bisection step whenever the
//! interpolated point fails one of Brent's five acceptance conditions.
//! Every interpolation term is computed with checked decimal arithmetic;
//! a term that overflows or divides by a near-zero difference discards the
//! interpolation for that step.

use log::trace;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::npv::{count_sign_changes, npv};
use super::{opposite_signs, validate_cash_flows, validate_solver_args, SolveMethod, SolveResult};
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// NPV differences below this magnitude are not used as denominators.
const MIN_DENOMINATOR: Decimal = dec!(0.00000000000000000001);

/// Brent's method over `[lo, hi]`.
///
/// Same precondition and `no_sign_change` outcome as
/// [`solve_bisection`](super::solve_bisection). Convergence is checked at the
/// top of each iteration on the best estimate `b`: `|NPV(b)| < tolerance` or
/// `|b - a| < tolerance`. On budget exhaustion `b` is returned with
/// `converged = false`.
#[allow(clippy::many_single_char_names)]
pub fn solve_brent(
    cash_flows: &[Money],
    lo: Rate,
    hi: Rate,
    tolerance: Decimal,
    max_iterations: u32,
) -> FinmathResult<SolveResult> {
    validate_cash_flows(cash_flows)?;
    validate_solver_args(tolerance, max_iterations)?;

    let method = SolveMethod::Brent;
    let multiple_roots = count_sign_changes(cash_flows) > 1;

    let mut a = lo;
    let mut b = hi;
    let mut fa = npv(a, cash_flows)?;
    let mut fb = npv(b, cash_flows)?;

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

    // Keep |f(a)| >= |f(b)|: b is the best estimate
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = Decimal::ZERO;
    // Previous step was a bisection
    let mut mflag = true;
    let mut iterations = 0;

    while iterations < max_iterations {
        if fb.abs() < tolerance || (b - a).abs() < tolerance {
            return Ok(SolveResult::estimate(
                method,
                b,
                fb,
                iterations,
                true,
                multiple_roots,
                (lo, hi),
            ));
        }

        let candidate = if fa != fc && fb != fc {
            inverse_quadratic(a, b, c, fa, fb, fc).or_else(|| secant(a, b, fa, fb))
        } else {
            secant(a, b, fa, fb)
        };

        let step = Step {
            a,
            b,
            c,
            d,
            mflag,
            tolerance,
        };
        let s = match candidate {
            Some(s) if step.accepts(s) => {
                mflag = false;
                s
            }
            _ => {
                mflag = true;
                (a + b) / dec!(2)
            }
        };

        let fs = npv(s, cash_flows)?;
        trace!("brent #{iterations}: a={a} b={b} s={s} npv={fs} bisect={mflag}");

        d = c;
        c = b;
        fc = fb;

        if opposite_signs(fa, fs) {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }

        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        iterations += 1;
    }

    Ok(SolveResult::estimate(
        method,
        b,
        fb,
        iterations,
        false,
        multiple_roots,
        (lo, hi),
    ))
}

/// State needed to judge an interpolated point.
#[derive(Clone, Copy)]
struct Step {
    a: Decimal,
    b: Decimal,
    c: Decimal,
    d: Decimal,
    mflag: bool,
    tolerance: Decimal,
}

impl Step {
    /// None of Brent's five rejection conditions holds for `s`.
    fn accepts(&self, s: Decimal) -> bool {
        let Step {
            a,
            b,
            c,
            d,
            mflag,
            tolerance,
        } = *self;

        let quarter = (dec!(3) * a + b) / dec!(4);
        let (lower, upper) = if quarter < b { (quarter, b) } else { (b, quarter) };

        // Checked first: past this point s lies inside the bracket
        if !(s > lower && s < upper) {
            return false;
        }

        let slow_after_bisection = mflag && (s - b).abs() >= (b - c).abs() / dec!(2);
        let slow_after_interpolation = !mflag && (s - b).abs() >= (c - d).abs() / dec!(2);
        let collapsed_after_bisection = mflag && (b - c).abs() < tolerance;
        let collapsed_after_interpolation = !mflag && (c - d).abs() < tolerance;

        !(slow_after_bisection
            || slow_after_interpolation
            || collapsed_after_bisection
            || collapsed_after_interpolation)
    }
}

/// Lagrange inverse quadratic interpolation through `(f(x), x)` for
/// `x ∈ {a, b, c}`, written with the ratios `f/Δf` so products of large NPVs
/// never form.
fn inverse_quadratic(
    a: Decimal,
    b: Decimal,
    c: Decimal,
    fa: Decimal,
    fb: Decimal,
    fc: Decimal,
) -> Option<Decimal> {
    let d_ab = usable(fa.checked_sub(fb)?)?;
    let d_ac = usable(fa.checked_sub(fc)?)?;
    let d_bc = usable(fb.checked_sub(fc)?)?;

    let l0 = a
        .checked_mul(fb.checked_div(d_ab)?)?
        .checked_mul(fc.checked_div(d_ac)?)?;
    let l1 = b
        .checked_mul(fa.checked_div(-d_ab)?)?
        .checked_mul(fc.checked_div(d_bc)?)?;
    let l2 = c
        .checked_mul(fa.checked_div(-d_ac)?)?
        .checked_mul(fb.checked_div(-d_bc)?)?;

    l0.checked_add(l1)?.checked_add(l2)
}

/// Secant step through `(a, f(a))` and `(b, f(b))`.
fn secant(a: Decimal, b: Decimal, fa: Decimal, fb: Decimal) -> Option<Decimal> {
    let denominator = usable(fb.checked_sub(fa)?)?;
    let ratio = fb.checked_div(denominator)?;
    b.checked_sub(ratio.checked_mul(b.checked_sub(a)?)?)
}

fn usable(denominator: Decimal) -> Option<Decimal> {
    (denominator.abs() >= MIN_DENOMINATOR).then_some(denominator)
}

#[cfg(test)]
mod tests {
    use super::super::solve_bisection;
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.00000001);

    fn price_flows() -> Vec<Money> {
        // PV 10000, 12 x 974.87 at 2.5% per period
        let mut cfs = vec![dec!(10000)];
        cfs.extend(std::iter::repeat(dec!(-974.8712698833823)).take(12));
        cfs
    }

    #[test]
    fn test_brent_known_root() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_brent(&cfs, dec!(0), dec!(1), TOL, 100).unwrap();
        assert!(result.converged);
        assert_eq!(result.method, SolveMethod::Brent);
        assert!((result.rate.unwrap() - dec!(0.10)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_brent_price_schedule() {
        let cfs = price_flows();
        let result = solve_brent(&cfs, dec!(-0.99), dec!(3), TOL, 100).unwrap();
        assert!(result.converged);
        let rate = result.rate.unwrap();
        assert!((rate - dec!(0.025)).abs() / dec!(0.025) < dec!(0.001), "got {rate}");
    }

    #[test]
    fn test_brent_faster_than_bisection() {
        let cfs = price_flows();
        let brent = solve_brent(&cfs, dec!(-0.99), dec!(3), TOL, 100).unwrap();
        let bisection = solve_bisection(&cfs, dec!(-0.99), dec!(3), TOL, 100).unwrap();
        assert!(brent.converged && bisection.converged);
        assert!(brent.diagnostics.iterations < bisection.diagnostics.iterations);
        assert!((brent.rate.unwrap() - bisection.rate.unwrap()).abs() < TOL);
    }

    #[test]
    fn test_brent_no_sign_change() {
        let cfs = vec![dec!(1000), dec!(500), dec!(600)];
        let result = solve_brent(&cfs, dec!(-0.5), dec!(3), TOL, 100).unwrap();
        assert!(!result.converged);
        assert!(result.rate.is_none());
        assert!(result.diagnostics.no_sign_change);
    }

    #[test]
    fn test_brent_budget_exhausted_keeps_estimate() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = solve_brent(&cfs, dec!(0), dec!(1), TOL, 1).unwrap();
        assert!(!result.converged);
        assert_eq!(result.diagnostics.iterations, 1);
        assert!(result.rate.is_some());
        assert!(result.diagnostics.final_npv.is_some());
    }

    #[test]
    fn test_inverse_quadratic_exact_on_quadratic_inverse() {
        // x = y^2 + 1 sampled at y = -1, 1, 2 gives x = 2, 2, 5; root x at y = 0 is 1
        let s = inverse_quadratic(dec!(2), dec!(2), dec!(5), dec!(-1), dec!(1), dec!(2)).unwrap();
        assert!((s - dec!(1)).abs() < dec!(0.00000000000000000001), "got {s}");
    }

    #[test]
    fn test_interpolation_rejects_degenerate_denominators() {
        assert!(secant(dec!(0), dec!(1), dec!(5), dec!(5)).is_none());
        assert!(inverse_quadratic(dec!(0), dec!(1), dec!(2), dec!(1), dec!(1), dec!(3)).is_none());
    }

    #[test]
    fn test_step_rejects_point_outside_quarter_interval() {
        let step = Step {
            a: dec!(0),
            b: dec!(1),
            c: dec!(0),
            d: dec!(0),
            mflag: true,
            tolerance: TOL,
        };
        // (3a + b) / 4 = 0.25: accepted only strictly inside (0.25, 1)
        assert!(!step.accepts(dec!(0.1)));
        assert!(!step.accepts(dec!(1.5)));
        assert!(step.accepts(dec!(0.8)));
    }

    fn step(c: Decimal, d: Decimal, mflag: bool, tolerance: Decimal) -> Step {
        Step {
            a: dec!(0),
            b: dec!(1),
            c,
            d,
            mflag,
            tolerance,
        }
    }

    // Every case below uses a point inside (0.25, 1), so only the later
    // conditions can reject it.

    #[test]
    fn test_step_rejects_slow_step_after_bisection() {
        // |s - b| = 0.2 against |b - c| / 2 = 0.05
        assert!(!step(dec!(0.9), dec!(0), true, TOL).accepts(dec!(0.8)));
        // Same point after an interpolation is judged against |c - d| / 2 = 0.45
        assert!(step(dec!(0.9), dec!(0), false, TOL).accepts(dec!(0.8)));
    }

    #[test]
    fn test_step_rejects_slow_step_after_interpolation() {
        // |s - b| = 0.2 against |c - d| / 2 = 0.1
        assert!(!step(dec!(0.3), dec!(0.5), false, TOL).accepts(dec!(0.8)));
        // After a bisection the bound is |b - c| / 2 = 0.35
        assert!(step(dec!(0.3), dec!(0.5), true, TOL).accepts(dec!(0.8)));
    }

    #[test]
    fn test_step_rejects_collapsed_bisection_interval() {
        let s = dec!(0.9999999999);
        let c = dec!(0.999999999);
        // |b - c| = 1e-9 is below 1e-8
        assert!(!step(c, dec!(0), true, TOL).accepts(s));
        assert!(step(c, dec!(0), true, dec!(0.0000000001)).accepts(s));
    }

    #[test]
    fn test_step_rejects_collapsed_interpolation_interval() {
        let s = dec!(0.9999999999);
        let (c, d) = (dec!(0.3), dec!(0.300000001));
        // |c - d| = 1e-9 is below 1e-8
        assert!(!step(c, d, false, TOL).accepts(s));
        assert!(step(c, d, false, dec!(0.0000000001)).accepts(s));
    }

    #[test]
    fn test_brent_converges_when_npv_differences_are_too_small_to_divide() {
        // NPVs stay below 1e-21, so no difference clears MIN_DENOMINATOR
        let cfs = vec![dec!(-0.000000000000000000001), dec!(0.0000000000000000000011)];
        let f0 = npv(dec!(0), &cfs).unwrap();
        let f1 = npv(dec!(1), &cfs).unwrap();
        assert!(secant(dec!(0), dec!(1), f0, f1).is_none());

        let tol = dec!(0.00000000000000000000000001);
        let result = solve_brent(&cfs, dec!(0), dec!(1), tol, 100).unwrap();
        assert!(result.converged);
        let rate = result.rate.unwrap();
        assert!((rate - dec!(0.1)).abs() < dec!(0.0001), "got {rate}");
    }
}
