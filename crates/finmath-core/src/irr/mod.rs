//! IRR root-finding engine.
//!
//! The IRR of a periodic cash-flow series is the root of its NPV as a
//! function of the rate. The engine works in four steps:
//!
//! 1. [`count_sign_changes`]: more than one sign change flags possible
//!    multiple roots.
//! 2. [`ensure_bracket`]: widen the search interval until NPV changes sign.
//! 3. [`solve_brent`] (default) or [`solve_bisection`] (forced) on the
//!    bracket.
//! 4. Report a [`SolveResult`]: "no root" and "did not converge" are
//!    ordinary outcomes encoded in the result, not errors.
//!
//! | Solver | Convergence | Guarantee |
//! |--------|-------------|-----------|
//! | Brent | superlinear | never worse than bisection |
//! | Bisection | linear | always, given a bracket |
//!
//! All arithmetic is `rust_decimal::Decimal` (28 significant digits, fixed
//! at compile time), so concurrent solves share no numeric configuration.

pub mod analysis;
mod bisection;
pub mod bracket;
mod brent;
pub mod npv;

pub use bisection::solve_bisection;
pub use bracket::{ensure_bracket, Bracket};
pub use brent::solve_brent;
pub use npv::{count_sign_changes, has_sign_change, npv};

use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinmathError;
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// Default search interval lower bound.
pub const DEFAULT_LO: Decimal = dec!(-0.99);

/// Default search interval upper bound.
pub const DEFAULT_HI: Decimal = dec!(3);

/// Default convergence tolerance on |NPV| and on the bracket width.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.00000001);

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Root-finding strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveMethod {
    #[serde(rename = "bisection")]
    Bisection,
    #[default]
    #[serde(rename = "brent")]
    Brent,
}

impl std::fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMethod::Bisection => write!(f, "bisection"),
            SolveMethod::Brent => write!(f, "brent"),
        }
    }
}

/// Solver configuration. Every field has a default, so a partial JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Starting search interval `(lo, hi)`, expanded when it holds no sign change.
    pub initial_bracket: (Rate, Rate),
    /// Convergence tolerance; must be strictly positive.
    pub tolerance: Decimal,
    /// Iteration budget; must be at least 1.
    pub max_iterations: u32,
    /// Use bisection instead of Brent.
    pub force_bisection: bool,
    /// Optional rate hint used to narrow the bracket before solving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_guess: Option<Rate>,
    /// Bracket expansion budget.
    pub max_bracket_expansions: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            initial_bracket: (DEFAULT_LO, DEFAULT_HI),
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            force_bisection: false,
            initial_guess: None,
            max_bracket_expansions: bracket::DEFAULT_MAX_EXPANSIONS,
        }
    }
}

impl SolverOptions {
    #[must_use]
    pub fn with_bracket(mut self, lo: Rate, hi: Rate) -> Self {
        self.initial_bracket = (lo, hi);
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_force_bisection(mut self, force: bool) -> Self {
        self.force_bisection = force;
        self
    }

    #[must_use]
    pub fn with_initial_guess(mut self, guess: Rate) -> Self {
        self.initial_guess = Some(guess);
        self
    }

    /// Solver selected by these options.
    pub fn method(&self) -> SolveMethod {
        if self.force_bisection {
            SolveMethod::Bisection
        } else {
            SolveMethod::Brent
        }
    }
}

/// Diagnostics attached to every [`SolveResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// More than one sign change in the cash flows: the root may not be unique.
    pub multiple_roots: bool,
    /// NPV has the same sign across the whole search interval.
    pub no_sign_change: bool,
    /// NPV at the returned rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_npv: Option<Money>,
    pub iterations: u32,
    /// Interval the solver actually searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket: Option<(Rate, Rate)>,
}

/// Result of an IRR solve.
///
/// `rate` is present whenever the solver has an estimate, including when it
/// ran out of iterations; check `converged` before trusting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub rate: Option<Rate>,
    pub converged: bool,
    pub method: SolveMethod,
    pub diagnostics: SolveDiagnostics,
}

impl SolveResult {
    pub(crate) fn estimate(
        method: SolveMethod,
        rate: Rate,
        final_npv: Money,
        iterations: u32,
        converged: bool,
        multiple_roots: bool,
        bracket: (Rate, Rate),
    ) -> Self {
        SolveResult {
            rate: Some(rate),
            converged,
            method,
            diagnostics: SolveDiagnostics {
                multiple_roots,
                no_sign_change: false,
                final_npv: Some(final_npv),
                iterations,
                bracket: Some(bracket),
            },
        }
    }

    pub(crate) fn no_sign_change(method: SolveMethod, multiple_roots: bool, lo: Rate, hi: Rate) -> Self {
        SolveResult {
            rate: None,
            converged: false,
            method,
            diagnostics: SolveDiagnostics {
                multiple_roots,
                no_sign_change: true,
                final_npv: None,
                iterations: 0,
                bracket: Some((lo, hi)),
            },
        }
    }
}

/// Solve for the periodic IRR of `cash_flows`.
///
/// Fails only on malformed input (fewer than two flows, non-positive
/// tolerance, zero iteration budget, invalid bracket) or when NPV leaves the
/// decimal range. A series without a sign change, or a solve that runs out
/// of iterations, is reported through the result.
pub fn solve_irr(cash_flows: &[Money], options: &SolverOptions) -> FinmathResult<SolveResult> {
    validate_cash_flows(cash_flows)?;
    validate_solver_args(options.tolerance, options.max_iterations)?;

    let method = options.method();
    let multiple_roots = count_sign_changes(cash_flows) > 1;
    if multiple_roots {
        debug!("cash flows change sign more than once; IRR may not be unique");
    }

    let (lo, hi) = options.initial_bracket;
    let bracket = ensure_bracket(cash_flows, lo, hi, options.max_bracket_expansions)?;
    if !bracket.bracketed {
        warn!(
            "no sign change in NPV across [{}, {}]; IRR does not exist in the search domain",
            bracket.lo, bracket.hi
        );
        return Ok(SolveResult::no_sign_change(
            method,
            multiple_roots,
            bracket.lo,
            bracket.hi,
        ));
    }

    let (lo, hi) = match options.initial_guess {
        Some(guess) => narrow_with_guess(cash_flows, bracket.lo, bracket.hi, guess)?,
        None => (bracket.lo, bracket.hi),
    };

    let result = match method {
        SolveMethod::Bisection => {
            solve_bisection(cash_flows, lo, hi, options.tolerance, options.max_iterations)?
        }
        SolveMethod::Brent => {
            solve_brent(cash_flows, lo, hi, options.tolerance, options.max_iterations)?
        }
    };

    debug!(
        "{} IRR solve: rate={:?} converged={} iterations={}",
        result.method, result.rate, result.converged, result.diagnostics.iterations
    );
    Ok(result)
}

/// Keep the half of `[lo, hi]` split at `guess` that still shows the sign change.
fn narrow_with_guess(
    cash_flows: &[Money],
    lo: Rate,
    hi: Rate,
    guess: Rate,
) -> FinmathResult<(Rate, Rate)> {
    if guess <= lo || guess >= hi {
        return Ok((lo, hi));
    }
    let f_guess = npv(guess, cash_flows)?;
    if f_guess.is_zero() {
        return Ok((lo, hi));
    }
    let f_lo = npv(lo, cash_flows)?;
    if f_lo.is_zero() {
        return Ok((lo, hi));
    }
    if f_lo.is_sign_negative() != f_guess.is_sign_negative() {
        Ok((lo, guess))
    } else {
        Ok((guess, hi))
    }
}

/// Strict sign difference, compared by sign so large NPVs cannot overflow a product.
pub(crate) fn opposite_signs(x: Decimal, y: Decimal) -> bool {
    !x.is_zero() && !y.is_zero() && x.is_sign_negative() != y.is_sign_negative()
}

pub(crate) fn validate_cash_flows(cash_flows: &[Money]) -> FinmathResult<()> {
    if cash_flows.is_empty() {
        return Err(FinmathError::EmptyCashFlows);
    }
    if cash_flows.len() < 2 {
        return Err(FinmathError::InsufficientCashFlows {
            required: 2,
            actual: cash_flows.len(),
        });
    }
    Ok(())
}

pub(crate) fn validate_solver_args(tolerance: Decimal, max_iterations: u32) -> FinmathResult<()> {
    if tolerance <= Decimal::ZERO {
        return Err(FinmathError::InvalidInput {
            field: "tolerance".into(),
            reason: "Tolerance must be strictly positive".into(),
        });
    }
    if max_iterations == 0 {
        return Err(FinmathError::InvalidInput {
            field: "max_iterations".into(),
            reason: "At least one iteration is required".into(),
        });
    }
    Ok(())
}
