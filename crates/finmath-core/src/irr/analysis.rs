use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::npv::{count_sign_changes, npv};
use super::{solve_irr, validate_cash_flows, SolveMethod, SolverOptions};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinmathResult;

/// Input for an NPV evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvInput {
    /// Periodic discount rate, strictly above -1
    pub rate: Rate,
    pub cash_flows: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvOutput {
    pub npv: Money,
    pub rate: Rate,
    pub periods: usize,
    pub sign_changes: usize,
}

/// NPV of the cash flows at the given rate, wrapped in the output envelope.
pub fn calculate_npv(input: &NpvInput) -> FinmathResult<ComputationOutput<NpvOutput>> {
    let start = Instant::now();
    validate_cash_flows(&input.cash_flows)?;

    let value = npv(input.rate, &input.cash_flows)?;
    let output = NpvOutput {
        npv: value,
        rate: input.rate,
        periods: input.cash_flows.len(),
        sign_changes: count_sign_changes(&input.cash_flows),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "NPV: sum of CF_t / (1 + r)^t, t = 0..n",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}

/// Input for an IRR calculation over periodic cash flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// Period cash flows, index 0 first (at least two entries)
    pub cash_flows: Vec<Money>,
    /// Rate hint used to narrow the search interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_guess: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Decimal>,
    #[serde(default)]
    pub force_bisection: bool,
}

impl IrrInput {
    /// Solver options: defaults overridden by whatever the input carries.
    pub fn solver_options(&self) -> SolverOptions {
        let defaults = SolverOptions::default();
        SolverOptions {
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            force_bisection: self.force_bisection,
            initial_guess: self.initial_guess,
            ..defaults
        }
    }
}

/// Output of an IRR calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    /// Periodic IRR; `None` when no estimate exists
    pub irr: Option<Rate>,
    pub iterations: u32,
    pub method: SolveMethod,
    pub converged: bool,
    /// NPV at `irr`
    pub npv: Option<Money>,
    pub multiple_roots: bool,
    pub no_sign_change: bool,
}

/// Solve the IRR and wrap it in the standard output envelope.
///
/// Only malformed input is an error; an IRR that does not exist or did not
/// converge comes back with `converged = false` and an explanatory warning.
pub fn calculate_irr(input: &IrrInput) -> FinmathResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let options = input.solver_options();
    let result = solve_irr(&input.cash_flows, &options)?;
    let diagnostics = &result.diagnostics;

    if diagnostics.multiple_roots {
        warnings.push(
            "Cash flows change sign more than once: the IRR may not be unique".into(),
        );
    }
    if diagnostics.no_sign_change {
        warnings.push("NPV does not change sign over the search domain: no IRR exists".into());
    } else if !result.converged {
        warnings.push(format!(
            "{} did not converge within {} iterations; irr is a best estimate",
            result.method, options.max_iterations
        ));
    }

    let output = IrrOutput {
        irr: result.rate,
        iterations: diagnostics.iterations,
        method: result.method,
        converged: result.converged,
        npv: diagnostics.final_npv,
        multiple_roots: diagnostics.multiple_roots,
        no_sign_change: diagnostics.no_sign_change,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("IRR via {} on bracketed NPV", result.method),
        &options,
        warnings,
        elapsed,
        output,
    ))
}
