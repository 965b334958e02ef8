//! CET (Custo Efetivo Total): the total effective cost of a loan.
//!
//! The CET is the IRR of the borrower's cash flow: what they actually
//! receive at t=0 (principal less up-front fees and taxes) against every
//! installment they pay, annualized by compounding.
//!
//! - [`calculate_cet_basic`]: caller-supplied schedule and t=0 fees.
//! - [`calculate_cet_full`]: PRICE schedule built from the loan terms, with
//!   optional registration/appraisal fees, IOF and credit insurance.
//!
//! Both solve with Brent at a `1e-8` NPV tolerance. Unlike the plain IRR
//! engine, a CET that cannot be solved is an error.

pub mod basic;
pub mod full;
pub mod installment;
pub mod insurance;
pub mod iof;

pub use basic::{calculate_cet_basic, CetBasicInput, CetBasicOutput, CetBreakdown};
pub use full::{calculate_cet_full, CetFullInput, CetFullOutput};
pub use installment::price_installment;
pub use insurance::Insurance;
pub use iof::{calculate_iof, IofBreakdown};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::FinmathError;
use crate::irr::{solve_irr, SolveResult, SolverOptions};
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// NPV tolerance used for every CET solve.
pub const CET_TOLERANCE: Decimal = dec!(0.00000001);

/// Longest schedule accepted: 100 years of monthly installments.
pub const MAX_INSTALLMENTS: u32 = 1200;

/// Borrower cash flow: `net_inflow` at t=0, then each installment as an outflow.
pub(crate) fn borrower_cash_flows(net_inflow: Money, installments: &[Money]) -> Vec<Money> {
    let mut flows = Vec::with_capacity(installments.len() + 1);
    flows.push(net_inflow);
    flows.extend(installments.iter().map(|pmt| -*pmt));
    flows
}

/// Monthly IRR of a borrower cash flow; anything short of a converged root
/// is a [`FinmathError::SolverDidNotConverge`].
pub(crate) fn solve_monthly(cash_flows: &[Money]) -> FinmathResult<(Rate, SolveResult)> {
    let options = SolverOptions::default().with_tolerance(CET_TOLERANCE);
    let result = solve_irr(cash_flows, &options)?;

    match result.rate {
        Some(rate) if result.converged => Ok((rate, result)),
        _ => Err(FinmathError::SolverDidNotConverge {
            method: result.method.to_string(),
            iterations: result.diagnostics.iterations,
            last_npv: result.diagnostics.final_npv,
            no_sign_change: result.diagnostics.no_sign_change,
        }),
    }
}

pub(crate) fn require_positive(field: &str, value: Money) -> FinmathResult<()> {
    if value <= Decimal::ZERO {
        return Err(FinmathError::InvalidInput {
            field: field.into(),
            reason: "Must be positive".into(),
        });
    }
    Ok(())
}

pub(crate) fn require_installment_count(field: &str, count: u32) -> FinmathResult<()> {
    if count == 0 {
        return Err(FinmathError::InvalidInput {
            field: field.into(),
            reason: "At least one installment is required".into(),
        });
    }
    if count > MAX_INSTALLMENTS {
        return Err(FinmathError::InvalidInput {
            field: field.into(),
            reason: format!("At most {MAX_INSTALLMENTS} installments are supported"),
        });
    }
    Ok(())
}

/// Sum of money amounts, failing instead of panicking on overflow.
pub(crate) fn checked_total(context: &str, amounts: &[Money]) -> FinmathResult<Money> {
    amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, x| acc.checked_add(*x))
        .ok_or_else(|| overflow(context))
}

pub(crate) fn overflow(context: &str) -> FinmathError {
    FinmathError::NumericOverflow {
        context: context.into(),
    }
}

pub(crate) fn require_non_negative(field: &str, value: Money) -> FinmathResult<()> {
    if value < Decimal::ZERO {
        return Err(FinmathError::InvalidInput {
            field: field.into(),
            reason: "Cannot be negative".into(),
        });
    }
    Ok(())
}
