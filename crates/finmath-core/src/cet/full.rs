use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::installment::price_installment;
use super::insurance::Insurance;
use super::iof::{calculate_iof, IofBreakdown};
use super::{
    borrower_cash_flows, checked_total, overflow, require_installment_count, require_non_negative,
    require_positive, solve_monthly,
};
use crate::error::FinmathError;
use crate::rates::convert_to_annual;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinmathResult;

/// Loan terms for a CET computed from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CetFullInput {
    pub principal: Money,
    /// Contract monthly rate (e.g. 0.02 for 2% a month)
    pub nominal_rate: Rate,
    pub term_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appraisal_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Insurance>,
    #[serde(default)]
    pub include_iof: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CetFullOutput {
    pub cet_monthly: Rate,
    pub cet_annual: Rate,
    /// PRICE installment before insurance
    pub installment: Money,
    pub insurance_installment: Money,
    /// Amount actually paid each month
    pub total_installment: Money,
    pub total_fees: Money,
    pub iof: IofBreakdown,
    /// Principal less fees and IOF
    pub net_released: Money,
    /// Sum of every installment paid
    pub total_paid: Money,
    pub iterations: u32,
    pub converged: bool,
}

/// CET of a PRICE loan, net of registration/appraisal fees and IOF, with
/// insurance added to each installment.
pub fn calculate_cet_full(input: &CetFullInput) -> FinmathResult<ComputationOutput<CetFullOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("principal", input.principal)?;
    require_installment_count("term_months", input.term_months)?;
    if input.nominal_rate < Decimal::ZERO {
        return Err(FinmathError::InvalidRate {
            rate: input.nominal_rate,
        });
    }

    let registration_fee = input.registration_fee.unwrap_or(Decimal::ZERO);
    let appraisal_fee = input.appraisal_fee.unwrap_or(Decimal::ZERO);
    require_non_negative("registration_fee", registration_fee)?;
    require_non_negative("appraisal_fee", appraisal_fee)?;
    let total_fees = checked_total("fees total", &[registration_fee, appraisal_fee])?;

    let iof = if input.include_iof {
        calculate_iof(input.principal, input.term_months)?
    } else {
        IofBreakdown::default()
    };

    let net_released = input
        .principal
        .checked_sub(total_fees)
        .and_then(|v| v.checked_sub(iof.total))
        .ok_or_else(|| overflow("principal less fees and IOF"))?;
    if net_released <= Decimal::ZERO {
        return Err(FinmathError::NonPositiveNetInflow {
            net_inflow: net_released,
        });
    }

    let installment = price_installment(input.principal, input.nominal_rate, input.term_months)?;
    let insurance_installment = match &input.insurance {
        Some(ins) => ins.monthly_charge(input.principal, input.term_months)?,
        None => Decimal::ZERO,
    };
    let total_installment = installment
        .checked_add(insurance_installment)
        .ok_or_else(|| overflow("installment plus insurance"))?;
    let total_paid = total_installment
        .checked_mul(Decimal::from(input.term_months))
        .ok_or_else(|| overflow("total paid"))?;

    debug!(
        "CET full: released {net_released} of {}, {} x {total_installment}",
        input.principal, input.term_months
    );

    let installments = vec![total_installment; input.term_months as usize];
    let cash_flows = borrower_cash_flows(net_released, &installments);
    let (cet_monthly, solve) = solve_monthly(&cash_flows)?;
    let cet_annual = convert_to_annual(cet_monthly, 12)?;

    if input.nominal_rate.is_zero() && total_fees.is_zero() && iof.total.is_zero() {
        warnings.push("Interest-free loan without charges: CET is zero".into());
    }

    let output = CetFullOutput {
        cet_monthly,
        cet_annual,
        installment,
        insurance_installment,
        total_installment,
        total_fees,
        iof,
        net_released,
        total_paid,
        iterations: solve.diagnostics.iterations,
        converged: solve.converged,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CET: PRICE schedule plus fees, IOF and insurance; Brent IRR annualized over 12 months",
        input,
        warnings,
        elapsed,
        output,
    ))
}
