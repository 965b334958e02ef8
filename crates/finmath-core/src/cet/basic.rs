use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{
    borrower_cash_flows, checked_total, overflow, require_installment_count, require_non_negative,
    require_positive, solve_monthly,
};
use crate::error::FinmathError;
use crate::irr::SolveResult;
use crate::rates::convert_to_annual;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinmathResult;

fn default_base_annual() -> u32 {
    12
}

/// Input for a CET over a known installment schedule.
///
/// The schedule is either listed in `schedule` or given as `n` equal
/// installments of `pmt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CetBasicInput {
    /// Credit released to the borrower
    pub pv: Money,
    #[serde(default)]
    pub schedule: Vec<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmt: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Fees charged at t=0, deducted from what the borrower receives
    #[serde(default)]
    pub fees_t0: Vec<Money>,
    /// Periods per year used to annualize the monthly IRR
    #[serde(default = "default_base_annual")]
    pub base_annual: u32,
}

impl CetBasicInput {
    /// Installments in payment order.
    pub fn installments(&self) -> FinmathResult<Vec<Money>> {
        match (self.schedule.is_empty(), self.pmt, self.n) {
            (false, None, None) => {
                let len = u32::try_from(self.schedule.len()).unwrap_or(u32::MAX);
                require_installment_count("schedule", len)?;
                Ok(self.schedule.clone())
            }
            (false, _, _) => Err(FinmathError::InvalidInput {
                field: "schedule".into(),
                reason: "Give either a schedule or pmt and n, not both".into(),
            }),
            (true, Some(pmt), Some(n)) => {
                require_installment_count("n", n)?;
                Ok(vec![pmt; n as usize])
            }
            (true, _, _) => Err(FinmathError::InvalidInput {
                field: "schedule".into(),
                reason: "Schedule cannot be empty".into(),
            }),
        }
    }
}

/// Money received and fees withheld at t=0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CetBreakdown {
    pub pv: Money,
    pub total_fees_t0: Money,
    pub net_inflow: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CetBasicOutput {
    pub irr_monthly: Rate,
    pub cet_annual: Rate,
    pub cash_flows: Vec<Money>,
    pub breakdown: CetBreakdown,
    pub irr_result: SolveResult,
}

/// CET over a known schedule: `CF0 = pv - fees`, `CFk = -pmt_k`, solved for
/// the monthly IRR and compounded over `base_annual` periods.
pub fn calculate_cet_basic(input: &CetBasicInput) -> FinmathResult<ComputationOutput<CetBasicOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("pv", input.pv)?;
    if input.base_annual == 0 {
        return Err(FinmathError::InvalidInput {
            field: "base_annual".into(),
            reason: "Must be at least 1".into(),
        });
    }
    let installments = input.installments()?;
    for fee in &input.fees_t0 {
        require_non_negative("fees_t0", *fee)?;
    }

    let total_fees_t0 = checked_total("fees_t0 total", &input.fees_t0)?;
    let net_inflow = input
        .pv
        .checked_sub(total_fees_t0)
        .ok_or_else(|| overflow("pv less fees_t0"))?;
    if net_inflow <= Decimal::ZERO {
        return Err(FinmathError::NonPositiveNetInflow { net_inflow });
    }

    if installments.iter().any(|pmt| *pmt <= Decimal::ZERO) {
        warnings.push("Schedule contains non-positive installments".into());
    }

    let cash_flows = borrower_cash_flows(net_inflow, &installments);
    debug!(
        "CET basic: net inflow {net_inflow} against {} installments",
        installments.len()
    );

    let (irr_monthly, irr_result) = solve_monthly(&cash_flows)?;
    if irr_result.diagnostics.multiple_roots {
        warnings.push("Cash flows change sign more than once: the CET may not be unique".into());
    }
    let cet_annual = convert_to_annual(irr_monthly, input.base_annual)?;

    let output = CetBasicOutput {
        irr_monthly,
        cet_annual,
        cash_flows,
        breakdown: CetBreakdown {
            pv: input.pv,
            total_fees_t0,
            net_inflow,
        },
        irr_result,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CET: Brent IRR of the borrower cash flow, annualized by compounding",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::MAX_INSTALLMENTS;
    use super::*;
    use rust_decimal_macros::dec;

    // PRICE installment for 10000 at 2% over 12 months
    const PMT_2PCT: Decimal = dec!(945.5959662295148527561554615);

    fn input(pv: Money, pmt: Money, n: u32, fees: Vec<Money>) -> CetBasicInput {
        CetBasicInput {
            pv,
            schedule: vec![],
            pmt: Some(pmt),
            n: Some(n),
            fees_t0: fees,
            base_annual: 12,
        }
    }

    #[test]
    fn test_cet_without_fees_equals_nominal_rate() {
        let out = calculate_cet_basic(&input(dec!(10000), PMT_2PCT, 12, vec![])).unwrap();
        let r = &out.result;
        assert!((r.irr_monthly - dec!(0.02)).abs() < dec!(0.0000001), "got {}", r.irr_monthly);
        assert!((r.cet_annual - dec!(0.268241794)).abs() < dec!(0.000001));
        assert_eq!(r.breakdown.net_inflow, dec!(10000));
        assert_eq!(r.cash_flows.len(), 13);
        assert!(r.irr_result.converged);
    }

    #[test]
    fn test_fees_raise_cet() {
        let base = calculate_cet_basic(&input(dec!(10000), PMT_2PCT, 12, vec![])).unwrap();
        let fees = calculate_cet_basic(&input(dec!(10000), PMT_2PCT, 12, vec![dec!(85)])).unwrap();
        assert!(fees.result.irr_monthly > base.result.irr_monthly);
        assert!(fees.result.cet_annual > base.result.cet_annual);
        assert_eq!(fees.result.breakdown.total_fees_t0, dec!(85));
        assert_eq!(fees.result.cash_flows[0], dec!(9915));
    }

    #[test]
    fn test_explicit_schedule() {
        let req = CetBasicInput {
            pv: dec!(1000),
            schedule: vec![dec!(550), dec!(550)],
            pmt: None,
            n: None,
            fees_t0: vec![],
            base_annual: 12,
        };
        let out = calculate_cet_basic(&req).unwrap();
        // 1000 = 550/(1+i) + 550/(1+i)^2 => i ~ 6.5965%
        assert!((out.result.irr_monthly - dec!(0.0659646)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_fees_exceeding_pv_rejected() {
        let err = calculate_cet_basic(&input(dec!(100), dec!(10), 12, vec![dec!(60), dec!(40)]))
            .unwrap_err();
        assert!(matches!(err, FinmathError::NonPositiveNetInflow { .. }));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(calculate_cet_basic(&input(dec!(0), dec!(10), 12, vec![])).is_err());
        assert!(calculate_cet_basic(&input(dec!(100), dec!(10), 0, vec![])).is_err());

        let mut req = input(dec!(100), dec!(10), 12, vec![]);
        req.base_annual = 0;
        assert!(calculate_cet_basic(&req).is_err());

        let mut req = input(dec!(100), dec!(10), 12, vec![]);
        req.pmt = None;
        req.n = None;
        assert!(matches!(
            calculate_cet_basic(&req),
            Err(FinmathError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_fee_total_overflow_is_an_error() {
        let req = CetBasicInput {
            pv: dec!(100),
            schedule: vec![dec!(10)],
            pmt: None,
            n: None,
            fees_t0: vec![Decimal::MAX, dec!(1)],
            base_annual: 12,
        };
        assert!(matches!(
            calculate_cet_basic(&req),
            Err(FinmathError::NumericOverflow { .. })
        ));
    }

    #[test]
    fn test_installment_count_capped() {
        let req: CetBasicInput =
            serde_json::from_str(r#"{"pv": "1000", "pmt": "10", "n": 4000000000}"#).unwrap();
        assert!(matches!(
            calculate_cet_basic(&req),
            Err(FinmathError::InvalidInput { .. })
        ));
        assert!(input(dec!(1000), dec!(10), MAX_INSTALLMENTS, vec![]).installments().is_ok());
        assert!(input(dec!(1000), dec!(10), MAX_INSTALLMENTS + 1, vec![])
            .installments()
            .is_err());
    }

    #[test]
    fn test_cet_basic_from_json() {
        let req: CetBasicInput = serde_json::from_str(
            r#"{"pv": "10000", "pmt": "945.5959662295148527561554615", "n": 12, "fees_t0": ["85"]}"#,
        )
        .unwrap();
        assert_eq!(req.base_annual, 12);
        let out = calculate_cet_basic(&req).unwrap();
        assert!(out.result.irr_monthly > dec!(0.02));
    }
}
