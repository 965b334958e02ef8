use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinmathError;
use crate::types::{Money, Rate};
use crate::FinmathResult;

/// Credit insurance charged together with each installment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Insurance {
    /// Fixed amount every month.
    Fixed { monthly: Money },
    /// Total premium as a share of the principal, spread evenly over the term.
    PercentOfPrincipal { rate: Rate },
}

impl Insurance {
    /// Insurance added to each of the `term_months` installments.
    pub fn monthly_charge(&self, principal: Money, term_months: u32) -> FinmathResult<Money> {
        match *self {
            Insurance::Fixed { monthly } => {
                if monthly < Decimal::ZERO {
                    return Err(FinmathError::InvalidInput {
                        field: "insurance.monthly".into(),
                        reason: "Insurance cannot be negative".into(),
                    });
                }
                Ok(monthly)
            }
            Insurance::PercentOfPrincipal { rate } => {
                if rate < Decimal::ZERO {
                    return Err(FinmathError::InvalidInput {
                        field: "insurance.rate".into(),
                        reason: "Insurance cannot be negative".into(),
                    });
                }
                if term_months == 0 {
                    return Err(FinmathError::DivisionByZero {
                        context: "insurance spread over zero months".into(),
                    });
                }
                principal
                    .checked_mul(rate)
                    .map(|premium| premium / Decimal::from(term_months))
                    .ok_or_else(|| FinmathError::NumericOverflow {
                        context: "insurance premium".into(),
                    })
            }
        }
    }
}
