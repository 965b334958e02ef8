use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinmathError {
    #[error("Cash flow series is empty")]
    EmptyCashFlows,

    #[error("Insufficient cash flows: at least {required} required, got {actual}")]
    InsufficientCashFlows { required: usize, actual: usize },

    #[error("Invalid rate {rate}: must be greater than -100%")]
    InvalidRate { rate: Decimal },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Net inflow at t=0 must be positive (principal greater than fees), got {net_inflow}")]
    NonPositiveNetInflow { net_inflow: Decimal },

    #[error("Solver did not converge: {method} stopped after {iterations} iterations (npv: {last_npv:?}, no sign change: {no_sign_change})")]
    SolverDidNotConverge {
        method: String,
        iterations: u32,
        last_npv: Option<Decimal>,
        no_sign_change: bool,
    },

    #[error("Numeric overflow in {context}")]
    NumericOverflow { context: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FinmathError {
    /// Machine-readable code used by the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            FinmathError::EmptyCashFlows
            | FinmathError::InsufficientCashFlows { .. }
            | FinmathError::InvalidRate { .. }
            | FinmathError::InvalidInput { .. }
            | FinmathError::NonPositiveNetInflow { .. } => "VALIDATION_ERROR",
            FinmathError::SolverDidNotConverge {
                no_sign_change: true,
                ..
            } => "IRR_NO_SIGN_CHANGE",
            FinmathError::SolverDidNotConverge { .. } => "IRR_NO_CONVERGENCE",
            FinmathError::NumericOverflow { .. } | FinmathError::DivisionByZero { .. } => {
                "CALCULATION_ERROR"
            }
            FinmathError::SerializationError(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            FinmathError::EmptyCashFlows
            | FinmathError::InsufficientCashFlows { .. }
            | FinmathError::InvalidRate { .. }
            | FinmathError::InvalidInput { .. } => 400,
            FinmathError::NonPositiveNetInflow { .. }
            | FinmathError::SolverDidNotConverge { .. }
            | FinmathError::NumericOverflow { .. }
            | FinmathError::DivisionByZero { .. } => 422,
            FinmathError::SerializationError(_) => 500,
        }
    }
}

impl From<serde_json::Error> for FinmathError {
    fn from(e: serde_json::Error) -> Self {
        FinmathError::SerializationError(e.to_string())
    }
}

/// `{ "error": { "code": ..., "message": ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&FinmathError> for ErrorEnvelope {
    fn from(e: &FinmathError) -> Self {
        ErrorEnvelope {
            error: ErrorBody {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}
