use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use finmath_core::error::{ErrorBody, ErrorEnvelope};
use finmath_core::irr::SolverOptions;
use finmath_core::FinmathError;

/// JS exception whose message is the `{ "error": { code, message } }` envelope.
fn to_napi_error(envelope: ErrorEnvelope) -> napi::Error {
    let reason = serde_json::to_string(&envelope).unwrap_or_else(|_| envelope.error.message);
    napi::Error::from_reason(reason)
}

fn core_error(e: FinmathError) -> napi::Error {
    to_napi_error(ErrorEnvelope::from(&e))
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(|e| {
        to_napi_error(ErrorEnvelope {
            error: ErrorBody {
                code: "VALIDATION_ERROR".into(),
                message: format!("Invalid request: {e}"),
            },
        })
    })
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(|e| core_error(e.into()))
}

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

#[napi]
pub fn npv(input_json: String) -> NapiResult<String> {
    let input: finmath_core::irr::analysis::NpvInput = parse(&input_json)?;
    let output = finmath_core::irr::analysis::calculate_npv(&input).map_err(core_error)?;
    render(&output)
}

#[derive(serde::Deserialize)]
struct SolveIrrBindingInput {
    cash_flows: Vec<rust_decimal::Decimal>,
    #[serde(default)]
    options: SolverOptions,
}

/// Raw solver result without the output envelope.
#[napi]
pub fn solve_irr(input_json: String) -> NapiResult<String> {
    let input: SolveIrrBindingInput = parse(&input_json)?;
    let result = finmath_core::irr::solve_irr(&input.cash_flows, &input.options).map_err(core_error)?;
    render(&result)
}

#[napi]
pub fn calculate_irr(input_json: String) -> NapiResult<String> {
    let input: finmath_core::irr::analysis::IrrInput = parse(&input_json)?;
    let output = finmath_core::irr::analysis::calculate_irr(&input).map_err(core_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[napi]
pub fn convert_to_annual(input_json: String) -> NapiResult<String> {
    let input: finmath_core::rates::RateConversionInput = parse(&input_json)?;
    let output = finmath_core::rates::convert_rate(&input).map_err(core_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// CET
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_cet_basic(input_json: String) -> NapiResult<String> {
    let input: finmath_core::cet::CetBasicInput = parse(&input_json)?;
    let output = finmath_core::cet::calculate_cet_basic(&input).map_err(core_error)?;
    render(&output)
}

#[napi]
pub fn calculate_cet_full(input_json: String) -> NapiResult<String> {
    let input: finmath_core::cet::CetFullInput = parse(&input_json)?;
    let output = finmath_core::cet::calculate_cet_full(&input).map_err(core_error)?;
    render(&output)
}
