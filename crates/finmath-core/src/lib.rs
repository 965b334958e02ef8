pub mod error;
pub mod irr;
pub mod rates;
pub mod types;

#[cfg(feature = "cet")]
pub mod cet;

pub use error::FinmathError;
pub use types::*;

/// Standard result type for all finmath operations
pub type FinmathResult<T> = Result<T, FinmathError>;
