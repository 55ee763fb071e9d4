pub mod compounding;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "deposits")]
pub mod deposits;

#[cfg(feature = "investments")]
pub mod investments;

#[cfg(feature = "returns")]
pub mod returns;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::FinCalcError;
pub use types::*;

/// Standard result type for all fincalc operations
pub type FinCalcResult<T> = Result<T, FinCalcError>;
