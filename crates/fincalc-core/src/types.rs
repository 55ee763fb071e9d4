use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::FinCalcResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Rates quoted the way calculator forms take them (7.5 = 7.5%).
pub type Percent = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Longest horizon any calculator accepts.
pub const MAX_YEARS: u32 = 100;

/// Highest annual rate (in percent) any calculator accepts.
pub const MAX_RATE_PERCENT: Percent = dec!(100);

/// Largest single money input. Keeps sums and products of inputs inside
/// `Decimal` range; compounding can still overflow and is checked separately.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

/// How often interest is credited to the balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompoundingFrequency {
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "Half-Yearly")]
    HalfYearly,
    Yearly,
}

impl CompoundingFrequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::HalfYearly => 2,
            CompoundingFrequency::Yearly => 1,
        }
    }
}

/// An annual percentage rate together with its compounding frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub annual_rate_percent: Percent,
    #[serde(default)]
    pub frequency: CompoundingFrequency,
}

impl RateSchedule {
    pub fn new(annual_rate_percent: Percent, frequency: CompoundingFrequency) -> Self {
        Self {
            annual_rate_percent,
            frequency,
        }
    }

    pub fn monthly(annual_rate_percent: Percent) -> Self {
        Self::new(annual_rate_percent, CompoundingFrequency::Monthly)
    }

    /// Accept rates in `[0, MAX_RATE_PERCENT]`; zero is a valid (degenerate) schedule.
    pub fn validate(&self, field: &str) -> FinCalcResult<()> {
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(FinCalcError::InvalidInput {
                field: field.into(),
                reason: "Rate must be >= 0".into(),
            });
        }
        if self.annual_rate_percent > MAX_RATE_PERCENT {
            return Err(FinCalcError::InvalidInput {
                field: field.into(),
                reason: format!("Rate must be <= {MAX_RATE_PERCENT}%"),
            });
        }
        Ok(())
    }

    /// Annual rate as a decimal (7.5 -> 0.075).
    pub fn annual_rate(&self) -> Rate {
        self.annual_rate_percent / dec!(100)
    }

    /// Rate applied each compounding period: annual / (100 * periods_per_year).
    pub fn periodic_rate(&self) -> Rate {
        self.annual_rate_percent / (dec!(100) * Decimal::from(self.frequency.periods_per_year()))
    }

    pub fn is_zero(&self) -> bool {
        self.annual_rate_percent.is_zero()
    }
}

/// A single cash flow at a point in time.
/// Negative amounts are investments (outflows), positive amounts are proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One swept input of a sensitivity run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

fn require_at_most(value: Money, field: &str) -> FinCalcResult<()> {
    if value > MAX_AMOUNT {
        return Err(FinCalcError::InvalidInput {
            field: field.into(),
            reason: format!("{field} must be <= {MAX_AMOUNT}"),
        });
    }
    Ok(())
}

/// Reject non-positive money amounts with a field-specific message.
pub(crate) fn require_positive(value: Money, field: &str) -> FinCalcResult<()> {
    if value <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: field.into(),
            reason: format!("{field} must be > 0"),
        });
    }
    require_at_most(value, field)
}

pub(crate) fn require_non_negative(value: Money, field: &str) -> FinCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: field.into(),
            reason: format!("{field} must be >= 0"),
        });
    }
    require_at_most(value, field)
}

pub(crate) fn require_years(years: u32, field: &str) -> FinCalcResult<()> {
    if years == 0 || years > MAX_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: field.into(),
            reason: format!("Duration must be between 1 and {MAX_YEARS} years"),
        });
    }
    Ok(())
}
