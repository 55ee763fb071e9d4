use chrono::{Months, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::fractional_compound;
use crate::types::*;
use crate::FinCalcResult;

/// Months per compounding quarter.
const MONTHS_PER_QUARTER: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdInput {
    pub monthly_amount: Money,
    pub annual_rate_percent: Percent,
    pub years: u32,
    /// Date of the first installment. Only used to report the maturity date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdYear {
    pub year: u32,
    pub balance: Money,
    pub interest_earned: Money,
    pub invested_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdOutput {
    pub maturity_amount: Money,
    pub total_interest: Money,
    pub total_investment: Money,
    pub yearly_data: Vec<RdYear>,
    pub maturity_date: Option<NaiveDate>,
}

/// Value at month `horizon` of every installment made before it.
///
/// Installment `i` (0-indexed) stays invested for `horizon - i` months and
/// compounds quarterly on its own.
fn value_at(amount: Money, quarter_factor: Decimal, horizon: u32) -> FinCalcResult<Money> {
    let mut total = Decimal::ZERO;
    for i in 0..horizon {
        let grown = fractional_compound(quarter_factor, horizon - i, MONTHS_PER_QUARTER)?;
        total = amount
            .checked_mul(grown)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| FinCalcError::overflow("recurring deposit value"))?;
    }
    Ok(total)
}

/// Maturity value of a recurring deposit with quarterly compounding.
///
/// Each monthly installment is treated as a separate deposit compounded at
/// `(1 + rate/400)` per quarter for its own remaining term, the convention
/// Indian banks publish. Installments are not pooled into a running balance.
pub fn simulate_rd(input: &RdInput) -> FinCalcResult<ComputationOutput<RdOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    require_positive(input.monthly_amount, "monthly_amount")?;
    let schedule = RateSchedule::new(input.annual_rate_percent, CompoundingFrequency::Quarterly);
    schedule.validate("annual_rate_percent")?;
    require_years(input.years, "years")?;

    let months = input.years * 12;
    let quarter_factor = Decimal::ONE + schedule.periodic_rate();

    let maturity_amount = value_at(input.monthly_amount, quarter_factor, months)?;
    let total_investment = input.monthly_amount * Decimal::from(months);

    let yearly_data = (1..=input.years)
        .map(|year| {
            let horizon = year * 12;
            let balance = value_at(input.monthly_amount, quarter_factor, horizon)?;
            let invested_amount = input.monthly_amount * Decimal::from(horizon);
            Ok(RdYear {
                year,
                balance,
                interest_earned: balance - invested_amount,
                invested_amount,
            })
        })
        .collect::<FinCalcResult<Vec<_>>>()?;

    let maturity_date = match input.start_date {
        Some(d) => Some(d.checked_add_months(Months::new(months)).ok_or_else(|| {
            FinCalcError::DateError(format!("maturity date overflows {months} months after {d}"))
        })?),
        None => None,
    };

    debug!("RD of {months} installments matures at {maturity_amount}");

    let output = RdOutput {
        maturity_amount,
        total_interest: maturity_amount - total_investment,
        total_investment,
        yearly_data,
        maturity_date,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Recurring deposit: per-installment quarterly compounding",
        &serde_json::json!({
            "monthly_amount": input.monthly_amount.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "years": input.years,
            "compounding": "quarterly",
        }),
        warnings,
        elapsed,
        output,
    ))
}
