use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::compounding::{FlowTiming, PeriodFlow, PeriodicCompounder};
use crate::error::FinCalcError;
use crate::types::*;
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    pub monthly_amount: Money,
    pub annual_rate_percent: Percent,
    pub years: u32,
    /// Yearly increase of the monthly amount, applied after every 12th installment.
    #[serde(default)]
    pub step_up_percent: Percent,
    /// One-off amount invested before the first installment.
    #[serde(default)]
    pub lumpsum: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipYear {
    pub year: u32,
    pub invested: Money,
    pub value: Money,
    pub returns: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipOutput {
    pub total_investment: Money,
    pub estimated_returns: Money,
    pub total_value: Money,
    pub yearly_breakdown: Vec<SipYear>,
}

/// Monthly installment for each year when the amount steps up every 12 months.
pub(crate) fn yearly_installments(base: Money, step_up: Rate, years: u32) -> FinCalcResult<Vec<Money>> {
    let mut amount = base;
    let mut table = Vec::with_capacity(years as usize);
    for year in 0..years {
        if year > 0 {
            amount = amount
                .checked_mul(Decimal::ONE + step_up)
                .ok_or_else(|| FinCalcError::overflow("stepped-up installment"))?;
        }
        table.push(amount);
    }
    Ok(table)
}

/// Installment due in a 1-indexed month, looked up in a `yearly_installments` table.
pub(crate) fn installment_for(table: &[Money], month: u32) -> Money {
    table
        .get((month.saturating_sub(1) / 12) as usize)
        .copied()
        .unwrap_or(Decimal::ZERO)
}

/// Compounder shared by the SIP projection and the goal solver: each
/// installment is invested at the start of the month and earns that month's return.
pub(crate) fn sip_compounder(annual_rate_percent: Percent) -> PeriodicCompounder {
    PeriodicCompounder::new(
        RateSchedule::monthly(annual_rate_percent).periodic_rate(),
        FlowTiming::StartOfPeriod,
    )
}

/// Project a (step-up) SIP forward with an optional initial lump sum.
pub fn project_sip(input: &SipInput) -> FinCalcResult<ComputationOutput<SipOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative(input.monthly_amount, "monthly_amount")?;
    require_non_negative(input.lumpsum, "lumpsum")?;
    if input.monthly_amount.is_zero() && input.lumpsum.is_zero() {
        return Err(FinCalcError::invalid(
            "monthly_amount",
            "Either monthly_amount or lumpsum must be > 0",
        ));
    }
    RateSchedule::monthly(input.annual_rate_percent).validate("annual_rate_percent")?;
    let step_up = RateSchedule::new(input.step_up_percent, CompoundingFrequency::Yearly);
    step_up.validate("step_up_percent")?;
    require_years(input.years, "years")?;

    let installments = yearly_installments(input.monthly_amount, step_up.annual_rate(), input.years)?;
    let trajectory = sip_compounder(input.annual_rate_percent).run(
        input.lumpsum,
        input.years * 12,
        |month| PeriodFlow::contribution(installment_for(&installments, month)),
        |_| false,
    )?;

    let mut invested = input.lumpsum;
    let mut yearly_breakdown = Vec::with_capacity(input.years as usize);
    for s in &trajectory.snapshots {
        invested += s.contribution;
        if s.period % 12 == 0 {
            yearly_breakdown.push(SipYear {
                year: s.period / 12,
                invested,
                value: s.closing_balance,
                returns: s.closing_balance - invested,
            });
        }
    }

    if input.annual_rate_percent.is_zero() {
        warnings.push("Zero expected return: value equals amount invested".into());
    }

    let total_value = trajectory.final_balance;
    let output = SipOutput {
        total_investment: invested,
        estimated_returns: total_value - invested,
        total_value,
        yearly_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SIP projection: start-of-month installments, monthly compounding, annual step-up",
        &serde_json::json!({
            "monthly_amount": input.monthly_amount.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "years": input.years,
            "step_up_percent": input.step_up_percent.to_string(),
            "lumpsum": input.lumpsum.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
