use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::sip::{installment_for, sip_compounder, yearly_installments};
use crate::compounding::PeriodFlow;
use crate::error::FinCalcError;
use crate::time_value::compound;
use crate::types::*;
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for solving the monthly SIP that funds a future goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalInput {
    /// Cost of the goal in today's money.
    pub target_amount: Money,
    pub years_to_goal: u32,
    pub expected_return_percent: Percent,
    #[serde(default)]
    pub inflation_percent: Percent,
    #[serde(default)]
    pub existing_corpus: Money,
    #[serde(default)]
    pub step_up_percent: Percent,
}

/// Year-end point of the funding trajectory. Year 0 is the starting position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalYear {
    pub year: u32,
    pub invested_amount: Money,
    pub existing_corpus_value: Money,
    pub sip_value: Money,
    pub total_value: Money,
    /// Inflation-adjusted target at this year.
    pub target_line: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalOutput {
    /// First-year monthly SIP; later years step up from this amount.
    pub monthly_sip: Money,
    pub future_cost: Money,
    pub corpus_growth: Money,
    /// Wealth the SIP has to build on top of the grown corpus.
    pub sip_accumulation: Money,
    pub total_wealth: Money,
    pub yearly_data: Vec<GoalYear>,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Solve for the monthly SIP that closes the gap between an
/// inflation-adjusted target and the growth of the existing corpus.
///
/// The SIP is found by scaling the future value of a unit step-up SIP, so
/// the answer is exact rather than iterated.
pub fn solve_goal_sip(input: &GoalInput) -> FinCalcResult<ComputationOutput<GoalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive(input.target_amount, "target_amount")?;
    require_years(input.years_to_goal, "years_to_goal")?;
    RateSchedule::monthly(input.expected_return_percent).validate("expected_return_percent")?;
    let inflation = RateSchedule::new(input.inflation_percent, CompoundingFrequency::Yearly);
    inflation.validate("inflation_percent")?;
    require_non_negative(input.existing_corpus, "existing_corpus")?;
    let step_up = RateSchedule::new(input.step_up_percent, CompoundingFrequency::Yearly);
    step_up.validate("step_up_percent")?;

    let months = input.years_to_goal * 12;
    let inflation = inflation.annual_rate();
    let step_up = step_up.annual_rate();
    let compounder = sip_compounder(input.expected_return_percent);
    let overflow = || FinCalcError::overflow("goal projection");

    // Step 1-3: inflate the goal, grow the corpus, measure the gap
    let future_cost = input
        .target_amount
        .checked_mul(compound(inflation, input.years_to_goal)?)
        .ok_or_else(overflow)?;
    let corpus_growth = input
        .existing_corpus
        .checked_mul(compound(compounder.rate(), months)?)
        .ok_or_else(overflow)?;
    let required_wealth = (future_cost - corpus_growth).max(Decimal::ZERO);

    // Step 4: invert a unit step-up SIP
    let monthly_sip = if required_wealth > Decimal::ZERO {
        let unit_table = yearly_installments(Decimal::ONE, step_up, input.years_to_goal)?;
        let unit = compounder.run(
            Decimal::ZERO,
            months,
            |m| PeriodFlow::contribution(installment_for(&unit_table, m)),
            |_| false,
        )?;
        debug!("unit step-up SIP future value {}", unit.final_balance);
        required_wealth / unit.final_balance
    } else {
        warnings.push("Existing corpus already covers the inflation-adjusted goal".into());
        Decimal::ZERO
    };

    // Trajectory, replaying the solver's monthly ordering
    let corpus = compounder.run(
        input.existing_corpus,
        months,
        |_| PeriodFlow::default(),
        |_| false,
    )?;
    let sip_table = yearly_installments(monthly_sip, step_up, input.years_to_goal)?;
    let sip = compounder.run(
        Decimal::ZERO,
        months,
        |m| PeriodFlow::contribution(installment_for(&sip_table, m)),
        |_| false,
    )?;

    let mut yearly_data = Vec::with_capacity(input.years_to_goal as usize + 1);
    yearly_data.push(GoalYear {
        year: 0,
        invested_amount: input.existing_corpus,
        existing_corpus_value: input.existing_corpus,
        sip_value: Decimal::ZERO,
        total_value: input.existing_corpus,
        target_line: input.target_amount,
    });

    let mut invested = input.existing_corpus;
    for (c, s) in corpus.snapshots.iter().zip(sip.snapshots.iter()) {
        invested += s.contribution;
        if c.period % 12 == 0 {
            let year = c.period / 12;
            yearly_data.push(GoalYear {
                year,
                invested_amount: invested,
                existing_corpus_value: c.closing_balance,
                sip_value: s.closing_balance,
                total_value: c.closing_balance + s.closing_balance,
                target_line: input.target_amount * compound(inflation, year)?,
            });
        }
    }

    let output = GoalOutput {
        monthly_sip,
        future_cost,
        corpus_growth,
        sip_accumulation: required_wealth,
        total_wealth: corpus_growth + required_wealth,
        yearly_data,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Goal-based SIP: inflation-adjusted target less corpus growth, divided by unit step-up SIP value",
        &serde_json::json!({
            "target_amount": input.target_amount.to_string(),
            "years_to_goal": input.years_to_goal,
            "expected_return_percent": input.expected_return_percent.to_string(),
            "inflation_percent": input.inflation_percent.to_string(),
            "existing_corpus": input.existing_corpus.to_string(),
            "step_up_percent": input.step_up_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
