use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::compounding::{FlowTiming, PeriodFlow, PeriodicCompounder};
use crate::types::*;
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpInput {
    pub total_investment: Money,
    pub withdrawal_amount: Money,
    pub expected_return_percent: Percent,
    pub years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpYear {
    pub year: u32,
    /// Balance at the end of the year (or at depletion).
    pub balance: Money,
    /// Cumulative amount withdrawn so far.
    pub withdrawn: Money,
    /// Interest earned during this year only.
    pub interest_earned: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpOutput {
    pub total_withdrawn: Money,
    pub final_value: Money,
    pub total_interest_earned: Money,
    /// Annual withdrawals as a percentage of the starting corpus.
    pub withdrawal_rate_percent: Percent,
    pub is_depleted: bool,
    pub depletion_year: Option<u32>,
    pub depletion_month: Option<u32>,
    pub yearly_data: Vec<SwpYear>,
}

/// Simulate a systematic withdrawal plan month by month.
///
/// Each month the withdrawal comes out first and the remainder earns that
/// month's return. A withdrawal that takes the balance to zero marks the plan
/// as depleted and ends the simulation.
pub fn simulate_swp(input: &SwpInput) -> FinCalcResult<ComputationOutput<SwpOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive(input.total_investment, "total_investment")?;
    require_positive(input.withdrawal_amount, "withdrawal_amount")?;
    let schedule = RateSchedule::monthly(input.expected_return_percent);
    schedule.validate("expected_return_percent")?;
    require_years(input.years, "years")?;

    let compounder = PeriodicCompounder::new(schedule.periodic_rate(), FlowTiming::StartOfPeriod);
    let trajectory = compounder.run(
        input.total_investment,
        input.years * 12,
        |_| PeriodFlow::withdrawal(input.withdrawal_amount),
        |_| false,
    )?;

    let mut yearly_data: Vec<SwpYear> = Vec::with_capacity(input.years as usize);
    let mut withdrawn = Decimal::ZERO;
    for s in &trajectory.snapshots {
        withdrawn += s.withdrawal;
        let year = (s.period - 1) / 12 + 1;
        match yearly_data.last_mut() {
            Some(y) if y.year == year => {
                y.balance = s.closing_balance;
                y.withdrawn = withdrawn;
                y.interest_earned += s.interest;
            }
            _ => yearly_data.push(SwpYear {
                year,
                balance: s.closing_balance,
                withdrawn,
                interest_earned: s.interest,
            }),
        }
    }

    let depletion_month = trajectory.exhausted_at;
    let depletion_year = depletion_month.map(|m| (m - 1) / 12 + 1);
    if let Some(m) = depletion_month {
        warn!("SWP corpus depleted in month {m}");
        warnings.push(format!(
            "Corpus depleted in year {} (month {m}); withdrawals stop early",
            (m - 1) / 12 + 1
        ));
    } else {
        debug!("SWP sustained for {} months", trajectory.snapshots.len());
    }

    let output = SwpOutput {
        total_withdrawn: trajectory.total_withdrawn()?,
        final_value: trajectory.final_balance,
        total_interest_earned: trajectory.total_interest()?,
        withdrawal_rate_percent: input.withdrawal_amount * Decimal::from(12u32)
            / input.total_investment
            * Decimal::ONE_HUNDRED,
        is_depleted: depletion_month.is_some(),
        depletion_year,
        depletion_month,
        yearly_data,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Systematic withdrawal plan: withdraw at start of month, then monthly return on remainder",
        &serde_json::json!({
            "total_investment": input.total_investment.to_string(),
            "withdrawal_amount": input.withdrawal_amount.to_string(),
            "expected_return_percent": input.expected_return_percent.to_string(),
            "years": input.years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> SwpInput {
        SwpInput {
            total_investment: dec!(1_000_000),
            withdrawal_amount: dec!(6_000),
            expected_return_percent: dec!(10),
            years: 5,
        }
    }

    #[test]
    fn test_capital_grows_when_interest_exceeds_withdrawal() {
        let result = simulate_swp(&default_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.total_withdrawn, dec!(360_000));
        assert!(out.final_value > dec!(1_000_000));
        assert!(!out.is_depleted);
        assert_eq!(out.depletion_year, None);
        assert_eq!(out.yearly_data.len(), 5);
    }

    #[test]
    fn test_depletion_detected() {
        let input = SwpInput {
            total_investment: dec!(100_000),
            withdrawal_amount: dec!(10_000),
            expected_return_percent: dec!(10),
            years: 5,
        };
        let result = simulate_swp(&input).unwrap();
        let out = &result.result;
        assert!(out.is_depleted);
        assert_eq!(out.final_value, Decimal::ZERO);
        assert!(out.depletion_year.unwrap() <= 2);
        assert_eq!(out.yearly_data.len() as u32, out.depletion_year.unwrap());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_final_withdrawal_clamped() {
        let input = SwpInput {
            total_investment: dec!(1_000),
            withdrawal_amount: dec!(300),
            expected_return_percent: Decimal::ZERO,
            years: 1,
        };
        let result = simulate_swp(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.total_withdrawn, dec!(1_000));
        assert_eq!(out.depletion_month, Some(4));
        assert_eq!(out.depletion_year, Some(1));
    }

    #[test]
    fn test_withdraw_before_interest() {
        let input = SwpInput {
            total_investment: dec!(12_000),
            withdrawal_amount: dec!(2_000),
            expected_return_percent: dec!(12),
            years: 1,
        };
        let result = simulate_swp(&input).unwrap();
        let out = &result.result;
        // Month 1 earns 1% on 10,000 (post-withdrawal), not on 12,000
        assert_eq!(out.total_interest_earned, dec!(311.17138581));
        assert_eq!(out.depletion_month, Some(7));
        assert_eq!(out.total_withdrawn, dec!(12_000) + out.total_interest_earned);
    }

    #[test]
    fn test_withdrawal_rate() {
        let result = simulate_swp(&default_input()).unwrap();
        assert_eq!(result.result.withdrawal_rate_percent, dec!(7.2));
    }

    #[test]
    fn test_zero_withdrawal_rejected() {
        let mut input = default_input();
        input.withdrawal_amount = Decimal::ZERO;
        assert!(simulate_swp(&input).is_err());
    }

    #[test]
    fn test_extreme_inputs_are_errors_not_panics() {
        let mut input = default_input();
        input.expected_return_percent = dec!(1000);
        input.years = 30;
        assert!(matches!(
            simulate_swp(&input),
            Err(crate::FinCalcError::InvalidInput { .. })
        ));

        // Interest far outruns the withdrawal until the balance leaves Decimal range
        let mut input = default_input();
        input.expected_return_percent = dec!(100);
        input.years = 100;
        assert!(matches!(
            simulate_swp(&input),
            Err(crate::FinCalcError::FinancialImpossibility(_))
        ));
    }
}
