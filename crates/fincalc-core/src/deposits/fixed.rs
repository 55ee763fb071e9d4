use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::compounding::{FlowTiming, PeriodFlow, PeriodicCompounder};
use crate::types::*;
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub years: u32,
    #[serde(default = "default_fd_frequency")]
    pub compounding: CompoundingFrequency,
}

fn default_fd_frequency() -> CompoundingFrequency {
    CompoundingFrequency::Quarterly
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FdYear {
    pub year: u32,
    pub balance: Money,
    /// Interest accumulated since the deposit was opened.
    pub interest_earned: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FdOutput {
    pub maturity_amount: Money,
    pub total_interest: Money,
    pub total_investment: Money,
    /// Annualised yield implied by the compounding frequency.
    pub effective_annual_rate_percent: Percent,
    pub yearly_data: Vec<FdYear>,
}

/// Fixed deposit: `A = P(1 + r/n)^(n·t)` with interest credited `n` times a year.
pub fn calculate_fd(input: &FdInput) -> FinCalcResult<ComputationOutput<FdOutput>> {
    let start = Instant::now();

    require_positive(input.principal, "principal")?;
    let schedule = RateSchedule::new(input.annual_rate_percent, input.compounding);
    schedule.validate("annual_rate_percent")?;
    require_years(input.years, "years")?;

    let per_year = input.compounding.periods_per_year();
    let compounder = PeriodicCompounder::new(schedule.periodic_rate(), FlowTiming::EndOfPeriod);
    let trajectory = compounder.run(
        input.principal,
        input.years * per_year,
        |_| PeriodFlow::default(),
        |_| false,
    )?;

    let yearly_data: Vec<FdYear> = trajectory
        .snapshots
        .iter()
        .filter(|s| s.period % per_year == 0)
        .map(|s| FdYear {
            year: s.period / per_year,
            balance: s.closing_balance,
            interest_earned: s.closing_balance - input.principal,
        })
        .collect();

    let one_year = crate::time_value::compound(schedule.periodic_rate(), per_year)?;
    let maturity_amount = trajectory.final_balance;

    let output = FdOutput {
        maturity_amount,
        total_interest: maturity_amount - input.principal,
        total_investment: input.principal,
        effective_annual_rate_percent: (one_year - Decimal::ONE) * Decimal::ONE_HUNDRED,
        yearly_data,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed deposit: periodic compound interest",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "years": input.years,
            "compounding": input.compounding,
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> FdInput {
        FdInput {
            principal: dec!(100_000),
            annual_rate_percent: dec!(7),
            years: 5,
            compounding: CompoundingFrequency::Quarterly,
        }
    }

    #[test]
    fn test_quarterly_known_value() {
        // 1L @ 7% quarterly for 5 years = 100000 * 1.0175^20 ~ 141,478
        let result = calculate_fd(&default_input()).unwrap();
        let out = &result.result;
        assert!(
            out.maturity_amount > dec!(141470) && out.maturity_amount < dec!(141485),
            "got {}",
            out.maturity_amount
        );
        assert_eq!(out.total_interest, out.maturity_amount - dec!(100_000));
        assert_eq!(out.yearly_data.len(), 5);
    }

    #[test]
    fn test_monthly_compounding() {
        let input = FdInput {
            principal: dec!(10_000),
            annual_rate_percent: dec!(12),
            years: 1,
            compounding: CompoundingFrequency::Monthly,
        };
        let result = calculate_fd(&input).unwrap();
        assert_eq!(result.result.maturity_amount.round(), dec!(11268));
        assert!((result.result.effective_annual_rate_percent - dec!(12.6825)).abs() < dec!(0.001));
    }

    #[test]
    fn test_yearly_compounding_exact() {
        let input = FdInput {
            principal: dec!(10_000),
            annual_rate_percent: dec!(10),
            years: 2,
            compounding: CompoundingFrequency::Yearly,
        };
        let result = calculate_fd(&input).unwrap();
        assert_eq!(result.result.maturity_amount, dec!(12100));
        assert_eq!(result.result.yearly_data[0].balance, dec!(11000));
    }

    #[test]
    fn test_zero_rate() {
        let mut input = default_input();
        input.annual_rate_percent = Decimal::ZERO;
        let result = calculate_fd(&input).unwrap();
        assert_eq!(result.result.maturity_amount, result.result.total_investment);
    }

    #[test]
    fn test_default_compounding_is_quarterly() {
        let input: FdInput = serde_json::from_str(
            r#"{"principal": "1000", "annual_rate_percent": "8", "years": 1}"#,
        )
        .unwrap();
        assert_eq!(input.compounding, CompoundingFrequency::Quarterly);
    }

    #[test]
    fn test_extreme_inputs_are_errors_not_panics() {
        let mut input = default_input();
        input.annual_rate_percent = dec!(100);
        input.years = 100;
        assert!(matches!(
            calculate_fd(&input),
            Err(crate::FinCalcError::FinancialImpossibility(_))
        ));

        input.years = 101;
        assert!(matches!(
            calculate_fd(&input),
            Err(crate::FinCalcError::InvalidInput { .. })
        ));
    }
}
