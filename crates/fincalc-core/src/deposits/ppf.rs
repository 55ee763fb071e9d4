use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::compounding::{FlowTiming, PeriodFlow, PeriodicCompounder};
use crate::error::FinCalcError;
use crate::types::*;
use crate::FinCalcResult;

/// Lock-in period of a PPF account.
pub const PPF_LOCK_IN_YEARS: u32 = 15;
/// Extensions after the lock-in run in blocks of this many years.
pub const PPF_EXTENSION_BLOCK_YEARS: u32 = 5;
const PPF_MIN_DEPOSIT: Money = dec!(500);
const PPF_MAX_DEPOSIT: Money = dec!(150_000);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpfInput {
    pub yearly_investment: Money,
    /// At least the 15-year lock-in.
    pub duration_years: u32,
    pub annual_rate_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpfYear {
    pub year: u32,
    pub opening_balance: Money,
    pub deposit: Money,
    pub interest: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpfOutput {
    pub total_invested: Money,
    pub total_interest: Money,
    pub maturity_amount: Money,
    pub yearly_data: Vec<PpfYear>,
}

/// Public Provident Fund: one deposit at the start of each financial year,
/// interest credited yearly on the opening balance plus that deposit.
pub fn calculate_ppf(input: &PpfInput) -> FinCalcResult<ComputationOutput<PpfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive(input.yearly_investment, "yearly_investment")?;
    require_years(input.duration_years, "duration_years")?;
    if input.duration_years < PPF_LOCK_IN_YEARS {
        return Err(FinCalcError::invalid(
            "duration_years",
            "PPF runs for at least the 15-year lock-in",
        ));
    }
    let schedule = RateSchedule::new(input.annual_rate_percent, CompoundingFrequency::Yearly);
    schedule.validate("annual_rate_percent")?;

    if (input.duration_years - PPF_LOCK_IN_YEARS) % PPF_EXTENSION_BLOCK_YEARS != 0 {
        warnings.push(format!(
            "PPF extends in {PPF_EXTENSION_BLOCK_YEARS}-year blocks after the lock-in; \
             {} years is not a whole number of blocks",
            input.duration_years
        ));
    }
    if input.yearly_investment < PPF_MIN_DEPOSIT || input.yearly_investment > PPF_MAX_DEPOSIT {
        warnings.push(format!(
            "Yearly deposit is outside the PPF range of {PPF_MIN_DEPOSIT} to {PPF_MAX_DEPOSIT}"
        ));
    }

    let compounder = PeriodicCompounder::new(schedule.periodic_rate(), FlowTiming::StartOfPeriod);
    let trajectory = compounder.run(
        Decimal::ZERO,
        input.duration_years,
        |_| PeriodFlow::contribution(input.yearly_investment),
        |_| false,
    )?;

    let yearly_data = trajectory
        .snapshots
        .iter()
        .map(|s| PpfYear {
            year: s.period,
            opening_balance: s.opening_balance,
            deposit: s.contribution,
            interest: s.interest,
            closing_balance: s.closing_balance,
        })
        .collect();

    let maturity_amount = trajectory.final_balance;
    debug!("PPF over {} years matures at {maturity_amount}", input.duration_years);

    let output = PpfOutput {
        total_invested: trajectory.total_contributed()?,
        total_interest: trajectory.total_interest()?,
        maturity_amount,
        yearly_data,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PPF: deposit at start of year, interest on opening balance plus deposit, credited yearly",
        &serde_json::json!({
            "yearly_investment": input.yearly_investment.to_string(),
            "duration_years": input.duration_years,
            "annual_rate_percent": input.annual_rate_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_input() -> PpfInput {
        PpfInput {
            yearly_investment: dec!(150_000),
            duration_years: 15,
            annual_rate_percent: dec!(7.1),
        }
    }

    #[test]
    fn test_standard_account_known_value() {
        let result = calculate_ppf(&default_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.total_invested, dec!(2_250_000));
        assert!(
            (out.maturity_amount - dec!(4_068_209.22)).abs() < dec!(0.01),
            "got {}",
            out.maturity_amount
        );
        assert_eq!(out.yearly_data.len(), 15);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_first_year_earns_on_deposit() {
        let result = calculate_ppf(&default_input()).unwrap();
        let first = &result.result.yearly_data[0];
        assert_eq!(first.opening_balance, Decimal::ZERO);
        assert_eq!(first.interest, dec!(10_650));
        assert_eq!(first.closing_balance, dec!(160_650));
        assert_eq!(result.result.yearly_data[1].opening_balance, dec!(160_650));
    }

    #[test]
    fn test_interest_and_invested_add_up() {
        let mut input = default_input();
        input.duration_years = 20;
        input.yearly_investment = dec!(100_000);
        let result = calculate_ppf(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.total_invested, dec!(2_000_000));
        let gap = out.maturity_amount - (out.total_invested + out.total_interest);
        assert!(gap.abs() < dec!(0.000001));
        assert_eq!(out.yearly_data.len(), 20);
    }

    #[test]
    fn test_short_duration_rejected() {
        let mut input = default_input();
        input.duration_years = 10;
        assert!(matches!(
            calculate_ppf(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_limits_and_odd_extension_warn() {
        let mut input = default_input();
        input.yearly_investment = dec!(200_000);
        input.duration_years = 17;
        let result = calculate_ppf(&input).unwrap();
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_extreme_inputs_are_errors_not_panics() {
        let mut input = default_input();
        input.annual_rate_percent = dec!(1000);
        assert!(matches!(
            calculate_ppf(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        // 2^100 growth
        let mut input = default_input();
        input.annual_rate_percent = dec!(100);
        input.duration_years = 100;
        assert!(matches!(
            calculate_ppf(&input),
            Err(FinCalcError::FinancialImpossibility(_))
        ));
    }
}
