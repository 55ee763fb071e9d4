use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::compounding::{FlowTiming, PeriodFlow, PeriodicCompounder};
use crate::error::FinCalcError;
use crate::types::*;
use crate::FinCalcResult;

/// Account term from opening to maturity.
pub const SSY_MATURITY_YEARS: u32 = 21;
/// Deposits are accepted for this many years from opening.
pub const SSY_DEPOSIT_YEARS: u32 = 15;
const SSY_ANNUAL_LIMIT: Money = dec!(150_000);
const SSY_MAX_OPENING_AGE: u32 = 10;
const SSY_WITHDRAWAL_MIN_AGE: u32 = 18;
const SSY_MAX_WITHDRAWAL_SHARE: Rate = dec!(0.5);
/// Monthly deposits earn interest for 6.5 months of the year on average.
const MONTHLY_DEPOSIT_INTEREST_MONTHS: Decimal = dec!(6.5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SsyFrequency {
    Monthly,
    #[default]
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsyInput {
    /// Age of the account holder at opening.
    pub girl_age: u32,
    /// Calendar year the account is opened.
    pub start_year: i32,
    #[serde(default)]
    pub investment_frequency: SsyFrequency,
    /// Per-installment amount at `investment_frequency`.
    pub investment_amount: Money,
    pub annual_rate_percent: Percent,
    /// Age at which the partial education withdrawal is taken.
    #[serde(default)]
    pub withdrawal_age: Option<u32>,
    /// Share of the opening balance withdrawn, capped at 50.
    #[serde(default)]
    pub withdrawal_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsyYear {
    pub year: i32,
    pub age: u32,
    pub opening_balance: Money,
    pub deposit: Money,
    pub interest: Money,
    pub withdrawal: Money,
    pub closing_balance: Money,
    /// Past the deposit window; the balance only earns interest.
    pub is_growth_phase: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsyOutput {
    pub maturity_corpus: Money,
    /// Partial withdrawal taken for education, zero if none.
    pub education_fund: Money,
    pub total_invested: Money,
    /// Maturity plus education fund less deposits.
    pub total_interest: Money,
    pub yearly_breakdown: Vec<SsyYear>,
}

/// Sukanya Samriddhi Yojana over its 21-year term.
///
/// Deposits run for the first 15 years. Yearly deposits land at the start of
/// the year and earn a full year's interest; monthly deposits earn interest
/// for 6.5 months on average. An optional partial withdrawal comes out of
/// the opening balance once the holder turns 18.
pub fn calculate_ssy(input: &SsyInput) -> FinCalcResult<ComputationOutput<SsyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive(input.investment_amount, "investment_amount")?;
    if input.girl_age > MAX_YEARS {
        return Err(FinCalcError::invalid("girl_age", "must be a realistic age"));
    }
    if !(1..=9999).contains(&input.start_year) {
        return Err(FinCalcError::invalid("start_year", "must be a calendar year"));
    }
    require_non_negative(input.withdrawal_percent, "withdrawal_percent")?;
    if input.withdrawal_percent > dec!(100) {
        return Err(FinCalcError::invalid(
            "withdrawal_percent",
            "cannot exceed 100",
        ));
    }
    let schedule = RateSchedule::new(input.annual_rate_percent, CompoundingFrequency::Yearly);
    schedule.validate("annual_rate_percent")?;

    if input.girl_age > SSY_MAX_OPENING_AGE {
        warnings.push(format!(
            "SSY accounts are opened before age {SSY_MAX_OPENING_AGE}; got {}",
            input.girl_age
        ));
    }

    let requested_deposit = match input.investment_frequency {
        SsyFrequency::Monthly => input
            .investment_amount
            .checked_mul(dec!(12))
            .ok_or_else(|| FinCalcError::overflow("annual deposit"))?,
        SsyFrequency::Yearly => input.investment_amount,
    };
    let annual_deposit = if requested_deposit > SSY_ANNUAL_LIMIT {
        warnings.push(format!(
            "Annual deposit {requested_deposit} capped at the SSY limit of {SSY_ANNUAL_LIMIT}"
        ));
        SSY_ANNUAL_LIMIT
    } else {
        requested_deposit
    };

    let withdrawal_share = withdrawal_share(input, &mut warnings);

    let rate = schedule.annual_rate();
    let compounder = PeriodicCompounder::new(schedule.periodic_rate(), FlowTiming::StartOfPeriod);
    let overflow = |year: u32| FinCalcError::overflow(&format!("SSY balance in year {year}"));

    let mut balance = Decimal::ZERO;
    let mut education_fund = Decimal::ZERO;
    let mut total_invested = Decimal::ZERO;
    let mut yearly_breakdown = Vec::with_capacity(SSY_MATURITY_YEARS as usize);

    for year in 1..=SSY_MATURITY_YEARS {
        let age = input.girl_age + year;
        let deposit = if year <= SSY_DEPOSIT_YEARS {
            annual_deposit
        } else {
            Decimal::ZERO
        };
        let withdrawal = match withdrawal_share {
            Some((at_age, share)) if at_age == age => {
                balance.checked_mul(share).ok_or_else(|| overflow(year))?
            }
            _ => Decimal::ZERO,
        };

        // Monthly deposits are spread through the year, so they are added
        // after the step with their own partial-year interest.
        let (flow, spread_deposit) = match input.investment_frequency {
            SsyFrequency::Yearly => (
                PeriodFlow {
                    contribution: deposit,
                    withdrawal,
                },
                Decimal::ZERO,
            ),
            SsyFrequency::Monthly => (PeriodFlow::withdrawal(withdrawal), deposit),
        };
        let step = compounder.step(year, balance, &flow)?;
        let snapshot = step.snapshot;

        let spread_interest = (spread_deposit / dec!(12))
            .checked_mul(rate)
            .and_then(|v| v.checked_mul(MONTHLY_DEPOSIT_INTEREST_MONTHS))
            .ok_or_else(|| overflow(year))?;
        let interest = snapshot
            .interest
            .checked_add(spread_interest)
            .ok_or_else(|| overflow(year))?;
        let closing = snapshot
            .closing_balance
            .checked_add(spread_deposit)
            .and_then(|v| v.checked_add(spread_interest))
            .ok_or_else(|| overflow(year))?;

        education_fund += snapshot.withdrawal;
        total_invested += deposit;
        yearly_breakdown.push(SsyYear {
            year: input.start_year + year as i32 - 1,
            age,
            opening_balance: balance,
            deposit,
            interest,
            withdrawal: snapshot.withdrawal,
            closing_balance: closing,
            is_growth_phase: year > SSY_DEPOSIT_YEARS,
        });
        balance = closing;
    }

    let total_interest = balance
        .checked_add(education_fund)
        .map(|v| v - total_invested)
        .ok_or_else(|| FinCalcError::overflow("SSY interest"))?;
    debug!("SSY matures at {balance} with education fund {education_fund}");

    let output = SsyOutput {
        maturity_corpus: balance,
        education_fund,
        total_invested,
        total_interest,
        yearly_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SSY: 15 deposit years, 21-year term, yearly interest, optional partial withdrawal from 18",
        &serde_json::json!({
            "girl_age": input.girl_age,
            "start_year": input.start_year,
            "investment_frequency": input.investment_frequency,
            "investment_amount": input.investment_amount.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "withdrawal_age": input.withdrawal_age,
            "withdrawal_percent": input.withdrawal_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// The age and opening-balance share of the education withdrawal, if one applies.
fn withdrawal_share(input: &SsyInput, warnings: &mut Vec<String>) -> Option<(u32, Rate)> {
    let age = input.withdrawal_age?;
    if input.withdrawal_percent.is_zero() {
        return None;
    }
    if age < SSY_WITHDRAWAL_MIN_AGE {
        warn!("SSY withdrawal at age {age} ignored");
        warnings.push(format!(
            "Partial withdrawal is allowed from age {SSY_WITHDRAWAL_MIN_AGE}; age {age} ignored"
        ));
        return None;
    }
    if age <= input.girl_age || age > input.girl_age + SSY_MATURITY_YEARS {
        warnings.push(format!(
            "Withdrawal age {age} falls outside the account term"
        ));
        return None;
    }
    let share = (input.withdrawal_percent / dec!(100)).min(SSY_MAX_WITHDRAWAL_SHARE);
    if share < input.withdrawal_percent / dec!(100) {
        warnings.push("Partial withdrawal capped at 50% of the balance".into());
    }
    Some((age, share))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_input() -> SsyInput {
        SsyInput {
            girl_age: 5,
            start_year: 2024,
            investment_frequency: SsyFrequency::Yearly,
            investment_amount: dec!(150_000),
            annual_rate_percent: dec!(8.2),
            withdrawal_age: None,
            withdrawal_percent: Decimal::ZERO,
        }
    }

    fn close_to(actual: Decimal, expected: Decimal) -> bool {
        (actual - expected).abs() < dec!(0.01)
    }

    #[test]
    fn test_yearly_deposits_known_value() {
        let result = calculate_ssy(&default_input()).unwrap();
        let out = &result.result;
        assert!(close_to(out.maturity_corpus, dec!(7_182_119.17)), "got {}", out.maturity_corpus);
        assert_eq!(out.education_fund, Decimal::ZERO);
        assert_eq!(out.total_invested, dec!(2_250_000));
        assert_eq!(out.total_interest, out.maturity_corpus - out.total_invested);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_breakdown_shape() {
        let result = calculate_ssy(&default_input()).unwrap();
        let rows = &result.result.yearly_breakdown;
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[0].year, 2024);
        assert_eq!(rows[0].age, 6);
        assert_eq!(rows[20].year, 2044);
        assert!(!rows[14].is_growth_phase);
        assert_eq!(rows[14].deposit, dec!(150_000));
        assert!(rows[15].is_growth_phase);
        assert_eq!(rows[15].deposit, Decimal::ZERO);
        assert_eq!(rows[0].interest, dec!(12_300));
        for pair in rows.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
    }

    #[test]
    fn test_monthly_deposits_earn_less() {
        let mut input = default_input();
        input.investment_frequency = SsyFrequency::Monthly;
        input.investment_amount = dec!(12_500);
        let result = calculate_ssy(&input).unwrap();
        let out = &result.result;
        assert!(close_to(out.maturity_corpus, dec!(6_932_647.84)), "got {}", out.maturity_corpus);
        assert_eq!(out.total_invested, dec!(2_250_000));
    }

    #[test]
    fn test_education_withdrawal_at_eighteen() {
        let mut input = default_input();
        input.withdrawal_age = Some(18);
        input.withdrawal_percent = dec!(50);
        let result = calculate_ssy(&input).unwrap();
        let out = &result.result;
        assert!(close_to(out.maturity_corpus, dec!(4_014_604.33)), "got {}", out.maturity_corpus);
        assert!(close_to(out.education_fund, dec!(1_558_379.80)), "got {}", out.education_fund);

        let row = out.yearly_breakdown.iter().find(|r| r.age == 18).unwrap();
        assert_eq!(row.withdrawal, row.opening_balance * dec!(0.5));
        assert_eq!(
            out.total_interest,
            out.maturity_corpus + out.education_fund - out.total_invested
        );
    }

    #[test]
    fn test_withdrawal_share_capped_at_half() {
        let mut input = default_input();
        input.withdrawal_age = Some(18);
        input.withdrawal_percent = dec!(80);
        let capped = calculate_ssy(&input).unwrap();
        input.withdrawal_percent = dec!(50);
        let half = calculate_ssy(&input).unwrap();
        assert_eq!(capped.result.education_fund, half.result.education_fund);
        assert_eq!(capped.warnings.len(), 1);
    }

    #[test]
    fn test_underage_withdrawal_ignored() {
        let mut input = default_input();
        input.withdrawal_age = Some(15);
        input.withdrawal_percent = dec!(50);
        let result = calculate_ssy(&input).unwrap();
        assert_eq!(result.result.education_fund, Decimal::ZERO);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_deposit_over_limit_capped() {
        let mut input = default_input();
        input.investment_frequency = SsyFrequency::Monthly;
        input.investment_amount = dec!(20_000);
        let result = calculate_ssy(&input).unwrap();
        assert_eq!(result.result.total_invested, dec!(2_250_000));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut input = default_input();
        input.investment_amount = Decimal::ZERO;
        assert!(matches!(
            calculate_ssy(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let mut input = default_input();
        input.withdrawal_percent = dec!(120);
        assert!(matches!(
            calculate_ssy(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_extreme_inputs_are_errors_not_panics() {
        let mut input = default_input();
        input.annual_rate_percent = dec!(1000);
        assert!(matches!(
            calculate_ssy(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let mut input = default_input();
        input.investment_amount = dec!(10_000_000_000_000_000);
        assert!(matches!(
            calculate_ssy(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let mut input = default_input();
        input.girl_age = u32::MAX;
        assert!(matches!(
            calculate_ssy(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let mut input = default_input();
        input.start_year = i32::MAX;
        assert!(matches!(
            calculate_ssy(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }
}
