use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::compounding::{FlowTiming, PeriodFlow, PeriodicCompounder};
use crate::time_value::level_payment;
use crate::types::*;
use crate::FinCalcResult;

/// Residual balance at or below which the loan counts as repaid.
const PAYOFF_EPSILON: Money = dec!(1);

/// Iteration bound, as a multiple of the nominal tenure.
const SAFETY_MULTIPLE: u32 = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How often the extra principal payment is made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentFrequency {
    /// Every month alongside the EMI.
    #[default]
    Monthly,
    /// Once every 12th month.
    Yearly,
}

/// A recurring part-prepayment of principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prepayment {
    pub amount: Money,
    #[serde(default)]
    pub frequency: PrepaymentFrequency,
}

impl Prepayment {
    fn amount_for_month(&self, month: u32) -> Money {
        match self.frequency {
            PrepaymentFrequency::Monthly => self.amount,
            PrepaymentFrequency::Yearly if month % 12 == 0 => self.amount,
            PrepaymentFrequency::Yearly => Decimal::ZERO,
        }
    }
}

/// Input parameters for an EMI loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub tenure_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepayment: Option<Prepayment>,
}

/// One month of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanMonth {
    pub month: u32,
    pub year: u32,
    pub opening_balance: Money,
    /// EMI actually paid this month (smaller than the nominal EMI in the final month).
    pub emi: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub prepayment: Money,
    pub closing_balance: Money,
}

/// Calendar-of-loan year aggregate (months 1-12 are year 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanYear {
    pub year: u32,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub prepayment: Money,
    pub closing_balance: Money,
}

/// Savings relative to running the loan without prepayment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSavings {
    pub interest_saved: Money,
    pub months_saved: u32,
    /// `months_saved` split into whole years and leftover months.
    pub time_saved_years: u32,
    pub time_saved_months: u32,
}

/// Output of `amortize_loan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOutput {
    pub monthly_emi: Money,
    pub total_interest: Money,
    pub total_amount: Money,
    pub actual_tenure_months: u32,
    pub actual_tenure_years: Decimal,
    /// The balance reached zero before the nominal tenure ended.
    pub paid_off_early: bool,
    pub savings: LoanSavings,
    pub yearly_breakdown: Vec<LoanYear>,
    pub monthly_breakdown: Vec<LoanMonth>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Standard annuity EMI for `months` payments at `monthly_rate`.
pub fn emi(principal: Money, monthly_rate: Rate, months: u32) -> FinCalcResult<Money> {
    level_payment(principal, monthly_rate, months)
}

fn validate(input: &LoanInput) -> FinCalcResult<()> {
    require_positive(input.principal, "principal")?;
    RateSchedule::monthly(input.annual_rate_percent).validate("annual_rate_percent")?;
    require_years(input.tenure_years, "tenure_years")?;
    if let Some(p) = &input.prepayment {
        require_non_negative(p.amount, "prepayment.amount")?;
    }
    Ok(())
}

/// Amortize an EMI loan month by month, applying any scheduled prepayments.
///
/// Interest accrues on the opening balance, the EMI settles interest first
/// and the rest reduces principal. Extra payments are capped so the balance
/// never goes below zero. The run stops once the balance is within one
/// currency unit of zero, or after twice the nominal tenure.
pub fn amortize_loan(input: &LoanInput) -> FinCalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let schedule = RateSchedule::monthly(input.annual_rate_percent);
    let monthly_rate = schedule.periodic_rate();
    let nominal_months = input.tenure_years * 12;
    let monthly_emi = emi(input.principal, monthly_rate, nominal_months)?;

    // Baseline: the full tenure at the nominal EMI.
    let baseline_interest = monthly_emi * Decimal::from(nominal_months) - input.principal;

    let prepayment = input.prepayment.clone().filter(|p| p.amount > Decimal::ZERO);
    let compounder = PeriodicCompounder::new(monthly_rate, FlowTiming::EndOfPeriod);
    let max_months = nominal_months * SAFETY_MULTIPLE;

    let trajectory = compounder.run(
        input.principal,
        max_months,
        |month| {
            let extra = prepayment
                .as_ref()
                .map(|p| p.amount_for_month(month))
                .unwrap_or(Decimal::ZERO);
            PeriodFlow::withdrawal(monthly_emi + extra)
        },
        |snapshot| snapshot.closing_balance <= PAYOFF_EPSILON,
    )?;

    let mut monthly_breakdown: Vec<LoanMonth> = Vec::with_capacity(trajectory.snapshots.len());
    let mut yearly_breakdown: Vec<LoanYear> = Vec::new();

    for s in &trajectory.snapshots {
        let emi_paid = s.withdrawal.min(monthly_emi);
        let extra_paid = s.withdrawal - emi_paid;
        // Measured off the balances so a closing month repays exactly its opening balance
        let principal_paid = s.opening_balance - s.closing_balance - extra_paid;
        let year = (s.period - 1) / 12 + 1;

        monthly_breakdown.push(LoanMonth {
            month: s.period,
            year,
            opening_balance: s.opening_balance,
            emi: emi_paid,
            principal_paid,
            interest_paid: s.interest,
            prepayment: extra_paid,
            closing_balance: s.closing_balance,
        });

        match yearly_breakdown.last_mut() {
            Some(y) if y.year == year => {
                y.principal_paid += principal_paid;
                y.interest_paid += s.interest;
                y.prepayment += extra_paid;
                y.closing_balance = s.closing_balance;
            }
            _ => yearly_breakdown.push(LoanYear {
                year,
                principal_paid,
                interest_paid: s.interest,
                prepayment: extra_paid,
                closing_balance: s.closing_balance,
            }),
        }
    }

    let actual_tenure_months = trajectory.snapshots.len() as u32;
    let total_interest = trajectory.total_interest()?;
    let total_amount = input.principal + total_interest;

    if trajectory.final_balance > PAYOFF_EPSILON {
        warn!(
            "loan not repaid after {} months, residual balance {}",
            actual_tenure_months, trajectory.final_balance
        );
        warnings.push(format!(
            "Loan not repaid within {max_months} months; residual balance {}",
            trajectory.final_balance
        ));
    }

    let interest_saved = (baseline_interest - total_interest).max(Decimal::ZERO);
    let months_saved = nominal_months.saturating_sub(actual_tenure_months);
    let paid_off_early = months_saved > 0;
    if paid_off_early {
        debug!("loan paid off in {actual_tenure_months} of {nominal_months} months");
    }

    let output = LoanOutput {
        monthly_emi,
        total_interest,
        total_amount,
        actual_tenure_months,
        actual_tenure_years: (Decimal::from(actual_tenure_months) / dec!(12)).round_dp(1),
        paid_off_early,
        savings: LoanSavings {
            interest_saved,
            months_saved,
            time_saved_years: months_saved / 12,
            time_saved_months: months_saved % 12,
        },
        yearly_breakdown,
        monthly_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "EMI amortization (reducing balance, monthly rest) with part-prepayment",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "tenure_years": input.tenure_years,
            "prepayment": input.prepayment,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinCalcError;

    fn default_input() -> LoanInput {
        LoanInput {
            principal: dec!(5_000_000),
            annual_rate_percent: dec!(8.5),
            tenure_years: 20,
            prepayment: None,
        }
    }

    #[test]
    fn test_emi_known_value() {
        // 50L @ 8.5% for 20 years: EMI ~43,391
        let result = amortize_loan(&default_input()).unwrap();
        let out = &result.result;
        assert!(
            (out.monthly_emi - dec!(43391.16)).abs() < dec!(1),
            "got {}",
            out.monthly_emi
        );
    }

    #[test]
    fn test_no_prepayment_runs_full_tenure() {
        let result = amortize_loan(&default_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.actual_tenure_months, 240);
        assert_eq!(out.monthly_breakdown.len(), 240);
        assert_eq!(out.yearly_breakdown.len(), 20);
        assert!(!out.paid_off_early);
        assert_eq!(out.savings.months_saved, 0);
    }

    #[test]
    fn test_principal_fully_repaid() {
        let result = amortize_loan(&default_input()).unwrap();
        let repaid: Money = result
            .result
            .monthly_breakdown
            .iter()
            .map(|m| m.principal_paid + m.prepayment)
            .sum();
        assert!((repaid - dec!(5_000_000)).abs() <= PAYOFF_EPSILON, "got {repaid}");
    }

    #[test]
    fn test_total_amount_is_principal_plus_interest() {
        let result = amortize_loan(&default_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.total_amount, dec!(5_000_000) + out.total_interest);
    }

    #[test]
    fn test_zero_rate_linear_emi() {
        let mut input = default_input();
        input.principal = dec!(120_000);
        input.annual_rate_percent = Decimal::ZERO;
        input.tenure_years = 1;
        let result = amortize_loan(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.monthly_emi, dec!(10_000));
        assert_eq!(out.total_interest, Decimal::ZERO);
        assert_eq!(out.actual_tenure_months, 12);
    }

    #[test]
    fn test_yearly_prepayment_shortens_loan() {
        let mut input = default_input();
        input.prepayment = Some(Prepayment {
            amount: dec!(100_000),
            frequency: PrepaymentFrequency::Yearly,
        });
        let result = amortize_loan(&input).unwrap();
        let out = &result.result;
        assert!(out.paid_off_early);
        assert!(out.actual_tenure_months < 240);
        assert!(out.savings.interest_saved > Decimal::ZERO);
        assert_eq!(
            out.savings.time_saved_years * 12 + out.savings.time_saved_months,
            out.savings.months_saved
        );
        // Prepayment lands only on every 12th month
        assert!(out
            .monthly_breakdown
            .iter()
            .filter(|m| m.month % 12 != 0)
            .all(|m| m.prepayment.is_zero()));
    }

    #[test]
    fn test_oversized_prepayment_capped_to_balance() {
        let mut input = default_input();
        input.principal = dec!(100_000);
        input.prepayment = Some(Prepayment {
            amount: dec!(1_000_000_000),
            frequency: PrepaymentFrequency::Monthly,
        });
        let result = amortize_loan(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.actual_tenure_months, 1);
        let m = &out.monthly_breakdown[0];
        assert_eq!(m.closing_balance, Decimal::ZERO);
        assert!((m.principal_paid + m.prepayment - dec!(100_000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_final_month_clamped() {
        let mut input = default_input();
        input.prepayment = Some(Prepayment {
            amount: dec!(7_777),
            frequency: PrepaymentFrequency::Monthly,
        });
        let result = amortize_loan(&input).unwrap();
        let last = result.result.monthly_breakdown.last().unwrap().clone();
        assert_eq!(last.closing_balance, Decimal::ZERO);
        assert!(
            (last.principal_paid + last.prepayment - last.opening_balance).abs() < dec!(0.0000001),
            "last month repaid {} of {}",
            last.principal_paid + last.prepayment,
            last.opening_balance
        );
        assert!(result
            .result
            .monthly_breakdown
            .iter()
            .all(|m| m.closing_balance >= Decimal::ZERO));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut input = default_input();
        input.principal = Decimal::ZERO;
        assert!(amortize_loan(&input).is_err());

        let mut input = default_input();
        input.annual_rate_percent = dec!(-1);
        assert!(amortize_loan(&input).is_err());

        let mut input = default_input();
        input.tenure_years = 0;
        assert!(amortize_loan(&input).is_err());

        let mut input = default_input();
        input.prepayment = Some(Prepayment {
            amount: dec!(-10),
            frequency: PrepaymentFrequency::Monthly,
        });
        match amortize_loan(&input).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "prepayment.amount"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_errors_not_panics() {
        let mut input = default_input();
        input.annual_rate_percent = dec!(300);
        input.tenure_years = 30;
        assert!(matches!(
            amortize_loan(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let mut input = default_input();
        input.tenure_years = 400_000_000;
        assert!(matches!(
            amortize_loan(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        // In range, but (1 + 100%/12)^1200 does not fit a Decimal
        let mut input = default_input();
        input.annual_rate_percent = dec!(100);
        input.tenure_years = 100;
        assert!(matches!(
            amortize_loan(&input),
            Err(FinCalcError::FinancialImpossibility(_))
        ));
    }
}
