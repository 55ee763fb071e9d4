use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::loans::amortization::{self, LoanInput, Prepayment, PrepaymentFrequency};
use fincalc_core::loans::balance_transfer::{self, BalanceTransferInput, ProcessingFeeType};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PrepaymentFrequencyArg {
    Monthly,
    Yearly,
}

impl From<PrepaymentFrequencyArg> for PrepaymentFrequency {
    fn from(arg: PrepaymentFrequencyArg) -> Self {
        match arg {
            PrepaymentFrequencyArg::Monthly => PrepaymentFrequency::Monthly,
            PrepaymentFrequencyArg::Yearly => PrepaymentFrequency::Yearly,
        }
    }
}

/// Arguments for EMI loan amortization
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 8.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Tenure in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Extra principal paid on top of the EMI
    #[arg(long)]
    pub prepayment: Option<Decimal>,

    /// How often the prepayment is made
    #[arg(long, value_enum, default_value = "yearly")]
    pub prepayment_frequency: PrepaymentFrequencyArg,

    /// Drop the month-by-month schedule from the output
    #[arg(long)]
    pub summary: bool,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            LoanInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                tenure_years: args.years.ok_or("--years is required (or provide --input)")?,
                prepayment: args.prepayment.map(|amount| Prepayment {
                    amount,
                    frequency: args.prepayment_frequency.into(),
                }),
            }
        }
    };

    let mut result = amortization::amortize_loan(&loan_input)?;
    if args.summary {
        result.result.monthly_breakdown.clear();
    }
    Ok(serde_json::to_value(result)?)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FeeTypeArg {
    Percentage,
    Flat,
}

/// Arguments for a loan balance transfer comparison
#[derive(Args)]
pub struct BalanceTransferArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding principal being transferred
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Current lender's annual rate in percent
    #[arg(long)]
    pub existing_rate: Option<Decimal>,

    /// New lender's annual rate in percent
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    /// Remaining tenure in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Processing fee (percent of principal or flat amount)
    #[arg(long, default_value = "0")]
    pub fee: Decimal,

    #[arg(long, value_enum, default_value = "percentage")]
    pub fee_type: FeeTypeArg,
}

pub fn run_balance_transfer(
    args: BalanceTransferArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let bt_input: BalanceTransferInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            BalanceTransferInput {
                outstanding_principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                existing_rate_percent: args
                    .existing_rate
                    .ok_or("--existing-rate is required (or provide --input)")?,
                new_rate_percent: args
                    .new_rate
                    .ok_or("--new-rate is required (or provide --input)")?,
                remaining_tenure_years: args.years.ok_or("--years is required (or provide --input)")?,
                processing_fee: args.fee,
                processing_fee_type: match args.fee_type {
                    FeeTypeArg::Percentage => ProcessingFeeType::Percentage,
                    FeeTypeArg::Flat => ProcessingFeeType::Flat,
                },
            }
        }
    };

    let result = balance_transfer::evaluate_balance_transfer(&bt_input)?;
    Ok(serde_json::to_value(result)?)
}
