use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::deposits::fixed::{self, FdInput};
use fincalc_core::deposits::ppf::{self, PpfInput};
use fincalc_core::deposits::recurring::{self, RdInput};
use fincalc_core::deposits::ssy::{self, SsyFrequency, SsyInput};
use fincalc_core::CompoundingFrequency;

use crate::input;

/// Arguments for a recurring deposit
#[derive(Args)]
pub struct RdArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly installment
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Date of the first installment (YYYY-MM-DD), used for the maturity date
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_rd(args: RdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rd_input: RdInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            RdInput {
                monthly_amount: args.amount.ok_or("--amount is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                years: args.years.ok_or("--years is required (or provide --input)")?,
                start_date: args.start_date,
            }
        }
    };

    let result = recurring::simulate_rd(&rd_input)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompoundingArg {
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl From<CompoundingArg> for CompoundingFrequency {
    fn from(arg: CompoundingArg) -> Self {
        match arg {
            CompoundingArg::Monthly => CompoundingFrequency::Monthly,
            CompoundingArg::Quarterly => CompoundingFrequency::Quarterly,
            CompoundingArg::HalfYearly => CompoundingFrequency::HalfYearly,
            CompoundingArg::Yearly => CompoundingFrequency::Yearly,
        }
    }
}

/// Arguments for a fixed deposit
#[derive(Args)]
pub struct FdArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount deposited
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// How often interest is credited
    #[arg(long, value_enum, default_value = "quarterly")]
    pub compounding: CompoundingArg,
}

pub fn run_fd(args: FdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fd_input: FdInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            FdInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                years: args.years.ok_or("--years is required (or provide --input)")?,
                compounding: args.compounding.into(),
            }
        }
    };

    let result = fixed::calculate_fd(&fd_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a Public Provident Fund account
#[derive(Args)]
pub struct PpfArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Deposit made at the start of each year
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Account duration in years (15 or more)
    #[arg(long, default_value_t = 15)]
    pub years: u32,
}

pub fn run_ppf(args: PpfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ppf_input: PpfInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => PpfInput {
            yearly_investment: args.amount.ok_or("--amount is required (or provide --input)")?,
            duration_years: args.years,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
        },
    };

    let result = ppf::calculate_ppf(&ppf_input)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SsyFrequencyArg {
    Monthly,
    Yearly,
}

impl From<SsyFrequencyArg> for SsyFrequency {
    fn from(arg: SsyFrequencyArg) -> Self {
        match arg {
            SsyFrequencyArg::Monthly => SsyFrequency::Monthly,
            SsyFrequencyArg::Yearly => SsyFrequency::Yearly,
        }
    }
}

/// Arguments for a Sukanya Samriddhi Yojana account
#[derive(Args)]
pub struct SsyArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Age of the girl when the account is opened
    #[arg(long)]
    pub age: Option<u32>,

    /// Calendar year the account is opened
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Amount per installment
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// How often installments are paid
    #[arg(long, value_enum, default_value = "yearly")]
    pub frequency: SsyFrequencyArg,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Age at which a partial education withdrawal is taken (18 or older)
    #[arg(long)]
    pub withdrawal_age: Option<u32>,

    /// Share of the balance withdrawn, in percent (capped at 50)
    #[arg(long, default_value = "0")]
    pub withdrawal_percent: Decimal,
}

pub fn run_ssy(args: SsyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ssy_input: SsyInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SsyInput {
            girl_age: args.age.ok_or("--age is required (or provide --input)")?,
            start_year: args
                .start_year
                .ok_or("--start-year is required (or provide --input)")?,
            investment_frequency: args.frequency.into(),
            investment_amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            withdrawal_age: args.withdrawal_age,
            withdrawal_percent: args.withdrawal_percent,
        },
    };

    let result = ssy::calculate_ssy(&ssy_input)?;
    Ok(serde_json::to_value(result)?)
}
