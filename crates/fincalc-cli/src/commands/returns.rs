use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::returns::xirr::{self, SipFrequency, SipTransactionsInput, XirrInput};
use fincalc_core::types::CashFlow;

use crate::input;

/// Arguments for XIRR
#[derive(Args)]
pub struct XirrArgs {
    /// Path to JSON input file with a "transactions" array
    #[arg(long)]
    pub input: Option<String>,

    /// Dated flows as date:amount pairs, comma-separated
    /// (e.g. "2023-01-01:-1000,2024-01-01:1100")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub flows: Option<Vec<String>>,
}

fn parse_flow(raw: &str) -> Result<CashFlow, Box<dyn std::error::Error>> {
    let (date, amount) = raw
        .split_once(':')
        .ok_or_else(|| format!("Cash flow must be date:amount, got '{}'", raw))?;
    Ok(CashFlow {
        date: date.trim().parse::<NaiveDate>()?,
        amount: amount.trim().parse::<Decimal>()?,
        label: None,
    })
}

pub fn run_xirr(args: XirrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let xirr_input: XirrInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let specs = args.flows.ok_or("--flows is required (or provide --input)")?;
            XirrInput {
                transactions: specs
                    .iter()
                    .map(|s| parse_flow(s))
                    .collect::<Result<Vec<_>, _>>()?,
            }
        }
    };

    let result = xirr::solve_xirr(&xirr_input)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SipFrequencyArg {
    BiWeekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl From<SipFrequencyArg> for SipFrequency {
    fn from(arg: SipFrequencyArg) -> Self {
        match arg {
            SipFrequencyArg::BiWeekly => SipFrequency::BiWeekly,
            SipFrequencyArg::Monthly => SipFrequency::Monthly,
            SipFrequencyArg::Quarterly => SipFrequency::Quarterly,
            SipFrequencyArg::HalfYearly => SipFrequency::HalfYearly,
            SipFrequencyArg::Yearly => SipFrequency::Yearly,
        }
    }
}

/// Arguments for generating a regular SIP's transaction list
#[derive(Args)]
pub struct SipTransactionsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Installment amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    #[arg(long, value_enum, default_value = "monthly")]
    pub frequency: SipFrequencyArg,

    /// First installment date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Valuation date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Value of the holding on the end date
    #[arg(long)]
    pub current_value: Option<Decimal>,

    /// Solve the XIRR of the generated transactions instead of listing them
    #[arg(long)]
    pub xirr: bool,
}

pub fn run_sip_transactions(
    args: SipTransactionsArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipTransactionsInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            SipTransactionsInput {
                amount: args.amount.ok_or("--amount is required (or provide --input)")?,
                frequency: args.frequency.into(),
                start_date: args
                    .start_date
                    .ok_or("--start-date is required (or provide --input)")?,
                end_date: args
                    .end_date
                    .ok_or("--end-date is required (or provide --input)")?,
                current_value: args
                    .current_value
                    .ok_or("--current-value is required (or provide --input)")?,
            }
        }
    };

    let transactions = xirr::generate_sip_transactions(&sip_input)?;
    if args.xirr {
        let result = xirr::solve_xirr(&XirrInput { transactions })?;
        return Ok(serde_json::to_value(result)?);
    }
    Ok(serde_json::to_value(transactions)?)
}
