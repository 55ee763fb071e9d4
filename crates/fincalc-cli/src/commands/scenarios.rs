use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::scenarios::sensitivity::{self, Calculator, SensitivityInput};
use fincalc_core::types::SensitivityVariable;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CalculatorArg {
    Loan,
    BalanceTransfer,
    Rd,
    Fd,
    Ppf,
    Ssy,
    Goal,
    Sip,
    Swp,
}

impl From<CalculatorArg> for Calculator {
    fn from(arg: CalculatorArg) -> Self {
        match arg {
            CalculatorArg::Loan => Calculator::Loan,
            CalculatorArg::BalanceTransfer => Calculator::BalanceTransfer,
            CalculatorArg::Rd => Calculator::Rd,
            CalculatorArg::Fd => Calculator::Fd,
            CalculatorArg::Ppf => Calculator::Ppf,
            CalculatorArg::Ssy => Calculator::Ssy,
            CalculatorArg::Goal => Calculator::Goal,
            CalculatorArg::Sip => Calculator::Sip,
            CalculatorArg::Swp => Calculator::Swp,
        }
    }
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Calculator to sweep
    #[arg(long, value_enum)]
    pub calculator: CalculatorArg,

    /// First sensitivity variable in format name:min:max:step
    /// (e.g. "annual_rate_percent:7:10:0.5")
    #[arg(long)]
    pub var1: String,

    /// Second sensitivity variable (optional, creates a 2D table)
    #[arg(long)]
    pub var2: Option<String>,

    /// Output field to record (e.g. "monthly_emi", "savings.interest_saved")
    #[arg(long)]
    pub metric: String,

    /// Path to JSON file with base case inputs
    #[arg(long)]
    pub base_inputs: String,
}

fn parse_sens_var(raw: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            raw
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input = SensitivityInput {
        calculator: args.calculator.into(),
        base_inputs: input::file::read_json_value(&args.base_inputs)?,
        variable_1: parse_sens_var(&args.var1)?,
        variable_2: args.var2.as_deref().map(parse_sens_var).transpose()?,
        output_metric: args.metric,
    };

    let result = sensitivity::run_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
