use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::investments::goal::{self, GoalInput};
use fincalc_core::investments::sip::{self, SipInput};
use fincalc_core::investments::withdrawal::{self, SwpInput};

use crate::input;

/// Arguments for the goal-based SIP solver
#[derive(Args)]
pub struct GoalArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cost of the goal in today's money
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Years until the goal
    #[arg(long)]
    pub years: Option<u32>,

    /// Expected annual return in percent
    #[arg(long)]
    pub expected_return: Option<Decimal>,

    /// Annual inflation in percent
    #[arg(long, default_value = "0")]
    pub inflation: Decimal,

    /// Savings already set aside for the goal
    #[arg(long, default_value = "0")]
    pub existing_corpus: Decimal,

    /// Yearly increase of the SIP in percent
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,
}

pub fn run_goal(args: GoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal_input: GoalInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            GoalInput {
                target_amount: args.target.ok_or("--target is required (or provide --input)")?,
                years_to_goal: args.years.ok_or("--years is required (or provide --input)")?,
                expected_return_percent: args
                    .expected_return
                    .ok_or("--expected-return is required (or provide --input)")?,
                inflation_percent: args.inflation,
                existing_corpus: args.existing_corpus,
                step_up_percent: args.step_up,
            }
        }
    };

    let result = goal::solve_goal_sip(&goal_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a SIP projection
#[derive(Args)]
pub struct SipArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly installment
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Expected annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Investment horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Yearly increase of the installment in percent
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,

    /// One-off amount invested at the start
    #[arg(long, default_value = "0")]
    pub lumpsum: Decimal,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            SipInput {
                monthly_amount: args.amount.ok_or("--amount is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                years: args.years.ok_or("--years is required (or provide --input)")?,
                step_up_percent: args.step_up,
                lumpsum: args.lumpsum,
            }
        }
    };

    let result = sip::project_sip(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a systematic withdrawal plan
#[derive(Args)]
pub struct SwpArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Starting corpus
    #[arg(long)]
    pub investment: Option<Decimal>,

    /// Monthly withdrawal
    #[arg(long)]
    pub withdrawal: Option<Decimal>,

    /// Expected annual return in percent
    #[arg(long)]
    pub expected_return: Option<Decimal>,

    /// Years to simulate
    #[arg(long)]
    pub years: Option<u32>,
}

pub fn run_swp(args: SwpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let swp_input: SwpInput = match input::load_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            SwpInput {
                total_investment: args
                    .investment
                    .ok_or("--investment is required (or provide --input)")?,
                withdrawal_amount: args
                    .withdrawal
                    .ok_or("--withdrawal is required (or provide --input)")?,
                expected_return_percent: args
                    .expected_return
                    .ok_or("--expected-return is required (or provide --input)")?,
                years: args.years.ok_or("--years is required (or provide --input)")?,
            }
        }
    };

    let result = withdrawal::simulate_swp(&swp_input)?;
    Ok(serde_json::to_value(result)?)
}
