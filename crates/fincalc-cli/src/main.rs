mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::deposits::{FdArgs, PpfArgs, RdArgs, SsyArgs};
use commands::investments::{GoalArgs, SipArgs, SwpArgs};
use commands::loans::{BalanceTransferArgs, LoanArgs};
use commands::returns::{SipTransactionsArgs, XirrArgs};
use commands::scenarios::SensitivityArgs;

/// Personal finance calculators with decimal precision
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Personal finance calculators with decimal precision",
    long_about = "A CLI for loan amortization, recurring and fixed deposits, PPF and SSY, goal-based \
                  and step-up SIPs, systematic withdrawals and XIRR, computed with \
                  128-bit decimal arithmetic. Inputs come from --input, piped JSON or flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// EMI loan amortization with optional prepayment
    Loan(LoanArgs),
    /// Compare moving a loan to a lender with a lower rate
    BalanceTransfer(BalanceTransferArgs),
    /// Recurring deposit maturity (quarterly compounding)
    Rd(RdArgs),
    /// Fixed deposit maturity
    Fd(FdArgs),
    /// Public Provident Fund maturity
    Ppf(PpfArgs),
    /// Sukanya Samriddhi Yojana maturity with optional education withdrawal
    Ssy(SsyArgs),
    /// Monthly SIP required to reach a goal
    Goal(GoalArgs),
    /// Project a SIP forward
    Sip(SipArgs),
    /// Systematic withdrawal plan depletion check
    Swp(SwpArgs),
    /// Annualised return of dated cash flows
    Xirr(XirrArgs),
    /// Generate the transaction list of a regular SIP
    SipTransactions(SipTransactionsArgs),
    /// Sweep one or two inputs of a calculator
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::loans::run_loan(args),
        Commands::BalanceTransfer(args) => commands::loans::run_balance_transfer(args),
        Commands::Rd(args) => commands::deposits::run_rd(args),
        Commands::Fd(args) => commands::deposits::run_fd(args),
        Commands::Ppf(args) => commands::deposits::run_ppf(args),
        Commands::Ssy(args) => commands::deposits::run_ssy(args),
        Commands::Goal(args) => commands::investments::run_goal(args),
        Commands::Sip(args) => commands::investments::run_sip(args),
        Commands::Swp(args) => commands::investments::run_swp(args),
        Commands::Xirr(args) => commands::returns::run_xirr(args),
        Commands::SipTransactions(args) => commands::returns::run_sip_transactions(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
